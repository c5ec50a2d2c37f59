//! Keyword and pattern classifiers for inbound messages
//!
//! The classifiers are independent; `classify` applies the dispatch priority
//! Greeting > CommodityQuery > WeatherQuery > General.

use once_cell::sync::Lazy;
use regex::Regex;
use shared::{fold_accents, Intent, COMMODITIES};

/// Accent-folded keywords that signal a request for commodity data
const COMMODITY_KEYWORDS: &[&str] = &[
    "dados",
    "dado",
    "informacao",
    "informacoes",
    "preco",
    "precos",
    "producao",
    "producoes",
    "exportacao",
    "exportacoes",
    "importacao",
    "importacoes",
    "estoque",
    "estoques",
    "area plantada",
    "consumo",
    "consumos",
    "estatistica",
    "estatisticas",
    "numero",
    "numeros",
    "valor",
    "valores",
    "quanto",
    "quantos",
    "quantas",
    "qual",
    "quais",
];

/// Accent-folded keywords that signal a weather question
const WEATHER_KEYWORDS: &[&str] = &[
    "clima",
    "tempo",
    "temperatura",
    "previsao",
    "chuva",
    "sol",
    "nublado",
    "vento",
    "umidade",
];

const GREETINGS: &[&str] = &[
    "oi", "olá", "ola", "eae", "e aí", "eai", "opa", "hey", "hi", "hello", "bom dia", "boa tarde",
    "boa noite",
];

/// A greeting alone, optionally followed by punctuation
static GREETING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = GREETINGS.iter().map(|g| regex::escape(g)).collect();
    Regex::new(&format!(r"^(?:{})[!?.]*$", alternatives.join("|")))
        .expect("greeting pattern is valid")
});

/// True only when the whole message is a short salutation
pub fn is_greeting(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    GREETING_PATTERN.is_match(&lowered)
}

/// True when the folded text names a known commodity and also contains a
/// data keyword. A bare mention ("eu gosto de soja") is not a query.
pub fn is_commodity_intent(text: &str) -> bool {
    let folded = fold_accents(text);
    let names_commodity = COMMODITIES
        .iter()
        .any(|c| folded.contains(c.canonical_name));
    names_commodity && COMMODITY_KEYWORDS.iter().any(|k| folded.contains(k))
}

/// True when the folded text contains any weather keyword as a substring
pub fn is_weather_intent(text: &str) -> bool {
    let folded = fold_accents(text);
    WEATHER_KEYWORDS.iter().any(|k| folded.contains(k))
}

/// Pick the intent the dispatcher should try first
pub fn classify(text: &str) -> Intent {
    if is_greeting(text) {
        Intent::Greeting
    } else if is_commodity_intent(text) {
        Intent::CommodityQuery
    } else if is_weather_intent(text) {
        Intent::WeatherQuery
    } else {
        Intent::General
    }
}

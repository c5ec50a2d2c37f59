//! Typo and accent correction through the LLM collaborator
//!
//! Normalization is best-effort: without a collaborator, or when the
//! collaborator fails, the input comes back unchanged.

use shared::NormalizationKind;
use std::sync::Arc;

use crate::external::LlmCompletion;

const SYSTEM_PROMPT: &str = "Você é um assistente especializado em correção de texto em português brasileiro. Retorne APENAS o texto corrigido, sem explicações adicionais.";

const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.3;

#[derive(Clone, Default)]
pub struct TextNormalizer {
    llm: Option<Arc<dyn LlmCompletion>>,
}

impl TextNormalizer {
    pub fn new(llm: Option<Arc<dyn LlmCompletion>>) -> Self {
        Self { llm }
    }

    /// Identity normalizer
    pub fn disabled() -> Self {
        Self { llm: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Correct spelling and accents; never fails
    pub async fn normalize(&self, text: &str, kind: NormalizationKind) -> String {
        let Some(llm) = &self.llm else {
            return text.to_string();
        };
        if text.trim().is_empty() {
            return text.to_string();
        }

        match llm
            .complete(SYSTEM_PROMPT, &build_prompt(text, kind), MAX_TOKENS, TEMPERATURE)
            .await
        {
            Ok(completion) => {
                let corrected = strip_quotes(&completion);
                if corrected.is_empty() {
                    text.to_string()
                } else {
                    if corrected != text {
                        tracing::debug!("Normalized {:?} -> {:?}", text, corrected);
                    }
                    corrected
                }
            }
            Err(e) => {
                tracing::debug!("Normalization failed for {:?}: {}", text, e);
                text.to_string()
            }
        }
    }
}

fn build_prompt(text: &str, kind: NormalizationKind) -> String {
    match kind {
        NormalizationKind::City => format!(
            "Corrija e normalize o nome da cidade brasileira abaixo, adicionando acentos corretos e capitalização apropriada. Retorne APENAS o nome corrigido, sem explicações, sem aspas, sem pontos finais.\n\n\
             Exemplos:\n\
             - \"sao paulo\" → São Paulo\n\
             - \"chapadao do sul\" → Chapadão do Sul\n\
             - \"rio de janeiro\" → Rio de Janeiro\n\
             - \"brasilia\" → Brasília\n\
             - \"chapadao\" → Chapadão\n\n\
             Nome a corrigir: {}",
            text
        ),
        NormalizationKind::Commodity => format!(
            "Corrija e normalize o nome da commodity agrícola abaixo, adicionando acentos corretos. Retorne APENAS o nome corrigido em português, sem explicações, sem aspas, sem pontos finais.\n\n\
             Exemplos:\n\
             - \"sojx\" → soja\n\
             - \"milh\" → milho\n\
             - \"acucar\" → açúcar\n\
             - \"algodao\" → algodão\n\
             - \"cafe\" → café\n\n\
             Nome a corrigir: {}",
            text
        ),
        NormalizationKind::General => format!(
            "Corrija e normalize o texto abaixo, adicionando acentos corretos em português brasileiro. Retorne APENAS o texto corrigido, sem explicações, sem aspas, sem pontos finais.\n\n\
             Texto a corrigir: {}",
            text
        ),
    }
}

/// Remove one leading and one trailing quote, then trim
fn strip_quotes(text: &str) -> String {
    let trimmed = text.trim();
    let without_leading = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let without_trailing = without_leading
        .strip_suffix(['"', '\''])
        .unwrap_or(without_leading);
    without_trailing.trim().to_string()
}

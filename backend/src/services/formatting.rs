//! Deterministic reply templates
//!
//! Every function takes the "updated on" date explicitly so output is stable
//! under test.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use shared::{capitalize_first, CityReference, CommoditySummary, DailyForecastSample};

use super::commodity::SourceStatus;

pub const CITY_NOT_FOUND: &str =
    "❌ Cidade não encontrada. Verifique se o nome está correto e tente novamente.";
pub const WEATHER_AUTH_FAILED: &str =
    "❌ Erro de autenticação com a API OpenWeather. Verifique a chave da API.";
pub const WEATHER_FAILED: &str =
    "❌ Desculpe, ocorreu um erro ao buscar a previsão do tempo. Tente novamente mais tarde.";

const WEEKDAYS: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// pt-BR number: "." groups thousands, "," separates at most 3 decimals
pub fn format_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(f) => format!("{}{},{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Commodity balance sheet reply; absent fields are omitted
pub fn commodity_summary(summary: &CommoditySummary, today: NaiveDate) -> String {
    let name = capitalize_first(&summary.display_name);

    let mut reply = format!("📊 Dados da {}\n\n", name);
    reply.push_str(&format!("🌾 {}\n", name));
    reply.push_str(&format!("📅 Ano: {}\n", summary.market_year));

    for (field, value) in &summary.values {
        reply.push_str(&format!(
            "{} {}: {} {}\n",
            field.icon(),
            field.label(),
            format_number(*value),
            field.unit()
        ));
    }

    reply.push_str(&format!("\n⏰ Atualizado em: {}\n", format_date(today)));
    reply.push_str("📊 Fonte: USDA PSD Database");
    reply
}

/// Diagnostic for a commodity whose query plan came back empty
pub fn commodity_unavailable(name: &str, status: SourceStatus) -> String {
    let mut reply = format!(
        "❌ Não foi possível encontrar dados atualizados para {}.\n\n",
        name
    );

    match status {
        SourceStatus::EndpointNotFound => {
            reply.push_str("⚠️ A API USDA parece não estar disponível no formato esperado.\n");
            reply.push_str(
                "💡 A estrutura da API pode ter mudado ou não estar acessível publicamente.\n\n",
            );
            reply.push_str("📝 Sugestões:\n");
            reply.push_str("- Verifique a documentação oficial da API USDA\n");
            reply.push_str("- Confirme se a chave da API está correta\n");
            reply.push_str("- Verifique se o endpoint está correto\n");
        }
        SourceStatus::Unauthorized => {
            reply.push_str("⚠️ Problema de autenticação com a API USDA.\n");
            reply.push_str("💡 Verifique se a chave da API está correta e válida.\n");
        }
        SourceStatus::Reachable | SourceStatus::Failing => {
            reply.push_str("💡 Possíveis causas:\n");
            reply.push_str("- Dados ainda não disponíveis para o ano solicitado\n");
            reply.push_str("- Código da commodity pode estar incorreto\n");
            reply.push_str("- API pode estar temporariamente indisponível\n");
        }
    }

    reply.push_str("\nTente perguntar sobre outra commodity ou aguarde alguns instantes.");
    reply
}

/// Emoji for an OpenWeather icon code
pub fn weather_icon(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" | "10n" => "🌧️",
        "10d" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "🌤️",
    }
}

fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// Multi-day forecast reply. With an image the header becomes a caption for
/// the picture sent just before it.
pub fn forecast_summary(
    city: &CityReference,
    days: &[DailyForecastSample],
    has_image: bool,
    today: NaiveDate,
) -> String {
    let mut reply = String::new();

    if has_image {
        reply.push_str("🌤️Acima a previsão das proximas 24 horas\n");
        reply.push_str("Nos proximos 5 dias:\n\n");
    } else {
        reply.push_str(&format!("🌤️ Previsão do Tempo - {}", city.name));
        if let Some(state) = city.state.as_deref().filter(|s| !s.is_empty()) {
            reply.push_str(&format!(", {}", state));
        }
        reply.push_str("\n\n");
    }

    for (index, day) in days.iter().enumerate() {
        if index > 0 {
            reply.push('\n');
        }
        reply.push_str(&format!(
            "{} {}, {} de {}\n",
            weather_icon(&day.weather_icon_code),
            capitalize_first(weekday_name(day.date)),
            day.date.day(),
            month_name(day.date)
        ));
        reply.push_str(&format!("   {}\n", capitalize_first(&day.description)));
        reply.push_str(&format!(
            "   🌡️ {}°C (máx: {}°C | mín: {}°C)\n",
            day.temp_c.round() as i64,
            day.temp_max_c.round() as i64,
            day.temp_min_c.round() as i64
        ));
        if day.rain_mm > 0.0 {
            reply.push_str(&format!("   🌧️ Chuva: {:.1}mm\n", day.rain_mm));
        }
        reply.push_str(&format!("   💨 Vento: {} km/h\n", day.wind_kph.round() as i64));
        reply.push_str(&format!("   💧 Umidade: {}%\n", day.humidity_pct));
    }

    reply.push_str(&format!("\n⏰ Atualizado em: {}\n", format_date(today)));
    reply.push_str("📊 Fonte: OpenWeather Map");
    reply
}

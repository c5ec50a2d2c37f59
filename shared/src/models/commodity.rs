//! Commodity reference data and PSD record models

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::Region;

/// A commodity the assistant knows how to look up
///
/// `canonical_name` is the accent-folded dictionary key matched against user
/// text; codes are opaque PSD identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommodityReference {
    pub canonical_name: &'static str,
    pub display_name: &'static str,
    pub primary_code: &'static str,
    pub alternative_code: Option<&'static str>,
}

impl CommodityReference {
    /// Codes to try, primary first
    pub fn codes(&self) -> Vec<&'static str> {
        std::iter::once(self.primary_code)
            .chain(self.alternative_code)
            .collect()
    }
}

/// Soybeans: grain first, then meal
pub const SOJA: CommodityReference = CommodityReference {
    canonical_name: "soja",
    display_name: "soja",
    primary_code: "2222000",
    alternative_code: Some("0813100"),
};

/// Commodity dictionary. Order is significant: the extractor returns the
/// first entry whose name appears in the message.
pub const COMMODITIES: &[CommodityReference] = &[
    CommodityReference {
        canonical_name: "milho",
        display_name: "milho",
        primary_code: "0440000",
        alternative_code: None,
    },
    SOJA,
    CommodityReference {
        canonical_name: "trigo",
        display_name: "trigo",
        primary_code: "0410000",
        alternative_code: None,
    },
    CommodityReference {
        canonical_name: "cafe",
        display_name: "café",
        primary_code: "0411100",
        alternative_code: None,
    },
    CommodityReference {
        canonical_name: "algodao",
        display_name: "algodão",
        primary_code: "0422000",
        alternative_code: None,
    },
    CommodityReference {
        canonical_name: "acucar",
        display_name: "açúcar",
        primary_code: "0416000",
        alternative_code: None,
    },
    CommodityReference {
        canonical_name: "arroz",
        display_name: "arroz",
        primary_code: "0443000",
        alternative_code: None,
    },
];

/// Look up a commodity by its folded canonical name
pub fn find_commodity(canonical_name: &str) -> Option<&'static CommodityReference> {
    COMMODITIES
        .iter()
        .find(|c| c.canonical_name == canonical_name)
}

/// Fields of a PSD balance sheet the assistant reports on, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommodityField {
    Production,
    Exports,
    EndingStocks,
    AreaPlanted,
    DomesticConsumption,
    Imports,
    Crush,
    TotalSupply,
    TotalUse,
}

impl CommodityField {
    /// Map a PSD attribute id; unknown ids are not reported
    pub fn from_attribute_id(attribute_id: u32) -> Option<Self> {
        match attribute_id {
            4 => Some(CommodityField::Production),
            20 => Some(CommodityField::Exports),
            28 => Some(CommodityField::EndingStocks),
            57 => Some(CommodityField::AreaPlanted),
            86 => Some(CommodityField::DomesticConsumption),
            88 => Some(CommodityField::Imports),
            125 => Some(CommodityField::Crush),
            176 => Some(CommodityField::TotalSupply),
            178 => Some(CommodityField::TotalUse),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommodityField::Production => "Produção",
            CommodityField::Exports => "Exportação",
            CommodityField::EndingStocks => "Estoque Final",
            CommodityField::AreaPlanted => "Área Plantada",
            CommodityField::DomesticConsumption => "Consumo",
            CommodityField::Imports => "Importação",
            CommodityField::Crush => "Processamento (Crush)",
            CommodityField::TotalSupply => "Oferta Total",
            CommodityField::TotalUse => "Uso Total",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CommodityField::Production => "📈",
            CommodityField::Exports => "🌍",
            CommodityField::EndingStocks => "📦",
            CommodityField::AreaPlanted => "🌱",
            CommodityField::DomesticConsumption => "🔄",
            CommodityField::Imports => "📊",
            CommodityField::Crush => "⚙️",
            CommodityField::TotalSupply => "📊",
            CommodityField::TotalUse => "📊",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            CommodityField::AreaPlanted => "mil hectares",
            _ => "mil toneladas",
        }
    }

    /// Key used when a response carries fields by name instead of by id
    pub fn key(&self) -> &'static str {
        match self {
            CommodityField::Production => "production",
            CommodityField::Exports => "exports",
            CommodityField::EndingStocks => "endingStocks",
            CommodityField::AreaPlanted => "areaPlanted",
            CommodityField::DomesticConsumption => "domesticConsumption",
            CommodityField::Imports => "imports",
            CommodityField::Crush => "crush",
            CommodityField::TotalSupply => "totalSupply",
            CommodityField::TotalUse => "totalUse",
        }
    }

    pub const ALL: [CommodityField; 9] = [
        CommodityField::Production,
        CommodityField::Exports,
        CommodityField::EndingStocks,
        CommodityField::AreaPlanted,
        CommodityField::DomesticConsumption,
        CommodityField::Imports,
        CommodityField::Crush,
        CommodityField::TotalSupply,
        CommodityField::TotalUse,
    ];
}

/// Read a number that may arrive as a JSON number or a numeric string
fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(json_number))
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(json_number)
        .map(|year| year as i32))
}

/// Whether a PSD response body has anything to accept: a non-empty array or
/// a non-empty object
pub fn is_non_empty_response(body: &Value) -> bool {
    match body {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

/// Raw attribute row as returned by the PSD data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub attribute_id: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub market_year: Option<i32>,
}

/// One mapped balance-sheet value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityRecord {
    pub field: CommodityField,
    pub value: Option<Decimal>,
    pub market_year: i32,
}

impl CommodityRecord {
    /// Map a raw row through the attribute table. Rows with unknown ids are
    /// dropped; a missing market year falls back to the queried year.
    pub fn from_attribute(raw: &AttributeValue, queried_year: i32) -> Option<Self> {
        let field = CommodityField::from_attribute_id(raw.attribute_id)?;
        Some(Self {
            field,
            value: raw.value.and_then(Decimal::from_f64_retain),
            market_year: raw.market_year.unwrap_or(queried_year),
        })
    }
}

/// Data accepted for a commodity, ready to be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommoditySummary {
    pub display_name: String,
    pub market_year: i32,
    /// Present values only, one per field, in display order
    pub values: Vec<(CommodityField, Decimal)>,
}

impl CommoditySummary {
    /// Build a summary from raw rows. The market year is taken from the first
    /// row when present. A later row for the same field replaces an earlier one.
    pub fn from_attributes(display_name: &str, rows: &[AttributeValue], queried_year: i32) -> Self {
        let market_year = rows
            .first()
            .and_then(|r| r.market_year)
            .unwrap_or(queried_year);

        let mut values: Vec<(CommodityField, Decimal)> = Vec::new();
        for record in rows
            .iter()
            .filter_map(|r| CommodityRecord::from_attribute(r, queried_year))
        {
            let Some(value) = record.value else { continue };
            match values.iter_mut().find(|(f, _)| *f == record.field) {
                Some(slot) => slot.1 = value,
                None => values.push((record.field, value)),
            }
        }
        values.sort_by_key(|(field, _)| *field);

        Self {
            display_name: display_name.to_string(),
            market_year,
            values,
        }
    }

    /// Build a summary from a raw PSD response body.
    ///
    /// An array holds attribute rows; rows that cannot be read are skipped.
    /// An object is either a single attribute row (it has `attributeId`) or
    /// field data keyed by name, with the year under `marketYear` or `year`.
    pub fn from_response(display_name: &str, body: &Value, queried_year: i32) -> Self {
        match body {
            Value::Array(items) => {
                let rows: Vec<AttributeValue> = items
                    .iter()
                    .filter_map(|item| AttributeValue::deserialize(item).ok())
                    .collect();
                let mut summary = Self::from_attributes(display_name, &rows, queried_year);
                if let Some(year) = items
                    .first()
                    .and_then(|item| item.get("marketYear"))
                    .and_then(json_number)
                {
                    summary.market_year = year as i32;
                }
                summary
            }
            Value::Object(map) if map.contains_key("attributeId") => {
                let rows: Vec<AttributeValue> =
                    AttributeValue::deserialize(body).ok().into_iter().collect();
                Self::from_attributes(display_name, &rows, queried_year)
            }
            Value::Object(map) => {
                let market_year = ["marketYear", "year"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(json_number))
                    .map(|year| year as i32)
                    .unwrap_or(queried_year);
                let values = CommodityField::ALL
                    .iter()
                    .filter_map(|field| {
                        let value = map.get(field.key()).and_then(json_number)?;
                        Some((*field, Decimal::from_f64_retain(value)?))
                    })
                    .collect();
                Self {
                    display_name: display_name.to_string(),
                    market_year,
                    values,
                }
            }
            _ => Self::from_attributes(display_name, &[], queried_year),
        }
    }

    pub fn get(&self, field: CommodityField) -> Option<Decimal> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| *v)
    }
}

/// A single (code, region, year) request in a query plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAttempt {
    pub code: String,
    pub region: Region,
    pub year: i32,
}

/// Ordered candidate requests for one commodity
///
/// Brazil is tried for every code × {year, year-1, year-2}; only when all of
/// those come back empty is the primary code tried against World for the same
/// years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommodityQueryPlan {
    codes: Vec<String>,
    years: [i32; 3],
}

impl CommodityQueryPlan {
    pub fn new(reference: &CommodityReference, current_year: i32) -> Self {
        Self {
            codes: reference.codes().into_iter().map(String::from).collect(),
            years: [current_year, current_year - 1, current_year - 2],
        }
    }

    /// Brazil-phase attempts, code-major
    pub fn brazil_attempts(&self) -> Vec<QueryAttempt> {
        self.codes
            .iter()
            .flat_map(|code| {
                self.years.iter().map(move |year| QueryAttempt {
                    code: code.clone(),
                    region: Region::Brazil,
                    year: *year,
                })
            })
            .collect()
    }

    /// World-phase attempts for the primary code
    pub fn world_attempts(&self) -> Vec<QueryAttempt> {
        let code = self.codes.first().cloned().unwrap_or_default();
        self.years
            .iter()
            .map(|year| QueryAttempt {
                code: code.clone(),
                region: Region::World,
                year: *year,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn row(attribute_id: u32, value: Option<f64>, market_year: Option<i32>) -> AttributeValue {
        AttributeValue {
            attribute_id,
            value,
            market_year,
        }
    }

    #[test]
    fn test_canonical_names_unique() {
        let names: HashSet<_> = COMMODITIES.iter().map(|c| c.canonical_name).collect();
        assert_eq!(names.len(), COMMODITIES.len());
    }

    #[test]
    fn test_canonical_names_are_folded() {
        for c in COMMODITIES {
            assert_eq!(crate::text::fold_accents(c.canonical_name), c.canonical_name);
        }
    }

    #[test]
    fn test_soja_has_two_codes() {
        assert_eq!(SOJA.codes(), vec!["2222000", "0813100"]);
        assert_eq!(find_commodity("milho").map(|c| c.codes()), Some(vec!["0440000"]));
    }

    #[test]
    fn test_attribute_table() {
        assert_eq!(CommodityField::from_attribute_id(4), Some(CommodityField::Production));
        assert_eq!(CommodityField::from_attribute_id(57), Some(CommodityField::AreaPlanted));
        assert_eq!(CommodityField::from_attribute_id(178), Some(CommodityField::TotalUse));
        assert_eq!(CommodityField::from_attribute_id(999), None);
    }

    #[test]
    fn test_summary_drops_unknown_and_null() {
        let rows = vec![
            row(4, Some(127000.0), Some(2024)),
            row(999, Some(1.0), Some(2024)),
            row(20, None, Some(2024)),
        ];
        let summary = CommoditySummary::from_attributes("milho", &rows, 2025);

        assert_eq!(summary.market_year, 2024);
        assert_eq!(summary.values.len(), 1);
        assert_eq!(summary.get(CommodityField::Production), Some(Decimal::from(127000)));
        assert_eq!(summary.get(CommodityField::Exports), None);
    }

    #[test]
    fn test_summary_orders_fields_and_last_wins() {
        let rows = vec![
            row(178, Some(10.0), None),
            row(4, Some(1.0), None),
            row(4, Some(2.5), None),
        ];
        let summary = CommoditySummary::from_attributes("soja", &rows, 2023);

        assert_eq!(summary.market_year, 2023);
        assert_eq!(summary.values[0].0, CommodityField::Production);
        assert_eq!(summary.values[0].1, Decimal::from_str("2.5").unwrap());
        assert_eq!(summary.values[1].0, CommodityField::TotalUse);
    }

    #[test]
    fn test_attribute_value_deserializes_camel_case() {
        let json = r#"[{"commodityCode":"0440000","attributeId":4,"marketYear":2024,"value":122000.5},
                      {"attributeId":28}]"#;
        let rows: Vec<AttributeValue> = serde_json::from_str(json).unwrap();

        assert_eq!(rows[0].attribute_id, 4);
        assert_eq!(rows[0].market_year, Some(2024));
        assert_eq!(rows[1].value, None);
    }

    #[test]
    fn test_attribute_value_accepts_numeric_strings() {
        let rows: Vec<AttributeValue> = serde_json::from_value(serde_json::json!([
            {"attributeId": 4, "value": "169000", "marketYear": "2024"}
        ]))
        .unwrap();

        assert_eq!(rows[0].value, Some(169000.0));
        assert_eq!(rows[0].market_year, Some(2024));
    }

    #[test]
    fn test_non_empty_response() {
        assert!(is_non_empty_response(&serde_json::json!([{"unexpected": true}])));
        assert!(is_non_empty_response(&serde_json::json!({"production": 1.0})));
        assert!(!is_non_empty_response(&serde_json::json!([])));
        assert!(!is_non_empty_response(&serde_json::json!({})));
        assert!(!is_non_empty_response(&Value::Null));
    }

    #[test]
    fn test_summary_from_keyed_object() {
        let body = serde_json::json!({"production": 169000.0, "exports": "104000", "year": 2024});
        let summary = CommoditySummary::from_response("soja", &body, 2025);

        assert_eq!(summary.market_year, 2024);
        assert_eq!(summary.get(CommodityField::Production), Some(Decimal::from(169000)));
        assert_eq!(summary.get(CommodityField::Exports), Some(Decimal::from(104000)));
        assert_eq!(summary.values.len(), 2);
    }

    #[test]
    fn test_summary_from_single_row_object() {
        let body = serde_json::json!({"attributeId": 4, "value": 1.0});
        let summary = CommoditySummary::from_response("milho", &body, 2023);

        assert_eq!(summary.market_year, 2023);
        assert_eq!(summary.get(CommodityField::Production), Some(Decimal::from(1)));
    }

    #[test]
    fn test_summary_from_array_skips_unreadable_rows() {
        let body = serde_json::json!([
            {"attributeId": 4, "value": 130000.0, "marketYear": 2024},
            {"unexpected": true},
            {"attributeId": 20, "value": "45000", "marketYear": 2024}
        ]);
        let summary = CommoditySummary::from_response("milho", &body, 2025);

        assert_eq!(summary.market_year, 2024);
        assert_eq!(summary.get(CommodityField::Exports), Some(Decimal::from(45000)));
    }

    #[test]
    fn test_query_plan_order() {
        let plan = CommodityQueryPlan::new(&SOJA, 2025);
        let brazil: Vec<(String, i32)> = plan
            .brazil_attempts()
            .into_iter()
            .map(|a| (a.code, a.year))
            .collect();

        assert_eq!(
            brazil,
            vec![
                ("2222000".to_string(), 2025),
                ("2222000".to_string(), 2024),
                ("2222000".to_string(), 2023),
                ("0813100".to_string(), 2025),
                ("0813100".to_string(), 2024),
                ("0813100".to_string(), 2023),
            ]
        );

        let world = plan.world_attempts();
        assert_eq!(world.len(), 3);
        assert!(world.iter().all(|a| a.region == Region::World && a.code == "2222000"));
        assert_eq!(world.iter().map(|a| a.year).collect::<Vec<_>>(), vec![2025, 2024, 2023]);
    }

    #[test]
    fn test_query_plan_single_code() {
        let milho = find_commodity("milho").unwrap();
        let plan = CommodityQueryPlan::new(milho, 2025);
        assert_eq!(plan.brazil_attempts().len(), 3);
        assert!(plan
            .brazil_attempts()
            .iter()
            .all(|a| a.region == Region::Brazil && a.code == "0440000"));
    }
}

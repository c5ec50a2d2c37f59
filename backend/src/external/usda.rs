//! USDA PSD (Production, Supply and Distribution) API client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::Region;

use crate::config::{HttpConfig, UsdaConfig};
use crate::error::{AppError, AppResult};

/// Source of commodity balance-sheet data
#[async_trait]
pub trait CommodityDataSource: Send + Sync {
    /// List every commodity the source knows; used as an availability probe
    async fn list_commodities(&self) -> AppResult<Value>;

    /// Response body for one commodity, region and market year
    async fn commodity_data(&self, code: &str, region: &Region, year: i32) -> AppResult<Value>;
}

/// USDA PSD API client
#[derive(Clone)]
pub struct PsdClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PsdClient {
    /// Create a new PsdClient
    pub fn new(config: &UsdaConfig, http: &HttpConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(http.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("PSD HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// List PSD regions
    pub async fn regions(&self) -> AppResult<Value> {
        self.get_json("/api/psd/regions").await
    }

    /// List PSD countries
    pub async fn countries(&self) -> AppResult<Value> {
        self.get_json("/api/psd/countries").await
    }

    /// Release dates for one commodity's data
    pub async fn data_release_dates(&self, code: &str) -> AppResult<Value> {
        self.get_json(&format!("/api/psd/commodity/{}/dataReleaseDates", code))
            .await
    }

    /// Raw JSON for one commodity, region and market year
    pub async fn commodity_json(&self, code: &str, region: &Region, year: i32) -> AppResult<Value> {
        self.get_json(&data_path(code, region, year)).await
    }

    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, "USDA PSD request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::debug!("USDA PSD {} returned {}", path, status);
            return Err(AppError::from_status(status, format!("USDA PSD {}", path)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("Failed to parse PSD response: {}", e)))
    }
}

#[async_trait]
impl CommodityDataSource for PsdClient {
    async fn list_commodities(&self) -> AppResult<Value> {
        self.get_json("/api/psd/commodities").await
    }

    async fn commodity_data(&self, code: &str, region: &Region, year: i32) -> AppResult<Value> {
        self.commodity_json(code, region, year).await
    }
}

/// URL path for a commodity request
fn data_path(code: &str, region: &Region, year: i32) -> String {
    match region {
        Region::World => format!("/api/psd/commodity/{}/world/year/{}", code, year),
        Region::Brazil | Region::Country(_) => format!(
            "/api/psd/commodity/{}/country/{}/year/{}",
            code, region, year
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path_by_region() {
        assert_eq!(
            data_path("0440000", &Region::Brazil, 2025),
            "/api/psd/commodity/0440000/country/BR/year/2025"
        );
        assert_eq!(
            data_path("0440000", &Region::World, 2024),
            "/api/psd/commodity/0440000/world/year/2024"
        );
        assert_eq!(
            data_path("2222000", &Region::Country("AR".to_string()), 2023),
            "/api/psd/commodity/2222000/country/AR/year/2023"
        );
    }
}

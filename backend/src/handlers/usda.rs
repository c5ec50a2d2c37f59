//! HTTP handlers for USDA PSD passthrough endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use shared::Region;

use crate::error::AppResult;
use crate::external::CommodityDataSource;
use crate::AppState;

/// List PSD commodities
pub async fn list_psd_commodities(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.list_commodities().await?))
}

/// List PSD regions
pub async fn list_psd_regions(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.regions().await?))
}

/// List PSD countries
pub async fn list_psd_countries(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.countries().await?))
}

/// Commodity data for any country
pub async fn get_psd_country_data(
    State(state): State<AppState>,
    Path((code, country, year)): Path<(String, String, i32)>,
) -> AppResult<Json<Value>> {
    let region = match country.to_uppercase().as_str() {
        "BR" => Region::Brazil,
        other => Region::Country(other.to_string()),
    };
    Ok(Json(state.psd.commodity_json(&code, &region, year).await?))
}

/// Commodity data for Brazil
pub async fn get_psd_brazil_data(
    State(state): State<AppState>,
    Path((code, year)): Path<(String, i32)>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.commodity_json(&code, &Region::Brazil, year).await?))
}

/// World commodity data
pub async fn get_psd_world_data(
    State(state): State<AppState>,
    Path((code, year)): Path<(String, i32)>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.commodity_json(&code, &Region::World, year).await?))
}

/// Release dates for a commodity
pub async fn get_psd_release_dates(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.psd.data_release_dates(&code).await?))
}

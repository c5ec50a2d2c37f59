//! HTTP handlers for stored forecast map images

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::MapLayer;

use crate::error::{AppError, AppResult};
use crate::external::ImageStore;
use crate::AppState;

/// Public prefix the image root is served under
pub const IMAGES_URL_PREFIX: &str = "/static/clima";

#[derive(Debug, Serialize)]
pub struct CityImageResponse {
    pub exists: bool,
    pub path: String,
    pub url: String,
}

/// Look up the 24h image of one layer for a city
/// GET /clima/images/:city/:layer
pub async fn get_city_layer_image(
    State(state): State<AppState>,
    Path((city, layer)): Path<(String, String)>,
) -> AppResult<Json<CityImageResponse>> {
    let layer: MapLayer = layer
        .parse()
        .map_err(|e: shared::UnknownLayer| AppError::Validation(e.to_string()))?;

    let path = state
        .images
        .find_layer_image(&city, layer)
        .await
        .ok_or_else(|| AppError::NoDataFound(format!("{} ({})", city, layer.slug())))?;

    let relative = path
        .strip_prefix(state.images.root())
        .unwrap_or(&path)
        .to_string_lossy()
        .replace('\\', "/");

    Ok(Json(CityImageResponse {
        exists: true,
        path: path.to_string_lossy().into_owned(),
        url: format!("{}/{}", IMAGES_URL_PREFIX, relative),
    }))
}

//! Pre-rendered forecast map images on local disk
//!
//! Layout: `<root>/<layer folder>/<citykey>_windy_<layer>_24h.png`, where the
//! city key is the accent-folded name with everything but letters and digits
//! removed.

use async_trait::async_trait;
use shared::{image_key, MapLayer};
use std::path::{Path, PathBuf};

const IMAGE_SUFFIX: &str = "_24h.png";

/// Lookup of pre-rendered images by city
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// First image of any layer, probing layers in `MapLayer::SEARCH_ORDER`
    async fn find_image(&self, city: &str) -> Option<PathBuf>;

    /// Image for one specific layer
    async fn find_layer_image(&self, city: &str, layer: MapLayer) -> Option<PathBuf>;
}

/// Image store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan_folder(&self, layer: MapLayer, key: &str) -> Option<PathBuf> {
        let folder = self.root.join(layer.folder());
        let entries = std::fs::read_dir(&folder).ok()?;
        let prefix = format!("{}_", key);

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&prefix) && name.ends_with(IMAGE_SUFFIX))
            .collect();
        names.sort();

        names.into_iter().next().map(|name| folder.join(name))
    }
}

impl FsImageStore {
    /// Blocking scan behind `ImageStore::find_image`
    pub fn scan_image(&self, city: &str) -> Option<PathBuf> {
        let key = image_key(city);
        if key.is_empty() {
            return None;
        }

        let found = MapLayer::SEARCH_ORDER
            .iter()
            .find_map(|layer| self.scan_folder(*layer, &key));

        match &found {
            Some(path) => tracing::debug!("Forecast image for {}: {}", city, path.display()),
            None => tracing::debug!("No forecast image for {} (key {})", city, key),
        }
        found
    }

    /// Blocking scan behind `ImageStore::find_layer_image`
    pub fn scan_layer_image(&self, city: &str, layer: MapLayer) -> Option<PathBuf> {
        let key = image_key(city);
        if key.is_empty() {
            return None;
        }

        let exact = self
            .root
            .join(layer.folder())
            .join(format!("{}_windy_{}{}", key, layer.slug(), IMAGE_SUFFIX));
        if exact.is_file() {
            return Some(exact);
        }
        self.scan_folder(layer, &key)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn find_image(&self, city: &str) -> Option<PathBuf> {
        let store = self.clone();
        let city = city.to_string();
        run_blocking(move || store.scan_image(&city)).await
    }

    async fn find_layer_image(&self, city: &str, layer: MapLayer) -> Option<PathBuf> {
        let store = self.clone();
        let city = city.to_string();
        run_blocking(move || store.scan_layer_image(&city, layer)).await
    }
}

/// Directory scans run on the blocking pool
async fn run_blocking<F>(scan: F) -> Option<PathBuf>
where
    F: FnOnce() -> Option<PathBuf> + Send + 'static,
{
    match tokio::task::spawn_blocking(scan).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!("Image lookup task failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("agrobot-images-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        root
    }

    fn touch(root: &Path, layer: MapLayer, file: &str) -> PathBuf {
        let dir = root.join(layer.folder());
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        fs::write(&path, b"png").unwrap();
        path
    }

    #[test]
    fn test_find_image_follows_search_order() {
        let root = temp_root("order");
        touch(&root, MapLayer::Wind, "saopaulo_windy_wind_24h.png");
        let temp = touch(&root, MapLayer::Temp, "saopaulo_windy_temp_24h.png");

        let store = FsImageStore::new(&root);
        assert_eq!(store.scan_image("São Paulo"), Some(temp));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_find_image_requires_full_key() {
        let root = temp_root("prefix");
        touch(&root, MapLayer::Rain, "saopaulo_windy_rain_24h.png");
        touch(&root, MapLayer::Rain, "sao_notes.txt");

        let store = FsImageStore::new(&root);
        assert!(store.scan_image("São").is_none());
        assert!(store.scan_image("").is_none());
        assert!(store.scan_image("Curitiba").is_none());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_find_layer_image() {
        let root = temp_root("layer");
        let rain = touch(&root, MapLayer::Rain, "chapadaodosul_windy_rain_24h.png");

        let store = FsImageStore::new(&root);
        assert_eq!(store.scan_layer_image("Chapadão do Sul", MapLayer::Rain), Some(rain));
        assert!(store.scan_layer_image("Chapadão do Sul", MapLayer::Radar).is_none());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_root_finds_nothing() {
        let store = FsImageStore::new("/nonexistent/agrobot/images");
        assert!(store.scan_image("Brasília").is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_lookup_runs_off_the_runtime_thread() {
        let root = temp_root("blocking");
        let rain = touch(&root, MapLayer::Rain, "brasilia_windy_rain_24h.png");

        let store = FsImageStore::new(&root);
        assert_eq!(ImageStore::find_image(&store, "Brasília").await, Some(rain.clone()));
        assert_eq!(
            ImageStore::find_layer_image(&store, "Brasília", MapLayer::Rain).await,
            Some(rain)
        );
        assert!(ImageStore::find_image(&store, "Goiânia").await.is_none());

        fs::remove_dir_all(&root).unwrap();
    }
}

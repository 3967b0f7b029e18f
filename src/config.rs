//! JSON configuration. Every field has a default, so an empty object (or no
//! file at all) reproduces the stock playlist and asset paths.

use crate::carousel::{AutoAdvance, MediaItem};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Relative asset paths resolve against this directory.
    pub asset_root: PathBuf,
    pub viewer: ViewerConfig,
    pub carousel: CarouselConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            viewer: ViewerConfig::default(),
            carousel: CarouselConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn resolve(&self, asset: &str) -> PathBuf {
        resolve_asset(&self.asset_root, asset)
    }
}

pub fn resolve_asset(root: &Path, asset: &str) -> PathBuf {
    let path = Path::new(asset);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::titled("mediaview")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub image: String,
    pub video: String,
    pub model: String,
    /// Attach the model as soon as it loads if the 3d mode is already selected.
    pub attach_model_on_load: bool,
    pub window: WindowConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            image: "./image.jpg".to_string(),
            video: "./video.mp4".to_string(),
            model: "./model.glb".to_string(),
            attach_model_on_load: false,
            window: WindowConfig::titled("mediaview viewer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub items: Vec<MediaItem>,
    pub interval_ms: u64,
    pub autoplay_video: bool,
    pub window: WindowConfig,
}

impl CarouselConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            items: vec![
                MediaItem::image("assets/images/img1.jpg"),
                MediaItem::image("assets/images/img2.jpg"),
                MediaItem::video("assets/videos/video1.mp4"),
                MediaItem::image("assets/images/img3.jpg"),
            ],
            interval_ms: AutoAdvance::DEFAULT_PERIOD.as_millis() as u64,
            autoplay_video: true,
            window: WindowConfig::titled("mediaview carousel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::MediaKind;

    #[test]
    fn defaults_match_stock_assets() {
        let config = AppConfig::default();
        assert_eq!(config.viewer.model, "./model.glb");
        assert_eq!(config.carousel.items.len(), 4);
        assert_eq!(config.carousel.items[2].kind, MediaKind::Video);
        assert_eq!(config.carousel.interval(), Duration::from_secs(5));
        assert!(!config.viewer.attach_model_on_load);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "viewer": { "image": "poster.png" },
            "carousel": { "interval_ms": 2500 }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.viewer.image, "poster.png");
        assert_eq!(config.viewer.video, "./video.mp4");
        assert_eq!(config.carousel.interval_ms, 2500);
        assert_eq!(config.carousel.items, CarouselConfig::default().items);
        assert_eq!(config.asset_root, PathBuf::from("."));
    }

    #[test]
    fn load_reads_playlist_from_file() {
        let path = std::env::temp_dir().join(format!("mediaview-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "asset_root": "/srv/media", "carousel": { "items": [ { "type": "image", "src": "a.png" } ] } }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.carousel.items, vec![MediaItem::image("a.png")]);
        assert_eq!(config.resolve("a.png"), PathBuf::from("/srv/media/a.png"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!("mediaview-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
        let _ = std::fs::remove_file(path);

        assert!(matches!(
            AppConfig::load(Path::new("/no/such/mediaview.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn absolute_assets_ignore_root() {
        let root = Path::new("assets");
        assert_eq!(resolve_asset(root, "img.jpg"), PathBuf::from("assets/img.jpg"));
        let absolute = std::env::temp_dir().join("img.jpg");
        assert_eq!(
            resolve_asset(root, absolute.to_str().unwrap()),
            absolute
        );
    }
}

use crate::projection::Crs;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Point events, `.csv` or `.json`.
    pub events: PathBuf,
    pub longitude_field: String,
    pub latitude_field: String,
    pub entity_field: String,
    /// Regions to count, `.geojson`/`.json` or `.shp`.
    pub regions: Option<PathBuf>,
    pub regions_crs: Crs,
    pub region_name_field: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            events: PathBuf::from("events.csv"),
            longitude_field: "longitude".to_string(),
            latitude_field: "latitude".to_string(),
            entity_field: "hash_id".to_string(),
            regions: None,
            regions_crs: Crs::Geographic,
            region_name_field: "name".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom_level: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lat: 48.262725,
            center_lon: 11.66725,
            zoom_level: 18,
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Blur size in pixels.
    pub blur: u32,
    /// Point radius in pixels.
    pub radius: u32,
    pub opacity: f32,
    /// Colour stops from cold to hot, `#rgb` or `#rrggbb`.
    pub gradient: Vec<String>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            blur: 15,
            radius: 5,
            opacity: 0.9,
            gradient: ["#00f", "#0ff", "#0f0", "#ff0", "#f00"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub heatmap_png: PathBuf,
    pub shapes_geojson: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            heatmap_png: PathBuf::from("output/heatmap.png"),
            shapes_geojson: PathBuf::from("output/shapes.geojson"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_panel_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            events = "data/events.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.events, PathBuf::from("data/events.json"));
        assert_eq!(config.input.entity_field, "hash_id");
        assert_eq!(config.view, ViewConfig::default());
        assert_eq!(config.heatmap.blur, 15);
        assert_eq!(config.heatmap.radius, 5);
    }

    #[test]
    fn parses_region_crs() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            events = "e.csv"
            regions = "zones.geojson"
            regions_crs = "EPSG:3857"

            [heatmap]
            opacity = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.input.regions_crs, Crs::WebMercator);
        assert_eq!(config.heatmap.opacity, 0.5);
    }

    #[test]
    fn rejects_unknown_crs() {
        let result = AppConfig::from_toml(
            r#"
            [input]
            regions_crs = "EPSG:27700"
            "#,
        );
        assert!(result.is_err());
    }
}

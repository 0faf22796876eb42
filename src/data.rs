use crate::config::InputConfig;
use crate::export::{regions_from_geojson, NamedRegion};
use crate::types::{PointEvent, Region};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use shapefile::Reader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input file has no extension: {:?}", path))
}

/// Loads point events in file order.
pub fn load_events(config: &InputConfig) -> Result<Vec<PointEvent>> {
    let path = &config.events;
    let file = File::open(path).with_context(|| format!("Failed to open events file: {:?}", path))?;

    let events = match extension_of(path)?.as_str() {
        "csv" => read_events_csv(file, config)?,
        "json" => read_events_json(BufReader::new(file), config)?,
        other => return Err(anyhow!("Unsupported events format: {}", other)),
    };

    info!(events = events.len(), path = ?path, "loaded point events");
    Ok(events)
}

pub fn read_events_csv<R: Read>(reader: R, config: &InputConfig) -> Result<Vec<PointEvent>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV", name))
    };
    let lon_idx = column(&config.longitude_field)?;
    let lat_idx = column(&config.latitude_field)?;
    let entity_idx = column(&config.entity_field)?;

    let mut events = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let number = |idx: usize, field: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse()
                .with_context(|| format!("Row {}: invalid {} '{}'", row + 1, field, raw))
        };

        events.push(PointEvent {
            longitude: number(lon_idx, &config.longitude_field)?,
            latitude: number(lat_idx, &config.latitude_field)?,
            entity_id: record.get(entity_idx).unwrap_or("").to_string(),
        });
    }

    Ok(events)
}

/// Reads a JSON array of row objects. Coordinates may be numbers or numeric
/// strings; the entity id may be a string or a number.
pub fn read_events_json<R: Read>(reader: R, config: &InputConfig) -> Result<Vec<PointEvent>> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_reader(reader).context("Failed to parse events JSON")?;

    rows.iter()
        .enumerate()
        .map(|(row, fields)| {
            let number = |field: &str| -> Result<f64> {
                let value = match fields.get(field) {
                    Some(serde_json::Value::Number(n)) => n.as_f64(),
                    Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
                    _ => None,
                };
                value.ok_or_else(|| anyhow!("Row {}: missing or invalid '{}'", row + 1, field))
            };
            let entity_id = match fields.get(&config.entity_field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };

            Ok(PointEvent {
                longitude: number(&config.longitude_field)?,
                latitude: number(&config.latitude_field)?,
                entity_id,
            })
        })
        .collect()
}

/// Loads the configured regions, still in `config.regions_crs`.
pub fn load_regions(config: &InputConfig) -> Result<Vec<NamedRegion>> {
    let path = config
        .regions
        .as_ref()
        .ok_or_else(|| anyhow!("No regions file configured"))?;

    let regions = match extension_of(path)?.as_str() {
        "shp" => load_shapefile_regions(path, &config.region_name_field)?,
        "json" | "geojson" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
            let geojson =
                GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;
            regions_from_geojson(geojson, &config.region_name_field)?
        }
        other => return Err(anyhow!("Unsupported geometry format: {}", other)),
    };

    info!(regions = regions.len(), path = ?path, crs = %config.regions_crs, "loaded regions");
    Ok(regions)
}

fn load_shapefile_regions(path: &Path, name_field: &str) -> Result<Vec<NamedRegion>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut regions = Vec::new();

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result?;

        let name = match record.get(name_field) {
            Some(shapefile::dbase::FieldValue::Character(Some(s))) => s.trim().to_string(),
            Some(shapefile::dbase::FieldValue::Numeric(Some(n))) => n.to_string(),
            _ => format!("region-{}", index + 1),
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => {
                warn!(index, "skipping non-polygon shape");
                continue;
            }
        };

        let multi = geometry.0.len() > 1;
        for (part, polygon) in geometry.iter().enumerate() {
            let region = Region::from_polygon(polygon)
                .with_context(|| format!("Invalid polygon in shape {}", name))?;
            let name = if multi {
                format!("{}#{}", name, part + 1)
            } else {
                name.clone()
            };
            regions.push(NamedRegion { name, region });
        }
    }

    Ok(regions)
}

//! GeoJSON interchange for drawn shapes and counted regions.

use crate::projection::{reproject_region, Crs};
use crate::shapes::ShapeLayer;
use crate::types::{CountResult, Region};
use anyhow::{anyhow, Context, Result};
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject, Value};
use std::fs;
use std::path::Path;

/// A region read from an interchange file, with a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRegion {
    pub name: String,
    pub region: Region,
}

/// Polygon feature with `id` and, when counted, `name` set to the label.
/// `region` must already be geographic.
pub fn labeled_feature(id: &str, region: &Region, label: Option<CountResult>) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), id.into());
    if let Some(label) = label {
        properties.insert("name".to_string(), label.label().into());
    }

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(Value::from(region.polygon()))),
        id: Some(Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Exports every drawn shape in EPSG:4326.
pub fn shapes_to_geojson(layer: &ShapeLayer) -> Result<FeatureCollection> {
    let mut features = Vec::with_capacity(layer.len());
    for (id, region, label) in layer.shapes() {
        let geographic = reproject_region(region, layer.display_crs(), Crs::Geographic)
            .with_context(|| format!("Failed to reproject {}", id))?;
        features.push(labeled_feature(&id.to_string(), &geographic, label));
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Reads Polygon and MultiPolygon features. Each polygon of a MultiPolygon
/// becomes its own region; holes are dropped.
pub fn regions_from_geojson(geojson: GeoJson, name_property: &str) -> Result<Vec<NamedRegion>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(_) => {
            return Err(anyhow!("GeoJSON must be a Feature or FeatureCollection"))
        }
    };

    let mut regions = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = match feature
            .properties
            .as_ref()
            .and_then(|props| props.get(name_property))
        {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => format!("region-{}", index + 1),
        };

        let Some(geometry) = feature.geometry else {
            continue;
        };
        let polygons = match geometry.value {
            Value::Polygon(_) | Value::MultiPolygon(_) => {
                let geo_geom: geo::Geometry<f64> = geometry
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of {}: {:?}", name, e))?;
                match geo_geom {
                    geo::Geometry::Polygon(p) => vec![p],
                    geo::Geometry::MultiPolygon(mp) => mp.0,
                    _ => continue,
                }
            }
            _ => continue, // Skip points/lines
        };

        let multi = polygons.len() > 1;
        for (part, polygon) in polygons.iter().enumerate() {
            let region = Region::from_polygon(polygon)
                .with_context(|| format!("Invalid polygon in feature {}", name))?;
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

pub fn write_geojson(path: &Path, collection: FeatureCollection) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    fs::write(path, GeoJson::from(collection).to_string())
        .with_context(|| format!("Failed to write GeoJSON: {:?}", path))
}

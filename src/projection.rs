//! Geographic <-> Web Mercator reprojection and slippy-map pixel math.

use crate::error::{GeometryError, Result};
use crate::types::Region;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

const TILE_SIZE: u32 = 256;

const EARTH_RADIUS: f64 = 6_378_137.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// EPSG:4326, degrees of longitude/latitude.
    Geographic,
    /// EPSG:3857, metres on the spherical Mercator plane.
    WebMercator,
}

impl Crs {
    pub fn code(&self) -> &'static str {
        match self {
            Crs::Geographic => "EPSG:4326",
            Crs::WebMercator => "EPSG:3857",
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Crs {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "WGS84" => Ok(Crs::Geographic),
            "EPSG:3857" | "EPSG:900913" => Ok(Crs::WebMercator),
            _ => Err(GeometryError::UnknownCrs(s.to_string())),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = GeometryError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.code().to_string()
    }
}

pub fn reproject(point: Coord<f64>, from: Crs, to: Crs) -> Coord<f64> {
    match (from, to) {
        (Crs::Geographic, Crs::WebMercator) => to_web_mercator(point),
        (Crs::WebMercator, Crs::Geographic) => to_geographic(point),
        _ => point,
    }
}

/// Reprojects every vertex of a region and revalidates the result.
pub fn reproject_region(region: &Region, from: Crs, to: Crs) -> Result<Region> {
    if from == to {
        return Ok(region.clone());
    }
    Region::new(
        region
            .vertices()
            .iter()
            .map(|&vertex| reproject(vertex, from, to)),
    )
}

fn to_web_mercator(point: Coord<f64>) -> Coord<f64> {
    let lat = point.y.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    Coord {
        x: EARTH_RADIUS * point.x.to_radians(),
        y: EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln(),
    }
}

fn to_geographic(point: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (point.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Position of a lon/lat in global pixel space at `zoom` (256 px tiles).
pub fn lon_lat_to_world_pixel(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x_t = (lon + 180.0) / 360.0 * n;
    let y_t = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0 * n;
    (x_t * TILE_SIZE as f64, y_t * TILE_SIZE as f64)
}

use crate::error::{GeometryError, Result};
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single located event reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEvent {
    pub longitude: f64,
    pub latitude: f64,
    pub entity_id: String,
}

impl PointEvent {
    pub fn new(longitude: f64, latitude: f64, entity_id: impl Into<String>) -> Self {
        Self {
            longitude,
            latitude,
            entity_id: entity_id.into(),
        }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Points grouped by owning entity, in geographic (lon, lat) coordinates.
///
/// Entities iterate in the order they were first seen while walking the input
/// backwards. The set is read-only once built; share it behind an `Arc` and
/// replace it wholesale when the dataset changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPointSet {
    entries: Vec<(String, Vec<Coord<f64>>)>,
    index: HashMap<String, usize>,
}

impl EntityPointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entity_id: &str, coord: Coord<f64>) {
        match self.index.get(entity_id) {
            Some(&slot) => self.entries[slot].1.push(coord),
            None => {
                self.index.insert(entity_id.to_string(), self.entries.len());
                self.entries.push((entity_id.to_string(), vec![coord]));
            }
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&[Coord<f64>]> {
        self.index
            .get(entity_id)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of points across all entities.
    pub fn point_count(&self) -> usize {
        self.entries.iter().map(|(_, points)| points.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Coord<f64>])> {
        self.entries
            .iter()
            .map(|(id, points)| (id.as_str(), points.as_slice()))
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

/// A simple polygon with at least three distinct, finite vertices.
///
/// The ring may be given open or closed; it is always stored closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    polygon: Polygon<f64>,
}

impl Region {
    pub fn new<I>(vertices: I) -> Result<Self>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let mut ring: Vec<Coord<f64>> = Vec::new();
        for (index, coord) in vertices.into_iter().enumerate() {
            if !coord.x.is_finite() || !coord.y.is_finite() {
                return Err(GeometryError::NonFiniteCoordinate {
                    index,
                    x: coord.x,
                    y: coord.y,
                });
            }
            if ring.last() != Some(&coord) {
                ring.push(coord);
            }
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
        for coord in &ring {
            if !distinct.contains(coord) {
                distinct.push(*coord);
            }
        }
        if distinct.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                distinct: distinct.len(),
            });
        }

        // Polygon::new closes the exterior ring.
        Ok(Self {
            polygon: Polygon::new(LineString::from(ring), vec![]),
        })
    }

    /// Builds a region from (longitude, latitude) pairs.
    pub fn from_lon_lat(vertices: &[(f64, f64)]) -> Result<Self> {
        Self::new(vertices.iter().map(|&(x, y)| Coord { x, y }))
    }

    /// Takes the exterior ring of a polygon; interior rings are dropped.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Result<Self> {
        Self::new(polygon.exterior().coords().copied())
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Vertices of the ring without the closing repeat.
    pub fn vertices(&self) -> &[Coord<f64>] {
        let coords = &self.polygon.exterior().0;
        &coords[..coords.len() - 1]
    }
}

/// Number of entities with at least one point strictly inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountResult {
    pub entities: usize,
}

impl CountResult {
    /// The text shown on a shape's label.
    pub fn label(&self) -> String {
        self.entities.to_string()
    }
}

impl fmt::Display for CountResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entities)
    }
}

/// Identifier of a drawn shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape-{}", self.0)
    }
}

//! Unique device counts inside a drawn region.
//!
//! Containment uses geo's `Contains`: a point on an edge or vertex of the
//! region is outside. Every point of every entity is tested, there is no
//! spatial index.

use crate::types::{CountResult, EntityPointSet, Region};
use geo::algorithm::contains::Contains;
use geo::{Coord, Point};
use tracing::debug;

/// Number of `points` strictly inside `region`.
pub fn points_within(region: &Region, points: &[Coord<f64>]) -> usize {
    let polygon = region.polygon();
    points
        .iter()
        .filter(|coord| polygon.contains(&Point::from(**coord)))
        .count()
}

/// Per-entity number of points inside `region`, in set order.
pub fn entity_tallies<'a>(region: &Region, by_entity: &'a EntityPointSet) -> Vec<(&'a str, usize)> {
    by_entity
        .iter()
        .map(|(entity, points)| (entity, points_within(region, points)))
        .collect()
}

/// Counts entities with at least one point inside `region`.
///
/// Both inputs are in the same (geographic) coordinate system. An empty set
/// counts to zero.
pub fn count_within(region: &Region, by_entity: &EntityPointSet) -> CountResult {
    let polygon = region.polygon();
    let entities = by_entity
        .iter()
        .filter(|(_, points)| {
            points
                .iter()
                .any(|coord| polygon.contains(&Point::from(*coord)))
        })
        .count();

    debug!(
        entities,
        candidates = by_entity.len(),
        vertices = region.vertices().len(),
        "counted entities within region"
    );
    CountResult { entities }
}

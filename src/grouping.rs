//! Grouping of raw point events by device.

use crate::error::{GeometryError, Result};
use crate::types::{EntityPointSet, PointEvent};
use tracing::debug;

/// Groups events by `entity_id`.
///
/// Events are consumed newest-first: the input is walked in reverse, so both
/// the entity order and each entity's point order are the reverse of arrival
/// order. Counting does not depend on this order.
///
/// Fails on the first event with a non-finite coordinate or an empty entity id.
pub fn group(points: &[PointEvent]) -> Result<EntityPointSet> {
    let mut grouped = EntityPointSet::new();

    for (index, event) in points.iter().enumerate().rev() {
        if !event.longitude.is_finite() || !event.latitude.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate {
                index,
                x: event.longitude,
                y: event.latitude,
            });
        }
        if event.entity_id.is_empty() {
            return Err(GeometryError::MissingEntityId { index });
        }
        grouped.push(&event.entity_id, event.coord());
    }

    debug!(
        events = points.len(),
        entities = grouped.len(),
        "grouped point events"
    );
    Ok(grouped)
}

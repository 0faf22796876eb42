//! Drawn shapes and their count labels.
//!
//! Shapes arrive in the display CRS, usually Web Mercator, and are kept that
//! way. Counting runs against the attached [`EntityPointSet`] snapshot after
//! reprojecting the ring to geographic coordinates. Labels live in their own
//! map keyed by [`ShapeId`], not on the geometry.

use crate::counting::count_within;
use crate::error::Result;
use crate::projection::{reproject_region, Crs};
use crate::types::{CountResult, EntityPointSet, Region, ShapeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct ShapeLayer {
    display_crs: Crs,
    snapshot: Option<Arc<EntityPointSet>>,
    shapes: BTreeMap<ShapeId, Region>,
    labels: HashMap<ShapeId, CountResult>,
    next_id: u64,
}

impl Default for ShapeLayer {
    fn default() -> Self {
        Self::new(Crs::WebMercator)
    }
}

impl ShapeLayer {
    pub fn new(display_crs: Crs) -> Self {
        Self {
            display_crs,
            snapshot: None,
            shapes: BTreeMap::new(),
            labels: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn display_crs(&self) -> Crs {
        self.display_crs
    }

    /// Swaps in a new dataset snapshot. Existing labels are left as they are.
    pub fn attach(&mut self, snapshot: Arc<EntityPointSet>) {
        info!(
            entities = snapshot.len(),
            points = snapshot.point_count(),
            "attached point snapshot"
        );
        self.snapshot = Some(snapshot);
    }

    /// Drops the snapshot; shapes drawn afterwards stay unlabeled.
    pub fn detach(&mut self) -> Option<Arc<EntityPointSet>> {
        self.snapshot.take()
    }

    pub fn snapshot(&self) -> Option<&Arc<EntityPointSet>> {
        self.snapshot.as_ref()
    }

    /// Stores a finished shape and labels it when a snapshot is attached.
    pub fn finalize(&mut self, polygon: Region) -> Result<ShapeId> {
        let label = self.count(&polygon)?;
        let id = ShapeId(self.next_id);
        self.next_id += 1;

        self.shapes.insert(id, polygon);
        if let Some(label) = label {
            self.labels.insert(id, label);
        }
        debug!(%id, label = ?label, "finalized shape");
        Ok(id)
    }

    /// Replaces a shape's geometry and recounts it.
    ///
    /// Returns `Ok(false)` for an unknown id. On error the previous geometry
    /// and label are kept.
    pub fn modify(&mut self, id: ShapeId, polygon: Region) -> Result<bool> {
        if !self.shapes.contains_key(&id) {
            warn!(%id, "modify for unknown shape");
            return Ok(false);
        }
        let label = self.count(&polygon)?;
        self.shapes.insert(id, polygon);
        match label {
            Some(label) => {
                self.labels.insert(id, label);
            }
            None => {
                self.labels.remove(&id);
            }
        }
        Ok(true)
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Region> {
        self.labels.remove(&id);
        self.shapes.remove(&id)
    }

    /// Removes every drawn shape.
    pub fn clear(&mut self) {
        info!(removed = self.shapes.len(), "cleared drawn shapes");
        self.shapes.clear();
        self.labels.clear();
    }

    /// Recounts every shape against the current snapshot.
    ///
    /// Never called implicitly by [`ShapeLayer::attach`].
    pub fn relabel_all(&mut self) -> Result<()> {
        let mut labels = HashMap::with_capacity(self.shapes.len());
        for (id, polygon) in &self.shapes {
            if let Some(label) = self.count(polygon)? {
                labels.insert(*id, label);
            }
        }
        self.labels = labels;
        Ok(())
    }

    pub fn label(&self, id: ShapeId) -> Option<CountResult> {
        self.labels.get(&id).copied()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Region> {
        self.shapes.get(&id)
    }

    /// Shapes in creation order with their labels.
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Region, Option<CountResult>)> {
        self.shapes
            .iter()
            .map(|(id, polygon)| (*id, polygon, self.labels.get(id).copied()))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn count(&self, polygon: &Region) -> Result<Option<CountResult>> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(None);
        };
        let geographic = reproject_region(polygon, self.display_crs, Crs::Geographic)?;
        Ok(Some(count_within(&geographic, snapshot)))
    }
}

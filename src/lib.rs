//! Device point heatmaps and unique-device counts over drawn regions.
//!
//! Point events are grouped once per dataset into an [`EntityPointSet`]
//! snapshot. Each drawn or edited region is then counted against that
//! snapshot: the result is the number of devices with at least one point
//! strictly inside the region.
//!
//! ```
//! use device_heatmap::{count_within, group, PointEvent, Region};
//!
//! let events = vec![
//!     PointEvent::new(0.0, 0.0, "A"),
//!     PointEvent::new(0.0, 0.0, "A"),
//!     PointEvent::new(10.0, 10.0, "B"),
//! ];
//! let snapshot = group(&events).unwrap();
//! let square = Region::from_lon_lat(&[(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)]).unwrap();
//!
//! assert_eq!(count_within(&square, &snapshot).entities, 1);
//! ```

pub mod config;
pub mod counting;
pub mod data;
pub mod error;
pub mod export;
pub mod grouping;
pub mod heatmap;
pub mod projection;
pub mod shapes;
pub mod types;

pub use counting::count_within;
pub use error::{GeometryError, Result};
pub use grouping::group;
pub use projection::{reproject, Crs};
pub use shapes::ShapeLayer;
pub use types::{CountResult, EntityPointSet, PointEvent, Region, ShapeId};

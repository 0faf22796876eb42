use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Errors raised by grouping, counting and reprojection.
///
/// An empty dataset is never an error; it groups to an empty set and counts to zero.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 distinct vertices, got {distinct}")]
    TooFewVertices { distinct: usize },

    #[error("non-finite coordinate ({x}, {y}) at index {index}")]
    NonFiniteCoordinate { index: usize, x: f64, y: f64 },

    #[error("point event at index {index} has an empty entity id")]
    MissingEntityId { index: usize },

    #[error("unsupported coordinate reference system: {0}")]
    UnknownCrs(String),
}

impl GeometryError {
    /// True for the malformed polygon / malformed point class of errors.
    pub fn is_invalid_geometry(&self) -> bool {
        matches!(
            self,
            GeometryError::TooFewVertices { .. }
                | GeometryError::NonFiniteCoordinate { .. }
                | GeometryError::MissingEntityId { .. }
        )
    }
}

/// Errors raised while turning uploaded bytes into a mesh
use thiserror::Error;

/// Failure reported by a [`GeometryLoader`](crate::loader::GeometryLoader)
#[derive(Error, Debug)]
pub enum GeometryLoadError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooShort(usize),

    #[error("unexpected end of file: header declares {declared} facets, found {found}")]
    Truncated { declared: usize, found: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),

    #[error("unsupported geometry format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for geometry loading
pub type Result<T> = std::result::Result<T, GeometryLoadError>;

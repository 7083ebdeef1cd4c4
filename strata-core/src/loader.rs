/// Geometry loading boundary: byte source plus format tag in, triangles out
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{GeometryLoadError, Result};
use crate::geometry::Mesh;
use crate::stl;

/// Geometry file formats understood by the bundled loaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
    Stl,
}

impl GeometryFormat {
    /// Infer the format from a file name's extension
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if extension.eq_ignore_ascii_case("stl") {
            Ok(GeometryFormat::Stl)
        } else {
            Err(GeometryLoadError::UnsupportedFormat(file_name.to_string()))
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            GeometryFormat::Stl => "stl",
        }
    }
}

impl fmt::Display for GeometryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Turns raw bytes into an ordered triangle list.
///
/// Implementations may be slow; callers run them off the render loop and
/// report back with a [`LoadTicket`](crate::store::LoadTicket).
pub trait GeometryLoader {
    fn load(&self, bytes: &[u8], format: GeometryFormat) -> Result<Mesh>;
}

/// Loader for binary and ASCII STL
#[derive(Debug, Clone, Copy, Default)]
pub struct StlLoader;

impl GeometryLoader for StlLoader {
    fn load(&self, bytes: &[u8], format: GeometryFormat) -> Result<Mesh> {
        match format {
            GeometryFormat::Stl => stl::parse_stl(bytes),
        }
    }
}

/// Read and parse a file from disk, inferring the format from its name
pub fn load_path<L: GeometryLoader>(loader: &L, path: &Path) -> Result<Mesh> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let format = GeometryFormat::from_file_name(file_name)?;
    let bytes = std::fs::read(path)?;
    loader.load(&bytes, format)
}

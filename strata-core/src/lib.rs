/// Strata Core Library - layered mesh scenes and mesh volumes
///
/// This library owns the state behind a multi-layer mesh viewer: the layer
/// collection and its mutations, volume measurement of loaded meshes,
/// placeholder shapes for layers without geometry, and composition of the
/// renderable scene. Viewer shells (terminal, web) sit on top of it.

pub mod color;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod loader;
pub mod placeholder;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod store;
pub mod transform;
pub mod volume;

// Re-export commonly used types
pub use color::Rgb;
pub use error::GeometryLoadError;
pub use geometry::{Mesh, Triangle, Vertex};
pub use layer::{default_seed, GeometrySource, Layer, LayerDraft, LayerId, SeedLayer};
pub use loader::{GeometryFormat, GeometryLoader, StlLoader};
pub use placeholder::PlaceholderShape;
pub use projection::Camera;
pub use scene::{compose, compose_store, NodeGeometry, Scene, SceneNode};
pub use store::{LayerStore, LoadOutcome, LoadTicket};
pub use transform::{OrbitState, Transform};
pub use volume::mesh_volume_ml;

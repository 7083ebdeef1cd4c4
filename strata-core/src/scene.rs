/// Scene composition: layers plus brightness in, renderable scene out
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::color::Rgb;
use crate::geometry::Mesh;
use crate::layer::{GeometrySource, Layer, LayerId};
use crate::placeholder::PlaceholderShape;
use crate::store::LayerStore;

/// Geometry a node draws, resolved once per composition
#[derive(Debug, Clone)]
pub enum NodeGeometry {
    Mesh(Arc<Mesh>),
    Placeholder(PlaceholderShape),
}

impl NodeGeometry {
    fn for_layer(layer: &Layer) -> Self {
        match &layer.geometry {
            GeometrySource::Mesh(mesh) => NodeGeometry::Mesh(Arc::clone(mesh)),
            GeometrySource::Absent | GeometrySource::Pending | GeometrySource::Failed(_) => {
                NodeGeometry::Placeholder(PlaceholderShape::for_name(&layer.name))
            }
        }
    }

    /// Translation applied to the geometry when placed in the scene
    pub fn offset(&self) -> Vector3<f32> {
        match self {
            NodeGeometry::Mesh(_) => Vector3::zeros(),
            NodeGeometry::Placeholder(shape) => shape.offset(),
        }
    }
}

/// Surface model for a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    /// Clear-coated physical material used for loaded meshes
    Physical {
        metalness: f32,
        roughness: f32,
        clearcoat: f32,
        clearcoat_roughness: f32,
        double_sided: bool,
    },
    /// Standard material used for placeholder shapes
    Standard { metalness: f32, roughness: f32 },
}

impl Material {
    pub const MESH: Material = Material::Physical {
        metalness: 0.1,
        roughness: 0.5,
        clearcoat: 1.0,
        clearcoat_roughness: 0.1,
        double_sided: true,
    };

    pub const PLACEHOLDER: Material = Material::Standard {
        metalness: 0.2,
        roughness: 0.3,
    };
}

/// One visible layer, ready to draw
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub layer: LayerId,
    pub name: String,
    pub color: Rgb,
    pub opacity: f32,
    pub geometry: NodeGeometry,
    pub material: Material,
}

impl SceneNode {
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalLight {
    pub position: [f32; 3],
    pub color: Rgb,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_bias: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointLight {
    pub position: [f32; 3],
    pub color: Rgb,
    pub intensity: f32,
}

/// Ambient fill, a key light, and a blue accent from below
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub key: DirectionalLight,
    pub accent: PointLight,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Rgb::WHITE,
                intensity: 0.5,
            },
            key: DirectionalLight {
                position: [50.0, 50.0, 25.0],
                color: Rgb::WHITE,
                intensity: 1.0,
                cast_shadow: true,
                shadow_bias: -0.0001,
            },
            accent: PointLight {
                position: [-50.0, -50.0, -50.0],
                color: Rgb::BLUE,
                intensity: 0.5,
            },
        }
    }
}

/// Initial camera placement; interaction happens in the viewer shell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraPose {
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn target(&self) -> Point3<f32> {
        Point3::from(self.target)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: [0.0, 50.0, 150.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

/// Everything a viewer needs to draw one frame
#[derive(Debug, Clone)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub background: Rgb,
    pub lights: LightRig,
    pub camera: CameraPose,
}

/// Black at 0, white at 1, linear in between
pub fn background_color(brightness: f32) -> Rgb {
    Rgb::BLACK.lerp(&Rgb::WHITE, brightness)
}

/// Build the scene for the given layers and brightness.
///
/// Hidden layers produce no node at all. Layers without a loaded mesh get
/// their placeholder shape.
pub fn compose(layers: &[Layer], brightness: f32) -> Scene {
    let nodes = layers
        .iter()
        .filter(|layer| layer.visible)
        .map(|layer| {
            let geometry = NodeGeometry::for_layer(layer);
            let material = match geometry {
                NodeGeometry::Mesh(_) => Material::MESH,
                NodeGeometry::Placeholder(_) => Material::PLACEHOLDER,
            };
            SceneNode {
                layer: layer.id(),
                name: layer.name.clone(),
                color: layer.color,
                opacity: layer.opacity,
                geometry,
                material,
            }
        })
        .collect();

    Scene {
        nodes,
        background: background_color(brightness),
        lights: LightRig::default(),
        camera: CameraPose::default(),
    }
}

/// Compose straight from a store's current layers and brightness
pub fn compose_store(store: &LayerStore) -> Scene {
    compose(store.layers(), store.brightness())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::default_seed;

    fn store() -> LayerStore {
        LayerStore::with_seed(&default_seed())
    }

    #[test]
    fn test_background_interpolation() {
        assert_eq!(background_color(0.0), Rgb::BLACK);
        assert_eq!(background_color(1.0), Rgb::WHITE);
        assert_eq!(background_color(0.5), Rgb::new(0.5, 0.5, 0.5));
        assert_eq!(background_color(0.5).to_bytes(), [128, 128, 128]);
    }

    #[test]
    fn test_one_node_per_visible_layer() {
        let mut store = store();
        let hidden = store.layers()[1].id();
        store.set_visible(hidden, false);

        let scene = compose_store(&store);
        assert_eq!(scene.nodes.len(), 2);
        assert!(scene.nodes.iter().all(|node| node.layer != hidden));

        let order: Vec<LayerId> = scene.nodes.iter().map(|n| n.layer).collect();
        assert_eq!(order, vec![store.layers()[0].id(), store.layers()[2].id()]);
    }

    #[test]
    fn test_all_hidden_yields_empty_scene() {
        let mut store = store();
        for id in store.layers().iter().map(|l| l.id()).collect::<Vec<_>>() {
            store.set_visible(id, false);
        }

        let scene = compose_store(&store);
        assert!(scene.nodes.is_empty());
        assert_eq!(scene.lights, LightRig::default());
        assert_eq!(scene.camera, CameraPose::default());
    }

    #[test]
    fn test_node_carries_layer_style() {
        let scene = compose_store(&store());
        let first = &scene.nodes[0];
        assert_eq!(first.color.to_hex(), "#f472b6");
        assert_eq!(first.opacity, 0.9);
        assert!(first.is_transparent());
        assert_eq!(first.material, Material::PLACEHOLDER);
        assert!(matches!(
            first.geometry,
            NodeGeometry::Placeholder(PlaceholderShape::TorusKnot)
        ));
    }

    #[test]
    fn test_loaded_mesh_node() {
        let mut store = LayerStore::new();
        let ticket = store.add_upload("cube.stl", Rgb::WHITE);

        let pending = compose_store(&store);
        assert!(matches!(pending.nodes[0].geometry, NodeGeometry::Placeholder(_)));

        store.complete_load(ticket, Ok(Mesh::cube(10.0)));
        let loaded = compose_store(&store);
        assert_eq!(loaded.nodes[0].material, Material::MESH);
        match &loaded.nodes[0].geometry {
            NodeGeometry::Mesh(mesh) => assert_eq!(mesh.triangle_count(), 12),
            other => panic!("expected mesh, got {:?}", other),
        }
        assert_eq!(loaded.nodes[0].geometry.offset(), Vector3::zeros());
    }

    #[test]
    fn test_fixed_rig_and_camera() {
        let scene = compose(&[], 0.3);
        assert_eq!(scene.lights.ambient.intensity, 0.5);
        assert_eq!(scene.lights.key.position, [50.0, 50.0, 25.0]);
        assert_eq!(scene.lights.accent.color, Rgb::BLUE);
        assert_eq!(scene.camera.position, [0.0, 50.0, 150.0]);
        assert_eq!(scene.camera.fov_degrees, 45.0);
    }
}

/// Strata Web - WASM bindings for a browser viewer shell
///
/// The browser host owns the canvas, camera controls, and file picker. It
/// reads uploaded files itself and hands the bytes over here; this module
/// keeps the layer store and returns the composed scene as JSON plus raw
/// triangle positions for each node.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use strata_core::layer::upload_color;
use strata_core::loader::{GeometryFormat, GeometryLoader, StlLoader};
use strata_core::scene::{CameraPose, LightRig, Material};
use strata_core::{
    compose_store, default_seed, GeometryLoadError, LayerId, LayerStore, LoadOutcome, LoadTicket,
    Mesh, NodeGeometry, PlaceholderShape, Rgb, Scene, SeedLayer,
};
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum GeometryView {
    Mesh { triangles: usize },
    Placeholder { shape: PlaceholderShape, position: [f32; 3] },
}

#[derive(Serialize)]
struct NodeView<'a> {
    id: LayerId,
    name: &'a str,
    color: Rgb,
    opacity: f32,
    transparent: bool,
    geometry: GeometryView,
    material: Material,
}

#[derive(Serialize)]
struct LayerView<'a> {
    id: LayerId,
    name: &'a str,
    color: Rgb,
    visible: bool,
    opacity: f32,
    volume: f32,
    volume_label: String,
}

#[derive(Serialize)]
struct SceneView<'a> {
    background: Rgb,
    lights: LightRig,
    camera: CameraPose,
    nodes: Vec<NodeView<'a>>,
}

impl<'a> SceneView<'a> {
    fn new(scene: &'a Scene) -> Self {
        let nodes = scene
            .nodes
            .iter()
            .map(|node| NodeView {
                id: node.layer,
                name: &node.name,
                color: node.color,
                opacity: node.opacity,
                transparent: node.is_transparent(),
                geometry: match &node.geometry {
                    NodeGeometry::Mesh(mesh) => GeometryView::Mesh {
                        triangles: mesh.triangle_count(),
                    },
                    NodeGeometry::Placeholder(shape) => GeometryView::Placeholder {
                        shape: *shape,
                        position: shape.offset().into(),
                    },
                },
                material: node.material,
            })
            .collect();

        Self {
            background: scene.background,
            lights: scene.lights,
            camera: scene.camera,
            nodes,
        }
    }
}

struct PendingUpload {
    ticket: LoadTicket,
    file_name: String,
}

#[wasm_bindgen]
pub struct WebViewer {
    store: LayerStore,
    seed: Vec<SeedLayer>,
    pending: HashMap<u32, PendingUpload>,
    next_handle: u32,
    rng: SmallRng,
}

#[wasm_bindgen]
impl WebViewer {
    /// Create a viewer with the demo layers; `seed` drives upload colors
    /// and simulated volumes
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> WebViewer {
        let layers = default_seed();
        let mut viewer = WebViewer {
            store: LayerStore::with_seed(&layers),
            seed: layers,
            pending: HashMap::new(),
            next_handle: 1,
            rng: SmallRng::seed_from_u64(seed as u64),
        };
        viewer.store.assign_simulated_volumes(&mut viewer.rng);
        viewer
    }

    /// Add a layer for a picked file; returns a handle for `finish_upload`
    pub fn begin_upload(&mut self, file_name: &str) -> u32 {
        let ticket = self
            .store
            .add_upload(file_name, upload_color(&mut self.rng));
        let handle = self.next_handle;
        self.next_handle += 1;
        self.pending.insert(
            handle,
            PendingUpload {
                ticket,
                file_name: file_name.to_string(),
            },
        );
        handle
    }

    /// Parse the uploaded bytes and record the mesh and its volume.
    ///
    /// Returns `true` when the mesh was applied. Unknown handles and layers
    /// deleted in the meantime are ignored.
    pub fn finish_upload(&mut self, handle: u32, bytes: &[u8]) -> bool {
        let Some(upload) = self.pending.remove(&handle) else {
            return false;
        };
        let result = GeometryFormat::from_file_name(&upload.file_name)
            .and_then(|format| StlLoader.load(bytes, format));
        self.complete(upload.ticket, result)
    }

    /// Record a read failure reported by the host
    pub fn fail_upload(&mut self, handle: u32, reason: &str) {
        if let Some(upload) = self.pending.remove(&handle) {
            let error = std::io::Error::new(std::io::ErrorKind::Other, reason.to_string());
            self.complete(upload.ticket, Err(GeometryLoadError::Io(error)));
        }
    }

    /// Ids of all layers in display order, as JS numbers
    pub fn layer_ids(&self) -> Vec<f64> {
        self.store
            .layers()
            .iter()
            .map(|layer| layer.id().raw() as f64)
            .collect()
    }

    pub fn toggle_visibility(&mut self, id: f64) {
        self.store.toggle_visibility(layer_id(id));
    }

    pub fn set_visible(&mut self, id: f64, visible: bool) {
        self.store.set_visible(layer_id(id), visible);
    }

    pub fn set_opacity(&mut self, id: f64, opacity: f32) {
        self.store.set_opacity(layer_id(id), opacity);
    }

    /// Delete a layer; any upload still pending for it is forgotten
    pub fn remove(&mut self, id: f64) {
        let id = layer_id(id);
        self.store.remove(id);
        self.pending.retain(|_, upload| upload.ticket.layer != id);
    }

    pub fn reset(&mut self) {
        self.store.reset(&self.seed);
        self.pending.clear();
        self.store.assign_simulated_volumes(&mut self.rng);
    }

    /// Uploads started but not yet finished or failed
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    pub fn brightness(&self) -> f32 {
        self.store.brightness()
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.store.set_brightness(brightness);
    }

    pub fn layer_count(&self) -> usize {
        self.store.len()
    }

    /// Layer panel contents as JSON
    pub fn layers_json(&self) -> Result<String, JsValue> {
        let layers: Vec<LayerView> = self
            .store
            .layers()
            .iter()
            .map(|layer| LayerView {
                id: layer.id(),
                name: &layer.name,
                color: layer.color,
                visible: layer.visible,
                opacity: layer.opacity,
                volume: layer.volume,
                volume_label: layer.volume_label(),
            })
            .collect();
        serde_json::to_string(&layers).map_err(to_js_error)
    }

    /// The composed scene as JSON
    pub fn scene_json(&self) -> Result<String, JsValue> {
        let scene = compose_store(&self.store);
        serde_json::to_string(&SceneView::new(&scene)).map_err(to_js_error)
    }

    /// Flat `x, y, z` triangle positions for a visible layer, empty if hidden or gone
    pub fn mesh_positions(&self, id: f64) -> Vec<f32> {
        let scene = compose_store(&self.store);
        let Some(node) = scene.nodes.iter().find(|node| node.layer == layer_id(id)) else {
            return Vec::new();
        };

        match &node.geometry {
            NodeGeometry::Mesh(mesh) => mesh.flat_positions(),
            NodeGeometry::Placeholder(shape) => shape.mesh().flat_positions(),
        }
    }
}

impl WebViewer {
    fn complete(&mut self, ticket: LoadTicket, result: Result<Mesh, GeometryLoadError>) -> bool {
        if let Err(err) = &result {
            console_warn(&format!("layer {}: geometry load failed: {}", ticket.layer, err));
        }
        matches!(
            self.store.complete_load(ticket, result),
            LoadOutcome::Applied { .. }
        )
    }
}

/// Ids cross the JS boundary as numbers; negative or NaN input maps to 0,
/// which is never allocated
fn layer_id(id: f64) -> LayerId {
    LayerId::from_raw(id as u64)
}

fn to_js_error(err: serde_json::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn console_warn(message: &str) {
    log::warn!("{}", message);
}

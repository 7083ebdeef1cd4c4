/// Ordered, id-keyed collection of layers plus the ambient background brightness.
///
/// Every mutation is keyed by [`LayerId`] and replaces a single field.
/// Unknown ids are a silent no-op: a load can finish after its layer was
/// deleted, and that must neither fail nor bring the layer back.
///
/// The collection is copy-on-write. [`LayerStore::snapshot`] hands out a
/// shared view that later mutations never touch.
use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;

use crate::color::Rgb;
use crate::error::GeometryLoadError;
use crate::geometry::Mesh;
use crate::layer::{GeometrySource, Layer, LayerDraft, LayerId, SeedLayer};
use crate::placeholder::simulated_volume;
use crate::volume::mesh_volume_ml;

/// Background brightness at startup and after a reset (pure white)
pub const DEFAULT_BRIGHTNESS: f32 = 1.0;

/// Claim on the result of one geometry load for one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub layer: LayerId,
    generation: u64,
}

/// What happened to a completed load
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// Mesh stored and volume written
    Applied { volume: f32 },
    /// Loader failed; the layer keeps rendering a placeholder
    Failed,
    /// A newer load for the same layer started since this ticket was issued
    Stale,
    /// The layer was deleted while loading
    Missing,
}

#[derive(Debug, Clone)]
pub struct LayerStore {
    layers: Arc<Vec<Layer>>,
    brightness: f32,
    next_id: u64,
    next_generation: u64,
}

impl LayerStore {
    pub fn new() -> Self {
        Self {
            layers: Arc::new(Vec::new()),
            brightness: DEFAULT_BRIGHTNESS,
            next_id: 1,
            next_generation: 1,
        }
    }

    /// Store populated with the given seed layers
    pub fn with_seed(seed: &[SeedLayer]) -> Self {
        let mut store = Self::new();
        store.reset(seed);
        store
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Shared view of the current layers, unaffected by later mutations
    pub fn snapshot(&self) -> Arc<Vec<Layer>> {
        Arc::clone(&self.layers)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Set background brightness, clamped to [0, 1]; NaN is ignored
    pub fn set_brightness(&mut self, brightness: f32) {
        if brightness.is_nan() {
            return;
        }
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    /// Append a layer with a fresh id
    pub fn add(&mut self, draft: LayerDraft) -> LayerId {
        let id = LayerId::from_raw(self.next_id);
        self.next_id += 1;

        info!("adding layer {} ({})", id, draft.name);
        Arc::make_mut(&mut self.layers).push(Layer {
            id,
            name: draft.name,
            geometry: draft.geometry,
            color: draft.color,
            visible: draft.visible,
            opacity: clamp_unit(draft.opacity),
            volume: clamp_volume(draft.volume),
            generation: 0,
        });
        id
    }

    /// Append a layer for an uploaded file and start its load
    pub fn add_upload(&mut self, file_name: &str, color: Rgb) -> LoadTicket {
        let id = self.add(LayerDraft::upload(file_name, color));
        self.issue_ticket(id)
    }

    pub fn remove(&mut self, id: LayerId) {
        let Some(index) = self.index_of(id) else {
            debug!("remove: layer {} not found", id);
            return;
        };

        let layer = Arc::make_mut(&mut self.layers).remove(index);
        info!("removed layer {} ({})", id, layer.name);
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        self.update(id, |layer| layer.visible = visible);
    }

    pub fn toggle_visibility(&mut self, id: LayerId) {
        self.update(id, |layer| layer.visible = !layer.visible);
    }

    /// Set opacity, clamped to [0, 1]
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        if opacity.is_nan() {
            return;
        }
        let opacity = clamp_unit(opacity);
        self.update(id, |layer| layer.opacity = opacity);
    }

    /// Set volume in millilitres; negative values clamp to 0
    pub fn set_volume(&mut self, id: LayerId, volume: f32) {
        let volume = clamp_volume(volume);
        self.update(id, |layer| layer.volume = volume);
    }

    /// Restore exactly the seed layers (with fresh ids) and the default brightness
    pub fn reset(&mut self, seed: &[SeedLayer]) {
        self.layers = Arc::new(Vec::with_capacity(seed.len()));
        self.brightness = DEFAULT_BRIGHTNESS;
        for layer in seed {
            self.add(LayerDraft::from(layer));
        }
        info!("reset to {} seed layers", seed.len());
    }

    /// Start a new geometry load for an existing layer.
    ///
    /// The layer goes back to `Pending` with its volume cleared, since the
    /// old volume belongs to the old geometry. Tickets from earlier loads
    /// become stale.
    pub fn begin_load(&mut self, id: LayerId) -> Option<LoadTicket> {
        if !self.contains(id) {
            debug!("begin_load: layer {} not found", id);
            return None;
        }
        Some(self.issue_ticket(id))
    }

    /// Apply the result of a load: compute the volume once and store the mesh
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Mesh, GeometryLoadError>,
    ) -> LoadOutcome {
        let Some(layer) = self.get(ticket.layer) else {
            debug!("load for layer {} finished after it was removed", ticket.layer);
            return LoadOutcome::Missing;
        };
        if layer.generation != ticket.generation {
            debug!("discarding superseded load for layer {}", ticket.layer);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(mesh) => {
                let volume = clamp_volume(mesh_volume_ml(&mesh));
                let mesh = Arc::new(mesh);
                info!(
                    "layer {}: loaded {} triangles, {:.1} ml",
                    ticket.layer,
                    mesh.triangle_count(),
                    volume
                );
                self.update(ticket.layer, |layer| {
                    layer.geometry = GeometrySource::Mesh(mesh);
                    layer.volume = volume;
                });
                LoadOutcome::Applied { volume }
            }
            Err(err) => {
                warn!("layer {}: geometry load failed: {}", ticket.layer, err);
                let reason = err.to_string();
                self.update(ticket.layer, |layer| {
                    layer.geometry = GeometrySource::Failed(reason);
                });
                LoadOutcome::Failed
            }
        }
    }

    /// Give every mesh-less built-in layer a simulated volume, once.
    ///
    /// Only layers still at the unset volume are touched, so calling this on
    /// every frame leaves already assigned volumes alone.
    pub fn assign_simulated_volumes<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let unset: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|layer| matches!(layer.geometry, GeometrySource::Absent))
            .filter(|layer| !layer.has_volume())
            .map(|layer| layer.id)
            .collect();

        for id in unset {
            let volume = simulated_volume(rng);
            debug!("layer {}: simulated volume {:.1} ml", id, volume);
            self.set_volume(id, volume);
        }
    }

    fn issue_ticket(&mut self, id: LayerId) -> LoadTicket {
        let generation = self.next_generation;
        self.next_generation += 1;

        self.update(id, |layer| {
            layer.generation = generation;
            layer.geometry = GeometrySource::Pending;
            layer.volume = 0.0;
        });
        LoadTicket { layer: id, generation }
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    fn update<F: FnOnce(&mut Layer)>(&mut self, id: LayerId, apply: F) {
        match self.index_of(id) {
            Some(index) => apply(&mut Arc::make_mut(&mut self.layers)[index]),
            None => debug!("update: layer {} not found", id),
        }
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Non-negative and finite; anything else is the unset volume
fn clamp_volume(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

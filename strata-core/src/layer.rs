/// Layer records and the built-in seed set
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::color::Rgb;
use crate::geometry::Mesh;

/// Longest display name, in characters, derived from an uploaded file
pub const MAX_DISPLAY_NAME_CHARS: usize = 15;

/// Opaque layer identity, allocated by a [`LayerStore`](crate::store::LayerStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LayerId(u64);

impl LayerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a layer's triangles come from
#[derive(Debug, Clone)]
pub enum GeometrySource {
    /// Built-in layer with no mesh; rendered as a placeholder shape
    Absent,
    /// Upload whose load has not completed yet
    Pending,
    /// Loaded triangles, shared read-only with the loader and the scene
    Mesh(Arc<Mesh>),
    /// Upload whose load failed
    Failed(String),
}

impl GeometrySource {
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        match self {
            GeometrySource::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, GeometrySource::Mesh(_))
    }
}

/// One independently controllable entity in the scene
#[derive(Debug, Clone)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    pub geometry: GeometrySource,
    pub color: Rgb,
    pub visible: bool,
    pub opacity: f32,
    /// Millilitres; 0 means not computed yet
    pub volume: f32,
    /// Bumped whenever a new load starts, so older completions can be told apart
    pub(crate) generation: u64,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn has_volume(&self) -> bool {
        self.volume > 0.0
    }

    /// Volume as shown in the layer panel: one decimal place, `--` when unset
    pub fn volume_label(&self) -> String {
        if self.has_volume() {
            format!("{:.1}", self.volume)
        } else {
            "--".to_string()
        }
    }

    pub fn opacity_percent(&self) -> u32 {
        (self.opacity * 100.0).round() as u32
    }
}

/// Fields of a layer before the store assigns it an id
#[derive(Debug, Clone)]
pub struct LayerDraft {
    pub name: String,
    pub geometry: GeometrySource,
    pub color: Rgb,
    pub visible: bool,
    pub opacity: f32,
    pub volume: f32,
}

impl LayerDraft {
    /// Draft for an uploaded file: display name from the file name, fully opaque
    pub fn upload(file_name: &str, color: Rgb) -> Self {
        Self {
            name: display_name(file_name),
            geometry: GeometrySource::Pending,
            color,
            visible: true,
            opacity: 1.0,
            volume: 0.0,
        }
    }
}

/// A built-in layer present at startup and after a reset
#[derive(Debug, Clone, PartialEq)]
pub struct SeedLayer {
    pub name: String,
    pub color: Rgb,
    pub opacity: f32,
    pub volume: f32,
}

impl SeedLayer {
    pub fn new(name: &str, color: Rgb, opacity: f32, volume: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            opacity,
            volume,
        }
    }
}

impl From<&SeedLayer> for LayerDraft {
    fn from(seed: &SeedLayer) -> Self {
        Self {
            name: seed.name.clone(),
            geometry: GeometrySource::Absent,
            color: seed.color,
            visible: true,
            opacity: seed.opacity,
            volume: seed.volume,
        }
    }
}

/// The canonical demo layers: upper guide, lower guide, bone
pub fn default_seed() -> Vec<SeedLayer> {
    vec![
        SeedLayer::new("上颌导板", Rgb::from_bytes(0xf4, 0x72, 0xb6), 0.9, 68.37),
        SeedLayer::new("下颌导板", Rgb::from_bytes(0x94, 0xa3, 0xb8), 0.8, 63.05),
        SeedLayer::new("骨骼结构", Rgb::from_bytes(0x34, 0xd3, 0x99), 1.0, 72.49),
    ]
}

/// Display name for an uploaded file: drop a trailing `.stl`, keep 15 characters
pub fn display_name(file_name: &str) -> String {
    let stem = match file_name.len().checked_sub(4) {
        Some(split)
            if file_name.is_char_boundary(split)
                && file_name[split..].eq_ignore_ascii_case(".stl") =>
        {
            &file_name[..split]
        }
        _ => file_name,
    };

    stem.chars().take(MAX_DISPLAY_NAME_CHARS).collect()
}

/// Random hue at 70% saturation, 60% lightness
pub fn upload_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    Rgb::from_hsl(rng.gen_range(0.0..360.0), 0.7, 0.6)
}

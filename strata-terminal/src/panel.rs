/// Text rows for the layer panel overlay
use strata_core::{GeometrySource, LayerStore, Rgb};

/// Widest layer name shown in a row, in characters
const NAME_COLUMN: usize = 15;

pub const CONTROLS: &str =
    "WASD rotate  IJKL pan  +/- zoom  Tab select  V show  [ ] opacity  X delete  B/N background  R reset  Q quit";

/// One layer in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub swatch: Rgb,
    pub text: String,
    pub selected: bool,
}

pub fn header(store: &LayerStore, fps: f32) -> String {
    format!(
        "Strata | {} layers | background {}% | {:.0} fps",
        store.len(),
        (store.brightness() * 100.0).round() as u32,
        fps
    )
}

pub fn rows(store: &LayerStore, selected: usize) -> Vec<PanelRow> {
    if store.is_empty() {
        return vec![PanelRow {
            swatch: Rgb::new(0.5, 0.5, 0.5),
            text: "no layers".to_string(),
            selected: false,
        }];
    }

    store
        .layers()
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let name: String = layer.name.chars().take(NAME_COLUMN).collect();
            let status = match layer.geometry {
                GeometrySource::Pending => " loading",
                GeometrySource::Failed(_) => " failed",
                _ => "",
            };
            PanelRow {
                swatch: layer.color,
                text: format!(
                    "{} {:<width$} {} {:>3}% {:>6} ml{}",
                    if index == selected { '>' } else { ' ' },
                    name,
                    if layer.visible { "on " } else { "off" },
                    layer.opacity_percent(),
                    layer.volume_label(),
                    status,
                    width = NAME_COLUMN,
                ),
                selected: index == selected,
            }
        })
        .collect()
}

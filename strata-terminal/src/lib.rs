/// Terminal viewer shell: renders the composed layer scene as colored ASCII
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self},
};
use log::info;
use nalgebra::{Point3, Vector3};
use rand::rngs::ThreadRng;
use std::collections::HashMap;
use std::io::{self, stdout, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use strata_core::layer::upload_color;
use strata_core::{
    compose_store, LayerStore, Mesh, NodeGeometry, OrbitState, PlaceholderShape, Scene, SeedLayer,
    Transform,
};

pub mod cli;
pub mod loads;
pub mod panel;
pub mod renderer;

pub use cli::{AppConfig, Cli};
pub use loads::LoadQueue;
pub use renderer::{AsciiRenderer, SurfaceStyle};

const ROTATE_STEP: f32 = 0.1;
const PAN_STEP: f32 = 0.05;
const ZOOM_STEP: f32 = 1.1;
const OPACITY_STEP: f32 = 0.05;
const BRIGHTNESS_STEP: f32 = 0.1;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    store: LayerStore,
    seed: Vec<SeedLayer>,
    orbit: OrbitState,
    renderer: AsciiRenderer,
    placeholders: HashMap<PlaceholderShape, Arc<Mesh>>,
    loads: LoadQueue,
    rng: ThreadRng,
    selected: usize,
    running: bool,
    frame_time: Duration,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Create an app sized to the current terminal
    pub fn new(config: AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(config, width as usize, height as usize))
    }

    /// Create an app with an explicit viewport size in cells
    pub fn with_size(config: AppConfig, width: usize, height: usize) -> Self {
        let mut store = LayerStore::with_seed(&config.seed);
        store.set_brightness(config.brightness);

        let mut app = Self {
            store,
            seed: config.seed,
            orbit: OrbitState::new(),
            renderer: AsciiRenderer::new(width, height),
            placeholders: HashMap::new(),
            loads: LoadQueue::new(),
            rng: rand::thread_rng(),
            selected: 0,
            running: true,
            frame_time: Duration::from_millis(1000 / config.fps.max(1) as u64),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };

        for path in config.files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ticket = app.store.add_upload(&file_name, upload_color(&mut app.rng));
            app.loads.spawn(ticket, path);
        }

        app
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => self.renderer.resize(width as usize, height as usize),
            _ => {}
        }
    }

    /// Apply one key press to the view or the layer store
    pub fn handle_key(&mut self, code: KeyCode) {
        // Letter keys work with Shift or Caps Lock held
        let code = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,

            // Rotate / pan / zoom
            KeyCode::Char('w') | KeyCode::Up => self.orbit.rotate(0.0, -ROTATE_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.orbit.rotate(0.0, ROTATE_STEP),
            KeyCode::Char('a') | KeyCode::Left => self.orbit.rotate(-ROTATE_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.orbit.rotate(ROTATE_STEP, 0.0),
            KeyCode::Char('i') => self.orbit.pan(0.0, -PAN_STEP),
            KeyCode::Char('k') => self.orbit.pan(0.0, PAN_STEP),
            KeyCode::Char('j') => self.orbit.pan(PAN_STEP, 0.0),
            KeyCode::Char('l') => self.orbit.pan(-PAN_STEP, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => self.orbit.zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('-') => self.orbit.zoom(ZOOM_STEP),
            KeyCode::Char('0') => self.orbit.reset(),

            // Layer panel
            KeyCode::Tab => self.select_offset(1),
            KeyCode::BackTab => self.select_offset(-1),
            KeyCode::Char('v') => {
                if let Some(id) = self.selected_id() {
                    self.store.toggle_visibility(id);
                }
            }
            KeyCode::Char('[') => self.nudge_opacity(-OPACITY_STEP),
            KeyCode::Char(']') => self.nudge_opacity(OPACITY_STEP),
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.store.remove(id);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('b') => self.nudge_brightness(-BRIGHTNESS_STEP),
            KeyCode::Char('n') => self.nudge_brightness(BRIGHTNESS_STEP),
            KeyCode::Char('r') => {
                self.store.reset(&self.seed);
                self.orbit.reset();
                self.selected = 0;
                info!("view reset");
            }
            _ => {}
        }
    }

    fn selected_id(&self) -> Option<strata_core::LayerId> {
        self.store.layers().get(self.selected).map(|layer| layer.id())
    }

    fn select_offset(&mut self, delta: isize) {
        let len = self.store.len() as isize;
        if len > 0 {
            self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.store.len().saturating_sub(1));
    }

    fn nudge_opacity(&mut self, delta: f32) {
        if let Some(layer) = self.store.layers().get(self.selected) {
            let (id, opacity) = (layer.id(), layer.opacity);
            self.store.set_opacity(id, opacity + delta);
        }
    }

    fn nudge_brightness(&mut self, delta: f32) {
        let brightness = self.store.brightness() + delta;
        self.store.set_brightness(brightness);
    }

    /// Apply finished loads and one-time simulated volumes
    pub fn update(&mut self) {
        for completed in self.loads.drain() {
            self.store.complete_load(completed.ticket, completed.result);
        }
        self.store.assign_simulated_volumes(&mut self.rng);
    }

    fn node_mesh(&mut self, geometry: &NodeGeometry) -> Arc<Mesh> {
        match geometry {
            NodeGeometry::Mesh(mesh) => Arc::clone(mesh),
            NodeGeometry::Placeholder(shape) => Arc::clone(
                self.placeholders
                    .entry(*shape)
                    .or_insert_with(|| Arc::new(shape.mesh())),
            ),
        }
    }

    /// Draw the composed scene into the ASCII buffers
    pub fn render_scene(&mut self, scene: &Scene) {
        let meshes: Vec<(Arc<Mesh>, Vector3<f32>)> = scene
            .nodes
            .iter()
            .map(|node| (self.node_mesh(&node.geometry), node.geometry.offset()))
            .collect();
        let center = scene_center(&meshes);

        let aspect = self.renderer.width() as f32 / self.renderer.height().max(1) as f32 * CELL_ASPECT;
        let camera = Transform::orbit_camera(&scene.camera, &self.orbit, aspect);

        self.renderer.clear(scene.background);
        for (node, (mesh, offset)) in scene.nodes.iter().zip(&meshes) {
            let model = Transform::translation_matrix(&(*offset - center));
            let style = SurfaceStyle {
                color: node.color,
                opacity: node.opacity,
            };
            self.renderer
                .render_mesh(mesh, &model, &camera, &scene.lights, style);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let scene = compose_store(&self.store);
        self.render_scene(&scene);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;
        self.draw_panel(&mut stdout)?;

        stdout.flush()?;
        Ok(())
    }

    fn draw_panel<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let panel_bg = Color::Rgb { r: 15, g: 23, b: 42 };
        let mut line = 0u16;

        queue!(
            out,
            cursor::MoveTo(0, line),
            SetBackgroundColor(panel_bg),
            SetForegroundColor(Color::White),
            Print(panel::header(&self.store, self.fps)),
        )?;
        line += 1;

        for row in panel::rows(&self.store, self.selected) {
            let [r, g, b] = row.swatch.to_bytes();
            let text_color = if row.selected { Color::White } else { Color::Grey };
            queue!(
                out,
                cursor::MoveTo(0, line),
                SetForegroundColor(Color::Rgb { r, g, b }),
                Print("● "),
                SetForegroundColor(text_color),
                Print(row.text),
            )?;
            line += 1;
        }

        if self.loads.in_flight() > 0 {
            queue!(
                out,
                cursor::MoveTo(0, line),
                SetForegroundColor(Color::Yellow),
                Print(format!("loading {} file(s)...", self.loads.in_flight())),
            )?;
        }

        let (_, height) = terminal::size()?;
        queue!(
            out,
            cursor::MoveTo(0, height.saturating_sub(1)),
            SetForegroundColor(Color::DarkGrey),
            Print(panel::CONTROLS),
            ResetColor
        )?;
        Ok(())
    }
}

/// Center of the combined bounds of all placed meshes
fn scene_center(meshes: &[(Arc<Mesh>, Vector3<f32>)]) -> Vector3<f32> {
    let bounds = meshes
        .iter()
        .filter_map(|(mesh, offset)| mesh.bounds().map(|(min, max)| (min + *offset, max + *offset)))
        .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.inf(&min_b), max_a.sup(&max_b)));

    match bounds {
        Some((min, max)) => nalgebra::center(&min, &max).coords,
        None => Point3::origin().coords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_center_of_placeholders() {
        let cylinder = Arc::new(PlaceholderShape::Cylinder.mesh());
        let center = scene_center(&[(cylinder, Vector3::new(0.0, -20.0, 0.0))]);
        assert!((center - Vector3::new(0.0, -20.0, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_scene_center_empty() {
        assert_eq!(scene_center(&[]), Vector3::zeros());
    }

    fn app() -> TerminalApp {
        TerminalApp::with_size(AppConfig::default(), 80, 24)
    }

    fn press(app: &mut TerminalApp, keys: &[KeyCode]) {
        for &key in keys {
            app.handle_key(key);
        }
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app();
        press(&mut app, &[KeyCode::BackTab]);
        assert_eq!(app.selected, 2);
        press(&mut app, &[KeyCode::Tab]);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_toggle_selected_visibility() {
        let mut app = app();
        press(&mut app, &[KeyCode::Tab, KeyCode::Char('v')]);
        assert!(!app.store().layers()[1].visible);
        assert!(app.store().layers()[0].visible);
    }

    #[test]
    fn test_delete_last_clamps_selection() {
        let mut app = app();
        press(&mut app, &[KeyCode::BackTab, KeyCode::Char('x')]);
        assert_eq!(app.store().len(), 2);
        assert_eq!(app.selected, 1);

        press(&mut app, &[KeyCode::Char('x'), KeyCode::Char('x'), KeyCode::Char('x')]);
        assert!(app.store().is_empty());
        assert_eq!(app.selected, 0);
        press(&mut app, &[KeyCode::Tab, KeyCode::Char('v'), KeyCode::Char(']')]);
    }

    #[test]
    fn test_opacity_nudges_clamp() {
        let mut app = app();
        // First seed layer starts at 0.9
        press(&mut app, &[KeyCode::Char(']'); 5]);
        assert_eq!(app.store().layers()[0].opacity, 1.0);

        press(&mut app, &[KeyCode::Char('['); 30]);
        assert_eq!(app.store().layers()[0].opacity, 0.0);
    }

    #[test]
    fn test_brightness_keys() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('b'), KeyCode::Char('b')]);
        assert!((app.store().brightness() - 0.8).abs() < 1e-5);

        press(&mut app, &[KeyCode::Char('n'); 5]);
        assert_eq!(app.store().brightness(), 1.0);
    }

    #[test]
    fn test_reset_restores_seed_and_view() {
        let mut app = app();
        let original: Vec<String> = app.store().layers().iter().map(|l| l.name.clone()).collect();
        press(
            &mut app,
            &[
                KeyCode::Char('x'),
                KeyCode::Char('b'),
                KeyCode::Char('d'),
                KeyCode::Char('-'),
                KeyCode::Tab,
            ],
        );
        assert_eq!(app.store().len(), 2);

        press(&mut app, &[KeyCode::Char('r')]);
        let names: Vec<String> = app.store().layers().iter().map(|l| l.name.clone()).collect();
        assert_eq!(names, original);
        assert_eq!(app.store().brightness(), 1.0);
        assert_eq!(app.orbit, OrbitState::new());
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_uppercase_keys() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('V')]);
        assert!(!app.store().layers()[0].visible);

        press(&mut app, &[KeyCode::Char('Q')]);
        assert!(!app.running);
    }

    #[test]
    fn test_render_scene_fills_viewport() {
        let mut app = app();
        let scene = compose_store(&app.store);
        app.render_scene(&scene);
        assert!(app.renderer.cell(40, 12).is_some());
    }
}

/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use strata_core::scene::LightRig;
use strata_core::{Camera, Mesh, Rgb, Triangle};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Color and opacity a mesh is drawn with
#[derive(Debug, Clone, Copy)]
pub struct SurfaceStyle {
    pub color: Rgb,
    pub opacity: f32,
}

/// ASCII renderer that converts 3D meshes to colored terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    background: Rgb,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Rgb>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            background: Rgb::WHITE,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Rgb::WHITE; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    /// Clear every cell to the background color
    pub fn clear(&mut self, background: Rgb) {
        self.background = background;
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(background);
    }

    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        lights: &LightRig,
        style: SurfaceStyle,
    ) {
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model_matrix, camera, lights, style);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        lights: &LightRig,
        style: SurfaceStyle,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(
                &vertex.position,
                model_matrix,
                self.width as u32,
                self.height as u32,
            ) {
                Some(coords) => *slot = coords,
                None => return, // Behind the camera or outside the depth range
            }
        }

        let normal = model_matrix.transform_vector(&triangle.calculate_normal());
        let [a, b, c] = triangle.positions();
        let centroid = model_matrix.transform_point(&Point3::from((a.coords + b.coords + c.coords) / 3.0));
        let (character, color) = shade(&normal, &centroid, lights, style.color);

        self.rasterize_triangle(&screen_coords, character, color, style.opacity);
    }

    fn rasterize_triangle(
        &mut self,
        coords: &[(f32, f32, f32); 3],
        character: char,
        color: Rgb,
        opacity: f32,
    ) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    // Blend over whatever is already in the cell
                    self.color_buffer[idx] = self.color_buffer[idx].lerp(&color, opacity);
                }
            }
        }
    }

    /// Character and color at a cell; `None` when out of bounds
    pub fn cell(&self, x: usize, y: usize) -> Option<(char, Rgb)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        Some((self.char_buffer[idx], self.color_buffer[idx]))
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(to_terminal(self.background)))?;
        let mut current: Option<Rgb> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(to_terminal(color)))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Two-sided Lambert shading from the key light plus the accent light
fn shade(normal: &Vector3<f32>, centroid: &Point3<f32>, lights: &LightRig, base: Rgb) -> (char, Rgb) {
    let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);

    let key_dir = Vector3::from(lights.key.position).normalize();
    let key = normal.dot(&key_dir).abs() * lights.key.intensity;

    let accent_dir = (Point3::from(lights.accent.position) - centroid)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    let accent = normal.dot(&accent_dir).abs() * lights.accent.intensity;

    let ambient = lights.ambient.intensity;
    let lit = Rgb::new(
        base.r * (ambient * lights.ambient.color.r + key * lights.key.color.r)
            + accent * lights.accent.color.r * base.r,
        base.g * (ambient * lights.ambient.color.g + key * lights.key.color.g)
            + accent * lights.accent.color.g * base.g,
        base.b * (ambient * lights.ambient.color.b + key * lights.key.color.b)
            + accent * lights.accent.color.b * base.b,
    );

    // Skip the blank so every covered cell stays visible
    let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
    let index = 1 + (key.clamp(0.0, 1.0) * steps) as usize;
    let character = LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)];

    (character, lit)
}

fn to_terminal(color: Rgb) -> Color {
    let [r, g, b] = color.to_bytes();
    Color::Rgb { r, g, b }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

// ============================================================================
// RENDERING
// ============================================================================
//
// Retained mode: a `SceneSurface` records `DrawCommand`s for one frame, then
// `Scene::render` rasterizes them into the RGBA frame buffer owned by pixels.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::{debug, warn};

use crate::config::{Color, WheelStyle};
use crate::error::{Result, WheelError};
use crate::panel::Panel;
use crate::wheel::{normalize_angle, Slice, POINTER_ANGLE};

type Rgb = (u8, u8, u8);

// Logical-pixel layout constants.
const MIN_WHEEL_SIZE: f64 = 280.0;
const MAX_WHEEL_SIZE: f64 = 480.0;
const TOP_MARGIN: f64 = 28.0;
const PANEL_HEIGHT: f64 = 150.0;
const BUTTON_WIDTH: f64 = 180.0;
const BUTTON_HEIGHT: f64 = 44.0;

/// The drawing collaborator the spin loop talks to once per frame.
pub trait RenderSurface {
    /// Clear, then draw every slice with the wheel turned by `rotation`.
    /// `size_hint` is the logical wheel diameter, used to scale labels.
    fn clear_and_draw_slices(&mut self, slices: &[Slice], rotation: f64, size_hint: f64);
    fn highlight_center_cap(&mut self);
}

/// Label font size for a wheel of `size` logical pixels.
pub fn label_font_size(size: f64) -> f64 {
    (size * 0.055).clamp(16.0, 22.0).round()
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }
}

/// Where things go for a given frame buffer size, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    /// Logical wheel diameter.
    pub size: f64,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub button: Rect,
}

impl Layout {
    pub fn new(width: usize, height: usize, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let logical_w = width as f64 / scale;
        let logical_h = height as f64 / scale;
        let available = logical_w.min(logical_h - PANEL_HEIGHT - TOP_MARGIN);
        let size = available.clamp(MIN_WHEEL_SIZE, MAX_WHEEL_SIZE).round();

        let radius = size * scale / 2.0;
        let cx = width as f64 / 2.0;
        let cy = TOP_MARGIN * scale + radius;
        let button = Rect {
            x: cx - BUTTON_WIDTH * scale / 2.0,
            y: cy + radius + 18.0 * scale,
            w: BUTTON_WIDTH * scale,
            h: BUTTON_HEIGHT * scale,
        };
        Self {
            width,
            height,
            scale,
            size,
            cx,
            cy,
            radius,
            button,
        }
    }

    pub fn hits_button(&self, x: f64, y: f64) -> bool {
        self.button.contains(x, y)
    }

    pub fn hits_wheel(&self, x: f64, y: f64) -> bool {
        let (dx, dy) = (x - self.cx, y - self.cy);
        (dx * dx + dy * dy).sqrt() <= self.radius
    }
}

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgb),
    Disc {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Rgb,
        alpha: f32,
    },
    Wedges {
        cx: f64,
        cy: f64,
        radius: f64,
        rotation: f64,
        colors: Vec<Rgb>,
        alpha: f32,
    },
    Line {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        thickness: f32,
        color: Rgb,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font_size: f32,
        color: Rgb,
    },
    RadialText {
        cx: f64,
        cy: f64,
        angle: f64,
        distance: f64,
        text: String,
        font_size: f32,
        color: Rgb,
    },
    Pointer {
        tip_x: f64,
        tip_y: f64,
        half_width: f64,
        height: f64,
        color: Rgb,
    },
    Panel {
        rect: Rect,
        color: Rgb,
        alpha: f32,
    },
}

#[derive(Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text commands are skipped when no font could be loaded.
    pub fn render(&self, canvas: &mut Canvas, font: Option<&Font<'static>>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => canvas.clear(*color),
                DrawCommand::Disc {
                    cx,
                    cy,
                    radius,
                    color,
                    alpha,
                } => draw_disc(canvas, *cx, *cy, *radius, *color, *alpha),
                DrawCommand::Wedges {
                    cx,
                    cy,
                    radius,
                    rotation,
                    colors,
                    alpha,
                } => render_wedges_immediate(canvas, *cx, *cy, *radius, *rotation, colors, *alpha),
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    color,
                } => draw_thick_line_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color),
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(canvas, *x, *y, text, font, Scale::uniform(*font_size), *color);
                    }
                }
                DrawCommand::RadialText {
                    cx,
                    cy,
                    angle,
                    distance,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = font {
                        let (x, y) = (cx + angle.cos() * distance, cy + angle.sin() * distance);
                        draw_rotated_text(
                            canvas,
                            x,
                            y,
                            *angle,
                            text,
                            font,
                            Scale::uniform(*font_size),
                            *color,
                        );
                    }
                }
                DrawCommand::Pointer {
                    tip_x,
                    tip_y,
                    half_width,
                    height,
                    color,
                } => draw_pointer(canvas, *tip_x, *tip_y, *half_width, *height, *color),
                DrawCommand::Panel { rect, color, alpha } => fill_rect(canvas, rect, *color, *alpha),
            }
        }
    }
}

// ============================================================================
// SCENE SURFACE
// ============================================================================

/// Records one frame of the widget into a [`Scene`].
pub struct SceneSurface<'a> {
    scene: Scene,
    layout: Layout,
    style: &'a WheelStyle,
}

impl<'a> SceneSurface<'a> {
    pub fn new(layout: Layout, style: &'a WheelStyle) -> Self {
        Self {
            scene: Scene::new(),
            layout,
            style,
        }
    }

    /// Fixed marker at the top of the wheel, pointing at its center.
    pub fn draw_pointer(&mut self) {
        let l = &self.layout;
        let tip_distance = l.radius * 0.86;
        self.scene.add_command(DrawCommand::Pointer {
            tip_x: l.cx + POINTER_ANGLE.cos() * tip_distance,
            tip_y: l.cy + POINTER_ANGLE.sin() * tip_distance,
            half_width: 13.0 * l.scale,
            height: 30.0 * l.scale,
            color: self.style.pointer.as_tuple(),
        });
    }

    /// Trigger button, status line and result line.
    pub fn draw_panel(&mut self, panel: &Panel) {
        let l = self.layout;
        let scale = l.scale as f32;
        self.scene.add_command(DrawCommand::Panel {
            rect: l.button,
            color: self.style.button.as_tuple(),
            alpha: if panel.button_enabled { 1.0 } else { 0.35 },
        });
        let b = l.button;
        let (left, top, right, bottom) = (
            b.x.round() as i32,
            b.y.round() as i32,
            (b.x + b.w).round() as i32,
            (b.y + b.h).round() as i32,
        );
        for (x0, y0, x1, y1) in [
            (left, top, right, top),
            (left, bottom, right, bottom),
            (left, top, left, bottom),
            (right, top, right, bottom),
        ] {
            self.scene.add_command(DrawCommand::Line {
                x0,
                y0,
                x1,
                y1,
                thickness: 2.0 * scale,
                color: self.style.text.as_tuple(),
            });
        }
        self.scene.add_command(DrawCommand::Text {
            x: (b.x + b.w / 2.0) as i32,
            y: (b.y + b.h / 2.0) as i32,
            text: panel.button_label.to_string(),
            font_size: 20.0 * scale,
            color: self.style.button_text.as_tuple(),
        });

        let mut y = b.y + b.h + 26.0 * l.scale;
        if let Some(result) = &panel.result {
            self.scene.add_command(DrawCommand::Text {
                x: l.cx as i32,
                y: y as i32,
                text: result.clone(),
                font_size: 22.0 * scale,
                color: self.style.text.as_tuple(),
            });
            y += 30.0 * l.scale;
        }
        self.scene.add_command(DrawCommand::Text {
            x: l.cx as i32,
            y: y as i32,
            text: panel.status.to_string(),
            font_size: 15.0 * scale,
            color: self.style.muted_text.as_tuple(),
        });
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }
}

impl RenderSurface for SceneSurface<'_> {
    fn clear_and_draw_slices(&mut self, slices: &[Slice], rotation: f64, size_hint: f64) {
        let l = self.layout;
        let style = self.style;
        self.scene.add_command(DrawCommand::Clear(style.background.as_tuple()));
        if slices.is_empty() {
            return;
        }

        self.scene.add_command(DrawCommand::Disc {
            cx: l.cx,
            cy: l.cy,
            radius: l.radius - 2.0 * l.scale,
            color: (0xff, 0xff, 0xff),
            alpha: 0.03,
        });

        let wedge_radius = l.radius - 10.0 * l.scale;
        let colors = slices
            .iter()
            .map(|s| style.slice_color(s.color_index).as_tuple())
            .collect();
        self.scene.add_command(DrawCommand::Wedges {
            cx: l.cx,
            cy: l.cy,
            radius: wedge_radius,
            rotation,
            colors,
            alpha: 0.92,
        });

        let slice_angle = TAU / slices.len() as f64;
        let divider = style.divider_color();
        for i in 0..slices.len() {
            let angle = rotation + i as f64 * slice_angle;
            self.scene.add_command(DrawCommand::Line {
                x0: l.cx.round() as i32,
                y0: l.cy.round() as i32,
                x1: (l.cx + angle.cos() * wedge_radius).round() as i32,
                y1: (l.cy + angle.sin() * wedge_radius).round() as i32,
                thickness: 2.0 * l.scale as f32,
                color: divider,
            });
        }

        let font_size = (label_font_size(size_hint) * l.scale) as f32;
        for (i, slice) in slices.iter().enumerate() {
            self.scene.add_command(DrawCommand::RadialText {
                cx: l.cx,
                cy: l.cy,
                angle: rotation + (i as f64 + 0.5) * slice_angle,
                distance: l.radius * 0.52,
                text: slice.label.clone(),
                font_size,
                color: style.label.as_tuple(),
            });
        }
    }

    fn highlight_center_cap(&mut self) {
        let l = self.layout;
        self.scene.add_command(DrawCommand::Disc {
            cx: l.cx,
            cy: l.cy,
            radius: l.radius * 0.12,
            color: self.style.cap_outer.as_tuple(),
            alpha: 0.92,
        });
        self.scene.add_command(DrawCommand::Disc {
            cx: l.cx,
            cy: l.cy,
            radius: l.radius * 0.085,
            color: self.style.cap_inner.as_tuple(),
            alpha: 0.9,
        });
    }
}

// ============================================================================
// FONTS
// ============================================================================

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn read_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path).map_err(|e| WheelError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| WheelError::Font {
        path: path.to_path_buf(),
        reason: "not a TrueType/OpenType font".to_string(),
    })
}

/// An explicit path must load; otherwise the first readable system font is
/// used. `Ok(None)` means labels will not be drawn.
pub fn load_font(explicit: Option<&Path>) -> Result<Option<Font<'static>>> {
    if let Some(path) = explicit {
        return read_font(path).map(Some);
    }
    for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
        if let Ok(font) = read_font(&candidate) {
            debug!("using font {}", candidate.display());
            return Ok(Some(font));
        }
    }
    warn!("no usable system font found, labels will not be drawn");
    Ok(None)
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.0, color.1, color.2, 0xff]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        self.frame
            .get(idx..idx + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }
}

impl Color {
    /// This colour laid over `over` at `alpha`.
    pub fn as_tuple_alpha_blend(self, over: Rgb, alpha: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 * alpha + b as f32 * (1.0 - alpha)).round() as u8;
        (mix(self.r, over.0), mix(self.g, over.1), mix(self.b, over.2))
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn set_pixel(canvas: &mut Canvas, x: usize, y: usize, color: Rgb, alpha: f32) {
    if x < canvas.width && y < canvas.height {
        let idx = (y * canvas.width + x) * 4;
        let Some(dst) = canvas.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = alpha.clamp(0.0, 1.0);
        let blend = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        let out = [
            blend(color.0, dst[0]),
            blend(color.1, dst[1]),
            blend(color.2, dst[2]),
            0xff,
        ];
        dst.copy_from_slice(&out);
    }
}

fn pixel_bounds(canvas: &Canvas, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> (i32, i32, i32, i32) {
    (
        min_x.floor().max(0.0) as i32,
        min_y.floor().max(0.0) as i32,
        max_x.ceil().min(canvas.width as f64) as i32,
        max_y.ceil().min(canvas.height as f64) as i32,
    )
}

fn draw_disc(canvas: &mut Canvas, cx: f64, cy: f64, radius: f64, color: Rgb, alpha: f32) {
    let (x0, y0, x1, y1) =
        pixel_bounds(canvas, cx - radius - 1.0, cy - radius - 1.0, cx + radius + 1.0, cy + radius + 1.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if aa > 0.0 {
                set_pixel(canvas, x as usize, y as usize, color, alpha * aa as f32);
            }
        }
    }
}

/// Slice `i` spans `rotation + i·θ` to `rotation + (i+1)·θ`, the same
/// convention the landing math uses.
fn render_wedges_immediate(
    canvas: &mut Canvas,
    cx: f64,
    cy: f64,
    radius: f64,
    rotation: f64,
    colors: &[Rgb],
    alpha: f32,
) {
    if colors.is_empty() {
        return;
    }
    let slice_angle = TAU / colors.len() as f64;
    let (x0, y0, x1, y1) =
        pixel_bounds(canvas, cx - radius - 1.0, cy - radius - 1.0, cx + radius + 1.0, cy + radius + 1.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if aa <= 0.0 {
                continue;
            }
            let local = normalize_angle(dy.atan2(dx) - rotation);
            let index = ((local / slice_angle) as usize).min(colors.len() - 1);
            set_pixel(canvas, x as usize, y as usize, colors[index], alpha * aa as f32);
        }
    }
}

fn draw_thick_line_aa(canvas: &mut Canvas, x0: i32, y0: i32, x1: i32, y1: i32, thickness: f32, color: Rgb) {
    let pad = thickness.ceil() as i32 + 1;
    let (min_x, max_x) = (x0.min(x1) - pad, x0.max(x1) + pad);
    let (min_y, max_y) = (y0.min(y1) - pad, y0.max(y1) + pad);
    let dx = (x1 - x0) as f32;
    let dy = (y1 - y0) as f32;
    let len_sq = (dx * dx + dy * dy).max(f32::EPSILON);
    for y in min_y.max(0)..=max_y {
        for x in min_x.max(0)..=max_x {
            let px = x as f32 - x0 as f32;
            let py = y as f32 - y0 as f32;
            let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
            let lx = x0 as f32 + t * dx;
            let ly = y0 as f32 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                set_pixel(canvas, x as usize, y as usize, color, aa);
            }
        }
    }
}

fn fill_rect(canvas: &mut Canvas, rect: &Rect, color: Rgb, alpha: f32) {
    let (x0, y0, x1, y1) = pixel_bounds(canvas, rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
    for y in y0..y1 {
        for x in x0..x1 {
            set_pixel(canvas, x as usize, y as usize, color, alpha);
        }
    }
}

/// Downward triangle with its tip at `(tip_x, tip_y)`.
fn draw_pointer(canvas: &mut Canvas, tip_x: f64, tip_y: f64, half_width: f64, height: f64, color: Rgb) {
    let top = tip_y - height;
    let (x0, y0, x1, y1) = pixel_bounds(canvas, tip_x - half_width, top, tip_x + half_width, tip_y);
    for y in y0..y1 {
        for x in x0..x1 {
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;
            // Width shrinks linearly from the base to the tip.
            let reach = half_width * (tip_y - py) / height;
            let edge = reach - (px - tip_x).abs();
            let aa = (edge + 0.5).clamp(0.0, 1.0);
            if aa > 0.0 && py >= top {
                set_pixel(canvas, x as usize, y as usize, color, aa as f32);
            }
        }
    }
}

type Bounds = (i32, i32, i32, i32);

fn layout_glyphs(text: &str, font: &Font<'static>, scale: Scale) -> (Vec<PositionedGlyph<'static>>, Bounds) {
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, v_metrics.ascent)).collect();
    let bounds = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    (glyphs, bounds)
}

/// Horizontal text centered on `(x, y)`.
fn draw_text(canvas: &mut Canvas, x: i32, y: i32, text: &str, font: &Font<'static>, scale: Scale, color: Rgb) {
    let (glyphs, (min_x, max_x, min_y, max_y)) = layout_glyphs(text, font, scale);
    let width_px = if min_x < max_x { max_x - min_x } else { 0 };
    let height_px = if min_y < max_y { max_y - min_y } else { 0 };
    let offset_x = x - width_px / 2;
    let offset_y = y - height_px / 2;
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                if px >= 0 && py >= 0 {
                    set_pixel(canvas, px as usize, py as usize, color, v);
                }
            });
        }
    }
}

/// Text centered on `(center_x, center_y)`, its baseline turned to `rotation`.
#[allow(clippy::too_many_arguments)]
fn draw_rotated_text(
    canvas: &mut Canvas,
    center_x: f64,
    center_y: f64,
    rotation: f64,
    text: &str,
    font: &Font<'static>,
    scale: Scale,
    color: Rgb,
) {
    let (glyphs, (min_x, max_x, min_y, max_y)) = layout_glyphs(text, font, scale);
    if min_x >= max_x || min_y >= max_y {
        return;
    }
    let text_cx = (min_x + max_x) as f64 / 2.0;
    let text_cy = (min_y + max_y) as f64 / 2.0;
    let (sin_r, cos_r) = rotation.sin_cos();

    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                if v > 0.001 {
                    let local_x = gx as f64 + bb.min.x as f64 - text_cx;
                    let local_y = gy as f64 + bb.min.y as f64 - text_cy;
                    let x = center_x + local_x * cos_r - local_y * sin_r;
                    let y = center_y + local_x * sin_r + local_y * cos_r;
                    draw_antialiased_pixel(canvas, x, y, color, v);
                }
            });
        }
    }
}

fn draw_antialiased_pixel(canvas: &mut Canvas, x: f64, y: f64, color: Rgb, alpha: f32) {
    let x_floor = x.floor() as i32;
    let y_floor = y.floor() as i32;
    let x_frac = x - x_floor as f64;
    let y_frac = y - y_floor as f64;

    // Bilinear split across the four nearest pixels.
    let samples = [
        (x_floor, y_floor, (1.0 - x_frac) * (1.0 - y_frac)),
        (x_floor + 1, y_floor, x_frac * (1.0 - y_frac)),
        (x_floor, y_floor + 1, (1.0 - x_frac) * y_frac),
        (x_floor + 1, y_floor + 1, x_frac * y_frac),
    ];
    for (px, py, weight) in samples {
        let a = alpha * weight as f32;
        if px >= 0 && py >= 0 && a > 0.001 {
            set_pixel(canvas, px as usize, py as usize, color, a);
        }
    }
}

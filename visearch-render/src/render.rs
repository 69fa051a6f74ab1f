use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, bail};
use image::imageops::FilterType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::{
    Color, ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect,
    Stroke, Transform,
};
use tracing::{debug, warn};
use visearch_core::{IconPlacement, RingSlot, Screen, ShapeGeometry};
use visearch_timing::Timer;

/// Mid grey, as on the lab displays
pub const BACKGROUND: [u8; 4] = [153, 153, 153, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BADGE_RED: [u8; 4] = [255, 0, 0, 255];

/// Text heights in screen-height units
const INSTRUCTION_HEIGHT: f32 = 0.035;
const FEEDBACK_HEIGHT: f32 = 0.05;

const SHAPE_LINE_WIDTH: f32 = 3.0;
const BADGE_LINE_WIDTH: f32 = 2.0;

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(color(rgba));
    p.anti_alias = true;
    p
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_px: u32,
    color: [u8; 4],
}

/// Rasterises `text` into a tight, transparent pixmap. Lines are centred
/// on each other.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    rgba: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);
    let line_height = sf.height() + sf.line_gap();

    // 1) Layout, each line centred on x = 0
    let mut glyphs = Vec::<Glyph>::new();
    for (row, line) in text.lines().enumerate() {
        let baseline = sf.ascent() + row as f32 * line_height;
        let first = glyphs.len();
        let mut pen_x = 0.0f32;
        let mut prev = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += sf.kern(prev, id);
            }
            glyphs.push(Glyph {
                id,
                scale,
                position: point(pen_x, baseline),
            });
            pen_x += sf.h_advance(id);
            prev = Some(id);
        }
        for g in &mut glyphs[first..] {
            g.position.x -= pen_x / 2.0;
        }
    }

    // 2) Union pixel bounds from outlined glyphs
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }
    if min_x == f32::INFINITY {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    // 3) Rasterise with premultiplied alpha blending
    let stride = w as usize;
    let dst = pm.pixels_mut();
    for g in &glyphs {
        let Some(out) = font.outline_glyph(g.clone()) else {
            continue;
        };
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;
            let Some(bg) = dst.get(i).copied() else {
                return;
            };

            let a_lin = (cov * rgba[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let inv = 1.0 - (sa as f32 / 255.0);
            let over = |s: u8, d: u8| ((s as f32 * a_lin) as u8).saturating_add((d as f32 * inv) as u8);

            let r = over(rgba[0], bg.red());
            let gr = over(rgba[1], bg.green());
            let bl = over(rgba[2], bg.blue());
            let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), gr.min(a), bl.min(a), a) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Loads an icon from disk and scales it to `size_px` square.
pub fn load_icon_pixmap(path: &Path, size_px: u32) -> Result<Pixmap> {
    let img = image::open(path)
        .with_context(|| format!("opening icon {}", path.display()))?
        .into_rgba8();
    let scaled = image::imageops::resize(&img, size_px, size_px, FilterType::Triangle);
    let mut pm = Pixmap::new(size_px, size_px).context("icon size is zero")?;
    for (dst, src) in pm.pixels_mut().iter_mut().zip(scaled.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pm)
}

/// Timings of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTimings {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

pub struct SkiaRenderer {
    height: u32,
    center: (f32, f32),

    font: Option<FontVec>,
    text_cache: HashMap<TextKey, Arc<Pixmap>>,

    icons_dir: PathBuf,
    /// `None` marks an icon that failed to load, so it is reported once
    icon_cache: HashMap<(String, u32), Option<Arc<Pixmap>>>,

    canvas: Pixmap,
}

impl SkiaRenderer {
    pub fn new(
        width: u32,
        height: u32,
        font: Option<FontVec>,
        icons_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let canvas = Self::blank_canvas(width, height)?;
        Ok(Self {
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            font,
            text_cache: HashMap::new(),
            icons_dir: icons_dir.into(),
            icon_cache: HashMap::new(),
            canvas,
        })
    }

    fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
        let mut canvas = Pixmap::new(width.max(1), height.max(1))
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        canvas.fill(color(BACKGROUND));
        Ok(canvas)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Self::blank_canvas(width, height)?;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        debug!(width, height, "renderer resized");
        Ok(())
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Pixels per screen-height unit
    fn unit(&self) -> f32 {
        self.height as f32
    }

    /// Height units (origin at centre, y up) to canvas pixels
    fn to_px(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let u = self.unit();
        (self.center.0 + x * u, self.center.1 - y * u)
    }

    /// Draws `screen` and copies the result into `frame` (RGBA8).
    ///
    /// The timings are only measured; recording them is left to the caller.
    pub fn render_frame<T: Timer>(
        &mut self,
        screen: &Screen<'_>,
        frame: &mut [u8],
        timer: &T,
    ) -> Result<FrameTimings> {
        let t = timer.now();
        self.render_screen(screen);
        let draw = timer.elapsed(t);

        let t = timer.now();
        self.present(frame)?;
        let copy = timer.elapsed(t);

        Ok(FrameTimings {
            draw,
            copy,
            total: draw + copy,
        })
    }

    pub fn present(&self, frame: &mut [u8]) -> Result<()> {
        let data = self.canvas.data();
        if frame.len() != data.len() {
            bail!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame.len(),
                data.len()
            );
        }
        // the canvas is opaque, so premultiplied and straight RGBA agree
        frame.copy_from_slice(data);
        Ok(())
    }

    pub fn render_screen(&mut self, screen: &Screen<'_>) {
        self.canvas.fill(color(BACKGROUND));
        match screen {
            Screen::Blank => {}
            Screen::Instruction(text) => {
                self.draw_text(text, self.center, INSTRUCTION_HEIGHT, WHITE);
            }
            Screen::Fixation { size } => self.draw_fixation(*size),
            Screen::Stimulus(layout) => {
                for slot in &layout.slots {
                    self.draw_slot(slot);
                }
                if let Some(icon) = &layout.icon {
                    self.draw_icon(icon);
                }
                self.draw_fixation(layout.fixation_size);
            }
            Screen::Feedback(feedback) => {
                self.draw_text(
                    feedback.display_text(),
                    self.center,
                    FEEDBACK_HEIGHT,
                    feedback.rgba(),
                );
            }
        }
    }

    fn draw_fixation(&mut self, size: f32) {
        let len = size * self.unit();
        let thick = (len * 0.2).max(2.0);
        let (cx, cy) = self.center;

        let mut p = paint(WHITE);
        p.anti_alias = false;
        let bars = [
            Rect::from_xywh(cx - len / 2.0, cy - thick / 2.0, len, thick),
            Rect::from_xywh(cx - thick / 2.0, cy - len / 2.0, thick, len),
        ];
        for bar in bars.into_iter().flatten() {
            self.canvas.fill_rect(bar, &p, Transform::identity(), None);
        }
    }

    fn draw_slot(&mut self, slot: &RingSlot) {
        let (cx, cy) = self.to_px(slot.position);
        let u = self.unit();
        let mut pb = PathBuilder::new();
        match slot.shape.geometry(slot.size) {
            ShapeGeometry::Polygon(points) => {
                for (i, (x, y)) in points.iter().enumerate() {
                    let (px, py) = (cx + x * u, cy - y * u);
                    if i == 0 {
                        pb.move_to(px, py);
                    } else {
                        pb.line_to(px, py);
                    }
                }
                pb.close();
            }
            ShapeGeometry::Circle { radius } => pb.push_circle(cx, cy, radius * u),
            ShapeGeometry::Rect { width, height } => {
                let (w, h) = (width * u, height * u);
                if let Some(r) = Rect::from_xywh(cx - w / 2.0, cy - h / 2.0, w, h) {
                    pb.push_rect(r);
                }
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: SHAPE_LINE_WIDTH,
            ..Stroke::default()
        };
        self.canvas.stroke_path(
            &path,
            &paint(slot.color.rgba()),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn icon_pixmap(&mut self, file: &str, size_px: u32) -> Option<Arc<Pixmap>> {
        let key = (file.to_string(), size_px);
        if let Some(cached) = self.icon_cache.get(&key) {
            return cached.clone();
        }
        let path = self.icons_dir.join(file);
        let loaded = match load_icon_pixmap(&path, size_px) {
            Ok(pm) => Some(Arc::new(pm)),
            Err(e) => {
                warn!(error = format!("{e:#}"), "icon could not be drawn");
                None
            }
        };
        self.icon_cache.insert(key, loaded.clone());
        loaded
    }

    fn draw_icon(&mut self, icon: &IconPlacement) {
        let size_px = (icon.size * self.unit()).round().max(1.0) as u32;
        let Some(pm) = self.icon_pixmap(&icon.file, size_px) else {
            return;
        };
        let (px, py) = self.to_px(icon.position);
        let half = size_px as f32 / 2.0;
        self.canvas.draw_pixmap(
            (px - half).round() as i32,
            (py - half).round() as i32,
            Pixmap::as_ref(&pm),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        if icon.notification {
            self.draw_badge(icon);
        }
    }

    /// Red "1" bubble on the icon's upper-right corner
    fn draw_badge(&mut self, icon: &IconPlacement) {
        let radius = icon.size * 0.2;
        let offset = icon.size * 0.45;
        let pos = self.to_px((icon.position.0 + offset, icon.position.1 + offset));

        let mut pb = PathBuilder::new();
        pb.push_circle(pos.0, pos.1, radius * self.unit());
        let Some(circle) = pb.finish() else {
            return;
        };
        self.canvas.fill_path(
            &circle,
            &paint(BADGE_RED),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        let stroke = Stroke {
            width: BADGE_LINE_WIDTH,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&circle, &paint(WHITE), &stroke, Transform::identity(), None);

        self.draw_text("1", pos, radius * 1.2, WHITE);
    }

    /// Centres `text` on `pos`. Without a font this draws nothing.
    fn draw_text(&mut self, text: &str, pos: (f32, f32), height_units: f32, rgba: [u8; 4]) {
        let Some(font) = &self.font else {
            return;
        };
        let size_px = (height_units * self.unit()).round().max(1.0) as u32;
        let key = TextKey {
            text: text.to_string(),
            size_px,
            color: rgba,
        };
        let pm = match self.text_cache.get(&key) {
            Some(pm) => Arc::clone(pm),
            None => {
                let Some(pm) = render_text_pixmap(text, size_px as f32, font, rgba) else {
                    return;
                };
                let pm = Arc::new(pm);
                self.text_cache.insert(key, Arc::clone(&pm));
                pm
            }
        };

        let x = (pos.0 - pm.width() as f32 * 0.5).round() as i32;
        let y = (pos.1 - pm.height() as f32 * 0.5).round() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            Pixmap::as_ref(&pm),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

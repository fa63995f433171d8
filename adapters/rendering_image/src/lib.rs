#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! PNG export backend for Gridsly scenes.
//!
//! Rectangles and circles are rasterised with source-over blending. Text
//! shapes are not drawn; labels only appear in interactive hosts.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result as AnyResult};
use glam::Vec2;
use gridsly_rendering::{Color, Presentation, RenderingBackend, Shape, Stroke};
use image::{Rgba, RgbaImage};
use tracing::info;

/// File name used when no export path is configured.
pub const DEFAULT_EXPORT_FILE: &str = "Gridsly.png";

/// Largest canvas edge accepted by the rasteriser.
pub const MAX_CANVAS_EDGE: u32 = 16_384;

/// Rasterises a presentation into an RGBA image.
pub fn rasterize(presentation: &Presentation) -> AnyResult<RgbaImage> {
    let size = presentation.scene.size.ceil();
    if !(size.x >= 1.0 && size.y >= 1.0) {
        bail!("canvas is empty ({} x {})", size.x, size.y);
    }
    if size.x > MAX_CANVAS_EDGE as f32 || size.y > MAX_CANVAS_EDGE as f32 {
        bail!(
            "canvas {} x {} exceeds the {MAX_CANVAS_EDGE} pixel limit",
            size.x,
            size.y
        );
    }

    let mut canvas = RgbaImage::from_pixel(
        size.x as u32,
        size.y as u32,
        Rgba(presentation.clear_color.to_rgba_u8()),
    );
    for shape in &presentation.scene.shapes {
        match shape {
            Shape::Rect {
                origin,
                size,
                fill,
                stroke,
            } => {
                fill_rect(&mut canvas, *origin, *origin + *size, *fill);
                if let Some(stroke) = stroke {
                    stroke_rect(&mut canvas, *origin, *size, *stroke);
                }
            }
            Shape::Circle {
                center,
                radius,
                fill,
                stroke,
            } => draw_circle(&mut canvas, *center, *radius, *fill, *stroke),
            Shape::Text { .. } => {}
        }
    }
    Ok(canvas)
}

/// Backend writing each presented frame to a PNG file.
#[derive(Clone, Debug)]
pub struct PngExporter {
    path: PathBuf,
}

impl PngExporter {
    /// Creates an exporter targeting the provided file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for PngExporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_FILE)
    }
}

impl RenderingBackend for PngExporter {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        let canvas = rasterize(presentation)?;
        canvas
            .save_with_format(&self.path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            width = canvas.width(),
            height = canvas.height(),
            "exported grid image"
        );
        Ok(())
    }
}

fn pixel_span(start: f32, end: f32, limit: u32) -> std::ops::Range<u32> {
    let low = start.round().clamp(0.0, limit as f32) as u32;
    let high = end.round().clamp(0.0, limit as f32) as u32;
    low..high.max(low)
}

fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: Color) {
    let [red, green, blue, alpha] = color.to_rgba_u8();
    let pixel = canvas.get_pixel_mut(x, y);
    let source = f32::from(alpha) / 255.0;
    let mix = |top: u8, bottom: u8| {
        (f32::from(top) * source + f32::from(bottom) * (1.0 - source)).round() as u8
    };
    let covered = source + f32::from(pixel[3]) / 255.0 * (1.0 - source);
    *pixel = Rgba([
        mix(red, pixel[0]),
        mix(green, pixel[1]),
        mix(blue, pixel[2]),
        (covered * 255.0).round() as u8,
    ]);
}

fn fill_rect(canvas: &mut RgbaImage, low: Vec2, high: Vec2, color: Color) {
    let columns = pixel_span(low.x, high.x, canvas.width());
    for y in pixel_span(low.y, high.y, canvas.height()) {
        for x in columns.clone() {
            blend(canvas, x, y, color);
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, origin: Vec2, size: Vec2, stroke: Stroke) {
    let width = stroke.width.max(1.0).min(size.x.min(size.y) / 2.0);
    let far = origin + size;
    fill_rect(canvas, origin, Vec2::new(far.x, origin.y + width), stroke.color);
    fill_rect(canvas, Vec2::new(origin.x, far.y - width), far, stroke.color);
    fill_rect(
        canvas,
        Vec2::new(origin.x, origin.y + width),
        Vec2::new(origin.x + width, far.y - width),
        stroke.color,
    );
    fill_rect(
        canvas,
        Vec2::new(far.x - width, origin.y + width),
        Vec2::new(far.x, far.y - width),
        stroke.color,
    );
}

fn draw_circle(
    canvas: &mut RgbaImage,
    center: Vec2,
    radius: f32,
    fill: Color,
    stroke: Option<Stroke>,
) {
    let inner = stroke.map_or(radius, |stroke| (radius - stroke.width.max(1.0)).max(0.0));
    let columns = pixel_span(center.x - radius, center.x + radius, canvas.width());
    for y in pixel_span(center.y - radius, center.y + radius, canvas.height()) {
        for x in columns.clone() {
            let distance = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center).length();
            if distance > radius {
                continue;
            }
            match stroke {
                Some(stroke) if distance > inner => blend(canvas, x, y, stroke.color),
                _ => blend(canvas, x, y, fill),
            }
        }
    }
}

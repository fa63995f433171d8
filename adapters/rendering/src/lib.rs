#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gridsly adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridsly_core::{
    Coord, DoorFacing, EntityKind, GridRect, HexColor, LabelOrigin, LayerId, Point, PointId,
    PointKind,
};
use std::{error::Error, fmt};

/// Side length of one cell in pixels at zoom 1.
pub const CELL_SIZE: f32 = 64.0;

/// Empty cells drawn around the grid on every side.
pub const PADDING_CELLS: i32 = 6;

/// Column letters used by cell labels; columns past the end wrap around.
pub const LABEL_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZÆËĮØÛ";

const CONTRAST_THRESHOLD: f32 = 149.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a hex color.
    #[must_use]
    pub fn from_hex(color: &HexColor) -> Self {
        let (red, green, blue) = color.rgb();
        Self::from_rgb_u8(red, green, blue)
    }

    /// Byte RGBA representation of the color.
    #[must_use]
    pub fn to_rgba_u8(self) -> [u8; 4] {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            byte(self.red),
            byte(self.green),
            byte(self.blue),
            byte(self.alpha),
        ]
    }
}

/// Palette applied to grid content.
pub mod palette {
    use super::Color;

    /// Fill of space cells.
    pub const SPACE_FILL: Color = Color::from_rgb_u8(0xe2, 0xe8, 0xf0);
    /// Outline of space cells.
    pub const SPACE_STROKE: Color = Color::from_rgb_u8(0xcb, 0xd5, 0xe0);
    /// Fill of walls.
    pub const WALL: Color = Color::from_rgb_u8(0x71, 0x80, 0x96);
    /// Fill of obstacles.
    pub const OBSTACLE: Color = Color::from_rgb_u8(0xfa, 0xf0, 0x89);
    /// Fill of doors.
    pub const DOOR: Color = Color::from_rgb_u8(0x9c, 0x42, 0x21);
    /// Outline of the selected creature.
    pub const SELECTED: Color = Color::from_rgb_u8(0xf5, 0x65, 0x65);
    /// Fill of the rectangle preview.
    pub const PREVIEW_FILL: Color = Color::new(0.0, 0.0, 0.0, 0.25);
    /// Text of space cell labels.
    pub const LABEL: Color = Color::from_rgb_u8(0x2d, 0x37, 0x48);
    /// Outline of the rectangle preview.
    pub const PREVIEW_STROKE: Color = Color::from_rgb_u8(0x4a, 0x55, 0x68);
    /// Canvas background.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0xff, 0xff, 0xff);
    /// Dark text.
    pub const BLACK: Color = Color::from_rgb_u8(0x00, 0x00, 0x00);
    /// Light text.
    pub const WHITE: Color = Color::from_rgb_u8(0xff, 0xff, 0xff);
}

/// Text color readable on top of the provided background.
#[must_use]
pub fn contrast_color(background: &HexColor) -> Color {
    let (red, green, blue) = background.rgb();
    let luma = f32::from(red) * 0.299 + f32::from(green) * 0.587 + f32::from(blue) * 0.114;
    if luma > CONTRAST_THRESHOLD {
        palette::BLACK
    } else {
        palette::WHITE
    }
}

/// Label drawn on a space cell, such as `A0` or `C12`.
#[must_use]
pub fn cell_label(cell: Coord, origin: LabelOrigin) -> String {
    let column = i64::from(cell.x()) + i64::from(origin.x()).abs();
    let row = i64::from(cell.y()) + i64::from(origin.y()).abs();
    let letters: Vec<char> = LABEL_ALPHABET.chars().collect();
    let count = i64::try_from(letters.len()).unwrap_or(1);
    let index = usize::try_from(column.rem_euclid(count)).unwrap_or(0);
    format!("{}{row}", letters[index])
}

/// Smallest rectangle covering every point of the provided layers.
#[must_use]
pub fn grid_bounds<'a, I>(layers: I) -> Option<GridRect>
where
    I: IntoIterator<Item = (LayerId, &'a [Point])>,
{
    let mut corners: Option<(Coord, Coord)> = None;
    for (_, points) in layers {
        for point in points {
            let far = point.cell.offset(
                i32::try_from(point.width.saturating_sub(1)).unwrap_or(i32::MAX),
                i32::try_from(point.height.saturating_sub(1)).unwrap_or(i32::MAX),
            );
            corners = Some(match corners {
                None => (point.cell, far),
                Some((low, high)) => (
                    Coord::new(low.x().min(point.cell.x()), low.y().min(point.cell.y())),
                    Coord::new(high.x().max(far.x()), high.y().max(far.y())),
                ),
            });
        }
    }
    corners.map(|(low, high)| GridRect::from_corners(low, high))
}

/// Maps between canvas pixels and grid cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    cell_size: f32,
    zoom: f32,
    buffer: Vec2,
}

impl Viewport {
    /// Creates a viewport with the provided cell size, zoom and buffer offset.
    pub fn new(cell_size: f32, zoom: f32, buffer: Vec2) -> Result<Self, RenderingError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(RenderingError::InvalidZoom { zoom });
        }
        Ok(Self {
            cell_size,
            zoom,
            buffer,
        })
    }

    /// Creates a viewport whose canvas frames `bounds` with padding on every side.
    pub fn framing(bounds: GridRect, cell_size: f32, zoom: f32) -> Result<Self, RenderingError> {
        let viewport = Self::new(cell_size, zoom, Vec2::ZERO)?;
        let length = viewport.cell_length();
        let origin = bounds.origin();
        let buffer = Vec2::new(
            (PADDING_CELLS - origin.x()) as f32 * length,
            (PADDING_CELLS - origin.y()) as f32 * length,
        );
        Ok(Self { buffer, ..viewport })
    }

    /// Zoom factor applied to the cell size.
    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Pixel offset of cell (0, 0).
    #[must_use]
    pub const fn buffer(&self) -> Vec2 {
        self.buffer
    }

    /// On-screen side length of one cell.
    #[must_use]
    pub fn cell_length(&self) -> f32 {
        self.cell_size * self.zoom
    }

    /// Cell containing the provided canvas pixel.
    #[must_use]
    pub fn pixel_to_grid(&self, pixel: Vec2) -> Coord {
        let cell = ((pixel - self.buffer) / self.cell_length()).floor();
        Coord::new(cell.x as i32, cell.y as i32)
    }

    /// Canvas pixel of the upper-left corner of the cell.
    #[must_use]
    pub fn grid_to_pixel(&self, cell: Coord) -> Vec2 {
        self.buffer + Vec2::new(cell.x() as f32, cell.y() as f32) * self.cell_length()
    }

    /// Canvas size needed to show `bounds` with padding on every side.
    #[must_use]
    pub fn canvas_size(&self, bounds: GridRect) -> Vec2 {
        let padding = 2.0 * PADDING_CELLS as f32;
        Vec2::new(
            (bounds.width() as f32 + padding) * self.cell_length(),
            (bounds.height() as f32 + padding) * self.cell_length(),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            zoom: 0.5,
            buffer: Vec2::splat(PADDING_CELLS as f32 * CELL_SIZE),
        }
    }
}

/// Outline drawn around a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Outline color.
    pub color: Color,
    /// Outline thickness in pixels.
    pub width: f32,
}

/// Primitive drawn by rendering backends, in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect {
        /// Upper-left corner.
        origin: Vec2,
        /// Width and height.
        size: Vec2,
        /// Fill color.
        fill: Color,
        /// Optional outline.
        stroke: Option<Stroke>,
    },
    /// Circle.
    Circle {
        /// Center point.
        center: Vec2,
        /// Radius.
        radius: f32,
        /// Fill color.
        fill: Color,
        /// Optional outline.
        stroke: Option<Stroke>,
    },
    /// Horizontally centred text.
    Text {
        /// Upper-left corner of the text box.
        origin: Vec2,
        /// Width of the text box.
        width: f32,
        /// Font size in pixels.
        font_size: f32,
        /// Text content.
        text: String,
        /// Text color.
        color: Color,
    },
}

/// Layer contents and editor state needed to compose a scene.
#[derive(Clone, Debug)]
pub struct SceneInput<'a> {
    /// Points of each layer in render order.
    pub layers: Vec<(LayerId, &'a [Point])>,
    /// Creature highlighted as selected.
    pub selected: Option<PointId>,
    /// Origin used to label space cells.
    pub label_origin: LabelOrigin,
}

/// Frame description consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Canvas size in pixels.
    pub size: Vec2,
    /// Shapes in drawing order.
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Converts every layer's points into shapes, bottom layer first.
    #[must_use]
    pub fn compose(input: &SceneInput<'_>, viewport: &Viewport, size: Vec2) -> Self {
        let mut shapes = Vec::new();
        for (_, points) in &input.layers {
            for point in *points {
                push_point_shapes(point, input, viewport, &mut shapes);
            }
        }
        Self { size, shapes }
    }
}

fn push_point_shapes(
    point: &Point,
    input: &SceneInput<'_>,
    viewport: &Viewport,
    shapes: &mut Vec<Shape>,
) {
    let length = viewport.cell_length();
    let origin = viewport.grid_to_pixel(point.cell);
    let size = Vec2::new(point.width as f32, point.height as f32) * length;
    let rect = |fill, stroke| Shape::Rect {
        origin,
        size,
        fill,
        stroke,
    };

    match point.kind {
        PointKind::Space => {
            shapes.push(rect(
                palette::SPACE_FILL,
                Some(Stroke {
                    color: palette::SPACE_STROKE,
                    width: 1.0,
                }),
            ));
            shapes.push(Shape::Text {
                origin: Vec2::new(origin.x, origin.y + length / 2.0 - length / 8.0),
                width: size.x,
                font_size: length / 4.0,
                text: cell_label(point.cell, input.label_origin),
                color: palette::LABEL,
            });
        }
        PointKind::Wall => shapes.push(rect(palette::WALL, None)),
        PointKind::Obstacle => shapes.push(rect(palette::OBSTACLE, None)),
        PointKind::Door => {
            let (strip_origin, strip_size) = door_strip(origin, size, point.facing.unwrap_or_default());
            shapes.push(Shape::Rect {
                origin: strip_origin,
                size: strip_size,
                fill: palette::DOOR,
                stroke: None,
            });
        }
        PointKind::Player | PointKind::Npc => {
            let Some(entity) = point.entity.as_ref() else {
                return;
            };
            let fill = Color::from_hex(&entity.color);
            let accent = contrast_color(&entity.color);
            let selected = input.selected == Some(point.id);
            let highlight = Stroke {
                color: palette::SELECTED,
                width: 4.0 * viewport.zoom(),
            };
            match entity.kind {
                EntityKind::Player => shapes.push(Shape::Circle {
                    center: origin + size / 2.0,
                    radius: size.x / 2.0,
                    fill,
                    stroke: Some(if selected {
                        highlight
                    } else {
                        Stroke {
                            color: accent,
                            width: 1.0,
                        }
                    }),
                }),
                EntityKind::Npc => shapes.push(rect(fill, selected.then_some(highlight))),
            }
            shapes.push(Shape::Text {
                origin: Vec2::new(origin.x, origin.y + size.x / 2.0 - size.y / 4.0),
                width: size.x,
                font_size: size.x / 1.8,
                text: entity.symbol.to_string(),
                color: accent,
            });
        }
        PointKind::MouseSelect => shapes.push(rect(
            palette::PREVIEW_FILL,
            Some(Stroke {
                color: palette::PREVIEW_STROKE,
                width: 1.0,
            }),
        )),
    }
}

fn door_strip(origin: Vec2, size: Vec2, facing: DoorFacing) -> (Vec2, Vec2) {
    match facing {
        DoorFacing::Left => (origin, Vec2::new(size.x / 4.0, size.y)),
        DoorFacing::Right => (
            Vec2::new(origin.x + size.x * 0.75, origin.y),
            Vec2::new(size.x / 4.0, size.y),
        ),
        DoorFacing::Top => (origin, Vec2::new(size.x, size.y / 4.0)),
        DoorFacing::Bottom => (
            Vec2::new(origin.x, origin.y + size.y * 0.75),
            Vec2::new(size.x, size.y / 4.0),
        ),
    }
}

/// Scene handed to a backend together with frame-level settings.
#[derive(Clone, Debug)]
pub struct Presentation {
    /// Color used to clear the canvas.
    pub clear_color: Color,
    /// Scene to draw.
    pub scene: Scene,
}

impl Presentation {
    /// Creates a presentation on the default background.
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        Self {
            clear_color: palette::BACKGROUND,
            scene,
        }
    }
}

/// Rendering backend capable of presenting a composed scene.
pub trait RenderingBackend {
    /// Draws the presentation to the backend's target.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Errors that can occur when configuring rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderingError {
    /// Cell size must be positive and finite.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// Zoom must be positive and finite.
    InvalidZoom {
        /// Provided zoom that failed validation.
        zoom: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be positive (received {cell_size})")
            }
            Self::InvalidZoom { zoom } => {
                write!(f, "zoom must be positive (received {zoom})")
            }
        }
    }
}

impl Error for RenderingError {}

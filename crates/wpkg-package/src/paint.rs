//! Drawing primitives shared by the lifecycle and renderers.
//!
//! The web engine that actually renders package content lives outside this
//! crate and is reached through [`Renderer`]. Paint output goes to a
//! [`Surface`]; [`SnapshotSurface`] is the in-memory implementation used for
//! snapshots.

use image::{Rgba, RgbaImage};

use crate::lifecycle::LoadTicket;
use crate::manifest::Size;

/// Integer rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `size`.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Center point, rounded towards the top-left.
    #[must_use]
    pub fn center(self) -> (i32, i32) {
        (
            self.x.saturating_add(half(self.width)),
            self.y.saturating_add(half(self.height)),
        )
    }

    /// Same size, moved so its center is `center`.
    #[must_use]
    pub fn centered_at(self, center: (i32, i32)) -> Self {
        Self {
            x: center.0.saturating_sub(half(self.width)),
            y: center.1.saturating_sub(half(self.height)),
            ..self
        }
    }

    /// Move the edges outwards (negative `left`/`top`, positive
    /// `right`/`bottom`) or inwards.
    #[must_use]
    pub fn adjusted(self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let grow = |len: u32, lo: i32, hi: i32| {
            let len = i64::from(len)
                .saturating_sub(i64::from(lo))
                .saturating_add(i64::from(hi));
            u32::try_from(len.max(0)).unwrap_or(u32::MAX)
        };
        Self {
            x: self.x.saturating_add(left),
            y: self.y.saturating_add(top),
            width: grow(self.width, left, right),
            height: grow(self.height, top, bottom),
        }
    }
}

fn half(len: u32) -> i32 {
    i32::try_from(len / 2).unwrap_or(i32::MAX)
}

/// Font request passed to [`Surface`] text operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    /// Family name.
    pub family: &'static str,
    /// Size in points.
    pub point_size: u32,
}

/// Target of paint operations.
pub trait Surface {
    /// Drawable area.
    fn size(&self) -> Size;

    /// Copy `image` with its top-left corner at (`x`, `y`).
    fn draw_image(&mut self, x: i32, y: i32, image: &RgbaImage);

    /// Fill a rectangle whose corners are rounded by `radius`.
    fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Rgba<u8>);

    /// Draw `text` centered in `area`.
    fn draw_text(&mut self, area: Rect, font: Font, color: Rgba<u8>, text: &str);

    /// Bounding box of `text` set in `font`.
    fn text_extent(&self, font: Font, text: &str) -> Size;
}

/// The external web-content engine.
pub trait Renderer {
    /// Start loading `url`. The engine reports completion back to the package
    /// together with `ticket`.
    fn load(&mut self, url: &str, ticket: LoadTicket);

    /// Paint the current page.
    fn paint(&self, surface: &mut dyn Surface);

    /// Run a script snippet in the page.
    fn evaluate_script(&mut self, script: &str);
}

/// Renderer that loads nothing and paints nothing.
///
/// Used when a package is opened for inspection only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn load(&mut self, _url: &str, _ticket: LoadTicket) {}

    fn paint(&self, _surface: &mut dyn Surface) {}

    fn evaluate_script(&mut self, _script: &str) {}
}

/// Text drawn on a [`SnapshotSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Area the text is centered in.
    pub area: Rect,
    /// Requested font.
    pub font: Font,
    /// Text color.
    pub color: Rgba<u8>,
    /// The text itself.
    pub text: String,
}

/// Surface backed by an RGBA bitmap, initially fully transparent.
///
/// Glyphs are not rasterized: text requests are kept as [`TextRun`]s and
/// measured with fixed per-character metrics.
#[derive(Debug, Clone)]
pub struct SnapshotSurface {
    image: RgbaImage,
    text_runs: Vec<TextRun>,
}

impl SnapshotSurface {
    /// Transparent surface of `size`.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
            text_runs: Vec::new(),
        }
    }

    /// Bitmap painted so far.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Text drawn so far.
    #[must_use]
    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }

    /// Consume the surface, keeping the bitmap.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Surface for SnapshotSurface {
    fn size(&self) -> Size {
        let (width, height) = self.image.dimensions();
        Size::new(width, height)
    }

    fn draw_image(&mut self, x: i32, y: i32, image: &RgbaImage) {
        image::imageops::replace(&mut self.image, image, i64::from(x), i64::from(y));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        let left = i64::from(rect.x);
        let top = i64::from(rect.y);
        let right = left.saturating_add(i64::from(rect.width));
        let bottom = top.saturating_add(i64::from(rect.height));
        let corners = Corners {
            left,
            top,
            right,
            bottom,
            radius: i64::from(radius),
        };

        for py in top.max(0)..bottom.min(i64::from(height)) {
            for px in left.max(0)..right.min(i64::from(width)) {
                if corners.cuts(px, py) {
                    continue;
                }
                let (Ok(x), Ok(y)) = (u32::try_from(px), u32::try_from(py)) else {
                    continue;
                };
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn draw_text(&mut self, area: Rect, font: Font, color: Rgba<u8>, text: &str) {
        self.text_runs.push(TextRun {
            area,
            font,
            color,
            text: text.to_owned(),
        });
    }

    fn text_extent(&self, font: Font, text: &str) -> Size {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let advance = font.point_size.saturating_mul(6) / 10;
        let line_height = font.point_size.saturating_mul(4) / 3;
        Size::new(chars.saturating_mul(advance), line_height)
    }
}

/// Exclusive bounds of a rounded rectangle.
struct Corners {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
    radius: i64,
}

impl Corners {
    /// Whether (`px`, `py`) falls outside the rounded corner arcs.
    fn cuts(&self, px: i64, py: i64) -> bool {
        if self.radius <= 0 {
            return false;
        }
        let clamp = |v: i64, lo: i64, hi: i64| v.max(lo).min(hi.max(lo));
        let cx = clamp(
            px,
            self.left.saturating_add(self.radius),
            self.right.saturating_sub(1).saturating_sub(self.radius),
        );
        let cy = clamp(
            py,
            self.top.saturating_add(self.radius),
            self.bottom.saturating_sub(1).saturating_sub(self.radius),
        );
        let dx = px.saturating_sub(cx);
        let dy = py.saturating_sub(cy);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
            > self.radius.saturating_mul(self.radius)
    }
}

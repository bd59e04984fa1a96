//! Load state, freeze overlay and snapshot capture for a package.

use std::fmt;
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PackageError, PackageResult};
use crate::manifest::Size;
use crate::paint::{Font, Rect, Renderer, SnapshotSurface, Surface};

/// Text shown while the package is not live.
pub const PLACEHOLDER_TEXT: &str = "Loading ...";

/// Font of the placeholder label.
pub const PLACEHOLDER_FONT: Font = Font {
    family: "Arial",
    point_size: 12,
};

/// Background of the placeholder label.
pub const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x5e, 0x5e, 0x5e, 0xff]);

/// Text color of the placeholder label.
pub const PLACEHOLDER_TEXT_COLOR: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

const PLACEHOLDER_RADIUS: u32 = 3;

/// Load state of the package content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderState {
    /// A load is in progress (or none finished yet).
    Loading,
    /// The last load succeeded.
    Live,
    /// The last load failed.
    Error,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Live => f.write_str("live"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Identifies one load request. Completions carrying an older ticket are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Generation number of the load.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Where a paint is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderContext {
    /// Interactive display.
    #[default]
    Screen,
    /// Off-screen rendering such as thumbnails or printing.
    NonScreen,
    /// PDF export.
    PdfExport,
}

impl RenderContext {
    fn is_export(self) -> bool {
        matches!(self, Self::NonScreen | Self::PdfExport)
    }
}

/// Paint-time state machine of one package.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: RenderState,
    generation: u64,
    frozen: bool,
    taking_snapshot: bool,
    snapshot: Option<RgbaImage>,
    size: Size,
}

impl Lifecycle {
    /// Fresh lifecycle in [`RenderState::Loading`].
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            state: RenderState::Loading,
            generation: 0,
            frozen: false,
            taking_snapshot: false,
            snapshot: None,
            size,
        }
    }

    /// Current load state.
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Whether paint shows the frozen snapshot.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the last load succeeded.
    #[must_use]
    pub fn has_loaded_successfully(&self) -> bool {
        self.state == RenderState::Live
    }

    /// Cached snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&RgbaImage> {
        self.snapshot.as_ref()
    }

    /// Replace the cached snapshot.
    pub fn set_snapshot(&mut self, snapshot: Option<RgbaImage>) {
        self.snapshot = snapshot;
    }

    /// Paint area.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the paint area used by later snapshots.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Start a new load, returning its ticket. The state resets to
    /// [`RenderState::Loading`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.state = RenderState::Loading;
        debug!(generation = self.generation, "load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Record the renderer's completion signal.
    ///
    /// Returns `false` and changes nothing when `ticket` belongs to a
    /// superseded load.
    pub fn complete_load(&mut self, ticket: LoadTicket, ok: bool) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale load completion"
            );
            return false;
        }
        self.state = if ok {
            RenderState::Live
        } else {
            RenderState::Error
        };
        debug!(generation = self.generation, state = %self.state, "load finished");
        true
    }

    /// Paint the package.
    ///
    /// Export contexts paint the stored snapshot (or nothing) while the
    /// package is not live. Otherwise: frozen snapshot, then live content
    /// (also while capturing a snapshot), then the loading placeholder,
    /// which is the same for [`RenderState::Loading`] and
    /// [`RenderState::Error`].
    pub fn paint(&self, renderer: &dyn Renderer, surface: &mut dyn Surface, context: RenderContext) {
        if context.is_export() && !self.has_loaded_successfully() {
            if let Some(snapshot) = &self.snapshot {
                surface.draw_image(0, 0, snapshot);
            }
            return;
        }

        if self.frozen {
            if let Some(snapshot) = &self.snapshot {
                surface.draw_image(0, 0, snapshot);
            }
        } else if self.taking_snapshot || self.has_loaded_successfully() {
            renderer.paint(surface);
        } else {
            paint_placeholder(surface);
        }
    }

    /// Capture the current paint output at the current size.
    ///
    /// The capture goes through [`Self::paint`] with its normal precedence:
    /// a frozen package captures its snapshot, anything else the live
    /// branch, so the placeholder never ends up in a snapshot.
    pub fn take_snapshot(&mut self, renderer: &dyn Renderer) -> RgbaImage {
        let mut surface = SnapshotSurface::new(self.size);
        self.taking_snapshot = true;
        self.paint(renderer, &mut surface, RenderContext::Screen);
        self.taking_snapshot = false;
        surface.into_image()
    }

    /// Capture a snapshot and show it instead of live content.
    pub fn freeze(&mut self, renderer: &dyn Renderer) {
        let snapshot = self.take_snapshot(renderer);
        self.snapshot = Some(snapshot);
        self.frozen = true;
        debug!(size = %self.size, "frozen");
    }

    /// Return to load-state driven painting. The snapshot is kept.
    pub fn unfreeze(&mut self) {
        self.frozen = false;
        debug!("unfrozen");
    }

    /// Write the snapshot as PNG.
    ///
    /// # Errors
    ///
    /// [`PackageError::NoSnapshot`] when nothing was captured,
    /// [`PackageError::Snapshot`] when encoding or writing fails.
    pub fn save_snapshot(&self, path: &Path) -> PackageResult<()> {
        let snapshot = self.snapshot.as_ref().ok_or(PackageError::NoSnapshot)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                warn!(path = %parent.display(), error = %e, "cannot create snapshot directory");
                PackageError::io(parent, e)
            })?;
        }
        snapshot
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| {
                warn!(path = %path.display(), error = %source, "cannot save snapshot");
                PackageError::Snapshot {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        info!(path = %path.display(), "saved snapshot");
        Ok(())
    }

    /// Replace the snapshot with a PNG read from `path`.
    ///
    /// # Errors
    ///
    /// [`PackageError::Snapshot`] when the file cannot be read or decoded.
    pub fn load_snapshot(&mut self, path: &Path) -> PackageResult<()> {
        let image = image::open(path).map_err(|source| {
            warn!(path = %path.display(), error = %source, "cannot load snapshot");
            PackageError::Snapshot {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.snapshot = Some(image.into_rgba8());
        debug!(path = %path.display(), "loaded snapshot");
        Ok(())
    }
}

/// Centered rounded label with [`PLACEHOLDER_TEXT`].
fn paint_placeholder(surface: &mut dyn Surface) {
    let bounds = Rect::from_size(surface.size());
    let extent = surface.text_extent(PLACEHOLDER_FONT, PLACEHOLDER_TEXT);
    let label = Rect::from_size(extent)
        .centered_at(bounds.center())
        .adjusted(-10, -5, 10, 5);

    surface.fill_rounded_rect(label, PLACEHOLDER_RADIUS, PLACEHOLDER_FILL);
    surface.draw_text(bounds, PLACEHOLDER_FONT, PLACEHOLDER_TEXT_COLOR, PLACEHOLDER_TEXT);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const CONTENT: Rgba<u8> = Rgba([10, 200, 30, 255]);

    /// Paints a solid color over the whole surface.
    #[derive(Default)]
    struct SolidRenderer {
        color: Cell<Option<Rgba<u8>>>,
    }

    impl SolidRenderer {
        fn painting(color: Rgba<u8>) -> Self {
            let renderer = Self::default();
            renderer.color.set(Some(color));
            renderer
        }
    }

    impl Renderer for SolidRenderer {
        fn load(&mut self, _url: &str, _ticket: LoadTicket) {}

        fn paint(&self, surface: &mut dyn Surface) {
            if let Some(color) = self.color.get() {
                let size = surface.size();
                surface.fill_rounded_rect(Rect::from_size(size), 0, color);
            }
        }

        fn evaluate_script(&mut self, _script: &str) {}
    }

    fn paint_to_image(
        lifecycle: &Lifecycle,
        renderer: &dyn Renderer,
        context: RenderContext,
    ) -> SnapshotSurface {
        let mut surface = SnapshotSurface::new(lifecycle.size());
        lifecycle.paint(renderer, &mut surface, context);
        surface
    }

    #[test]
    fn test_load_transitions() {
        let mut lc = Lifecycle::new(Size::DEFAULT);
        assert_eq!(lc.state(), RenderState::Loading);

        let ticket = lc.begin_load();
        assert!(lc.complete_load(ticket, true));
        assert_eq!(lc.state(), RenderState::Live);

        let ticket = lc.begin_load();
        assert_eq!(lc.state(), RenderState::Loading);
        assert!(lc.complete_load(ticket, false));
        assert_eq!(lc.state(), RenderState::Error);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut lc = Lifecycle::new(Size::DEFAULT);
        let old = lc.begin_load();
        let current = lc.begin_load();
        assert_ne!(old, current);

        assert!(!lc.complete_load(old, true));
        assert_eq!(lc.state(), RenderState::Loading);
        assert!(lc.complete_load(current, true));
        assert_eq!(lc.state(), RenderState::Live);
    }

    #[test]
    fn test_placeholder_while_loading_and_on_error() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(300, 150));

        let loading = paint_to_image(&lc, &renderer, RenderContext::Screen);
        assert_eq!(loading.text_runs()[0].text, PLACEHOLDER_TEXT);
        assert_eq!(*loading.image().get_pixel(150, 75), PLACEHOLDER_FILL);
        assert_eq!(loading.image().get_pixel(0, 0).0[3], 0);

        let ticket = lc.begin_load();
        lc.complete_load(ticket, false);
        let failed = paint_to_image(&lc, &renderer, RenderContext::Screen);
        assert_eq!(failed.image(), loading.image());
        assert_eq!(failed.text_runs(), loading.text_runs());
    }

    #[test]
    fn test_live_paints_renderer() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(8, 8));
        let ticket = lc.begin_load();
        lc.complete_load(ticket, true);

        let live = paint_to_image(&lc, &renderer, RenderContext::Screen);
        assert!(live.image().pixels().all(|p| *p == CONTENT));
        assert!(live.text_runs().is_empty());
    }

    #[test]
    fn test_snapshot_forces_live_branch() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(8, 8));

        let snapshot = lc.take_snapshot(&renderer);
        assert!(snapshot.pixels().all(|p| *p == CONTENT));
        assert_eq!(lc.state(), RenderState::Loading);
    }

    #[test]
    fn test_freeze_round_trip() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(8, 8));
        let ticket = lc.begin_load();
        lc.complete_load(ticket, true);

        lc.freeze(&renderer);
        assert!(lc.is_frozen());
        let captured = lc.snapshot().cloned().unwrap();

        renderer.color.set(Some(Rgba([0, 0, 0, 255])));
        let ticket = lc.begin_load();
        lc.complete_load(ticket, false);
        let frozen = paint_to_image(&lc, &renderer, RenderContext::Screen);
        assert_eq!(frozen.image(), &captured);

        lc.unfreeze();
        let after = paint_to_image(&lc, &renderer, RenderContext::Screen);
        assert_eq!(after.text_runs()[0].text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_snapshot_while_frozen_keeps_frozen_paint() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(4, 4));
        lc.freeze(&renderer);

        renderer.color.set(Some(Rgba([0, 0, 255, 255])));
        let snapshot = lc.take_snapshot(&renderer);
        assert!(snapshot.pixels().all(|p| *p == CONTENT));

        lc.freeze(&renderer);
        assert!(lc.snapshot().unwrap().pixels().all(|p| *p == CONTENT));

        lc.unfreeze();
        lc.freeze(&renderer);
        assert!(lc.snapshot().unwrap().pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn test_export_paints_snapshot_when_not_live() {
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(4, 4));

        let blank = paint_to_image(&lc, &renderer, RenderContext::PdfExport);
        assert!(blank.image().pixels().all(|p| p.0[3] == 0));
        assert!(blank.text_runs().is_empty());

        let stored = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        lc.set_snapshot(Some(stored.clone()));
        let exported = paint_to_image(&lc, &renderer, RenderContext::NonScreen);
        assert_eq!(exported.image(), &stored);

        let ticket = lc.begin_load();
        lc.complete_load(ticket, true);
        let live = paint_to_image(&lc, &renderer, RenderContext::PdfExport);
        assert!(live.image().pixels().all(|p| *p == CONTENT));
    }

    #[test]
    fn test_snapshot_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots").join("w.png");
        let renderer = SolidRenderer::painting(CONTENT);
        let mut lc = Lifecycle::new(Size::new(5, 3));

        assert!(matches!(
            lc.save_snapshot(&path),
            Err(PackageError::NoSnapshot)
        ));

        lc.freeze(&renderer);
        lc.save_snapshot(&path).unwrap();

        let mut other = Lifecycle::new(Size::new(5, 3));
        other.load_snapshot(&path).unwrap();
        assert_eq!(other.snapshot(), lc.snapshot());
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let mut lc = Lifecycle::new(Size::DEFAULT);
        assert!(matches!(
            lc.load_snapshot(Path::new("/nonexistent/snap.png")),
            Err(PackageError::Snapshot { .. })
        ));
    }
}

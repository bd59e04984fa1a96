//! An opened widget package.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::Platform;
use crate::context::PackageContext;
use crate::entry::{EntryUrl, package_root};
use crate::error::{PackageError, PackageResult};
use crate::icon::{IconSource, resolve_icon};
use crate::lifecycle::{Lifecycle, LoadTicket, RenderContext, RenderState};
use crate::manifest::{ManifestKind, ParsedManifest, Size, WidgetMetadata};
use crate::paint::{Renderer, Surface};
use crate::store::{DatastoreStore, PreferenceStore};

/// Script run when the package is removed from its document.
pub const REMOVE_HOOK: &str = "if(widget && widget.onremove) { widget.onremove();}";

/// Script run when the pointer enters the package.
pub const ENTER_HOOK: &str = "if(widget && widget.onenter) { widget.onenter();}";

/// Script run when the pointer leaves the package.
pub const LEAVE_HOOK: &str = "if(widget && widget.onleave) { widget.onleave();}";

/// A package opened from disk and bound to a renderer.
pub struct WidgetPackage {
    uuid: Uuid,
    source_url: String,
    base_path: PathBuf,
    manifest: ParsedManifest,
    entry: EntryUrl,
    size: Size,
    platform: Platform,
    preferences: PreferenceStore,
    datastore: DatastoreStore,
    lifecycle: Lifecycle,
    renderer: Box<dyn Renderer>,
    snapshot_path: Option<PathBuf>,
}

impl fmt::Debug for WidgetPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetPackage")
            .field("uuid", &self.uuid)
            .field("base_path", &self.base_path)
            .field("kind", &self.manifest.kind)
            .field("entry", &self.entry)
            .field("size", &self.size)
            .field("state", &self.lifecycle.state())
            .field("frozen", &self.lifecycle.is_frozen())
            .finish_non_exhaustive()
    }
}

impl WidgetPackage {
    /// Open the package at `url` and start loading its entry page.
    ///
    /// `url` may be a path, a `file://` URL, or point at a file inside the
    /// package directory.
    ///
    /// # Errors
    ///
    /// [`PackageError::InvalidUrl`] for non-local URLs,
    /// [`PackageError::NoManifest`] when the directory holds no manifest.
    pub fn open(
        url: &str,
        ctx: &PackageContext,
        renderer: Box<dyn Renderer>,
    ) -> PackageResult<Self> {
        let base_path = package_root(url)?;
        let kind = ManifestKind::detect(&base_path)
            .ok_or_else(|| PackageError::NoManifest(base_path.clone()))?;
        let manifest = kind.parse(&base_path, ctx.language());
        let entry = kind.resolve_entry(&base_path, &manifest);

        let mut preferences = PreferenceStore::default();
        preferences.set_sink(ctx.modified_sink());
        let mut datastore = DatastoreStore::default();
        datastore.set_sink(ctx.modified_sink());

        let size = manifest.nominal_size;
        let mut package = Self {
            uuid: Uuid::new_v4(),
            source_url: url.to_owned(),
            base_path,
            manifest,
            entry,
            size,
            platform: ctx.platform(),
            preferences,
            datastore,
            lifecycle: Lifecycle::new(size),
            renderer,
            snapshot_path: None,
        };

        info!(
            path = %package.base_path.display(),
            kind = %kind,
            name = %package.manifest.metadata.name,
            entry = %package.entry,
            "opened package"
        );
        package.reload();
        Ok(package)
    }

    /// Kind implied by a package URL's extension, `None` for anything else.
    #[must_use]
    pub fn kind_from_url(url: &str) -> Option<ManifestKind> {
        ManifestKind::from_url(url)
    }

    /// Ask the renderer to load the entry page again.
    pub fn reload(&mut self) -> LoadTicket {
        let ticket = self.lifecycle.begin_load();
        self.renderer.load(&self.entry.to_url_string(), ticket);
        ticket
    }

    /// Renderer completion callback. Stale tickets are ignored.
    pub fn on_load_finished(&mut self, ticket: LoadTicket, ok: bool) -> bool {
        let accepted = self.lifecycle.complete_load(ticket, ok);
        if accepted && !ok {
            warn!(entry = %self.entry, "package content failed to load");
        }
        accepted
    }

    /// Renderer callback fired when the page's script environment is reset.
    /// Injects the context's inline scripts.
    pub fn on_script_object_cleared(&mut self, ctx: &PackageContext) {
        let scripts = ctx.inline_scripts();
        debug!(count = scripts.len(), "injecting inline scripts");
        for script in scripts {
            self.renderer.evaluate_script(script);
        }
    }

    /// The package is being removed from its document.
    pub fn on_remove(&mut self) {
        self.renderer.evaluate_script(REMOVE_HOOK);
    }

    /// The pointer entered the package.
    pub fn on_enter(&mut self) {
        self.renderer.evaluate_script(ENTER_HOOK);
    }

    /// The pointer left the package.
    pub fn on_leave(&mut self) {
        self.renderer.evaluate_script(LEAVE_HOOK);
    }

    /// Item identity.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Replace the item identity.
    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = uuid;
    }

    /// URL the package was opened from.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Package directory.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Manifest dialect.
    #[must_use]
    pub fn kind(&self) -> ManifestKind {
        self.manifest.kind
    }

    /// Everything read from the manifest.
    #[must_use]
    pub fn manifest(&self) -> &ParsedManifest {
        &self.manifest
    }

    /// Identity metadata.
    #[must_use]
    pub fn metadata(&self) -> &WidgetMetadata {
        &self.manifest.metadata
    }

    /// Resolved entry page.
    #[must_use]
    pub fn entry(&self) -> &EntryUrl {
        &self.entry
    }

    /// Size requested by the manifest.
    #[must_use]
    pub fn nominal_size(&self) -> Size {
        self.manifest.nominal_size
    }

    /// Current size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Whether the host may resize the package.
    #[must_use]
    pub fn is_resizable(&self) -> bool {
        self.manifest.resizable
    }

    /// Whether the package may be frozen.
    #[must_use]
    pub fn is_freezable(&self) -> bool {
        self.manifest.freezable
    }

    /// Whether the package may be placed as content on this platform.
    #[must_use]
    pub fn can_be_content(&self) -> bool {
        self.manifest.capabilities.can_be_content(self.platform)
    }

    /// Whether the package may be used as a tool on this platform.
    #[must_use]
    pub fn can_be_tool(&self) -> bool {
        self.manifest.capabilities.can_be_tool(self.platform)
    }

    /// Icon shown for the package.
    #[must_use]
    pub fn icon(&self) -> IconSource {
        resolve_icon(&self.base_path)
    }

    /// Preferences.
    #[must_use]
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Preferences, mutable.
    pub fn preferences_mut(&mut self) -> &mut PreferenceStore {
        &mut self.preferences
    }

    /// Datastore.
    #[must_use]
    pub fn datastore(&self) -> &DatastoreStore {
        &self.datastore
    }

    /// Datastore, mutable.
    pub fn datastore_mut(&mut self) -> &mut DatastoreStore {
        &mut self.datastore
    }

    /// Load state.
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.lifecycle.state()
    }

    /// Whether the package paints its snapshot.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.lifecycle.is_frozen()
    }

    /// Cached snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&RgbaImage> {
        self.lifecycle.snapshot()
    }

    /// Resize the package. Later snapshots use the new size.
    pub fn resize(&mut self, size: Size) {
        debug!(from = %self.size, to = %size, "resizing package");
        self.size = size;
        self.lifecycle.resize(size);
    }

    /// Capture the current content and paint it from then on.
    pub fn freeze(&mut self) {
        self.lifecycle.freeze(self.renderer.as_ref());
    }

    /// Resume load-state driven painting.
    pub fn unfreeze(&mut self) {
        self.lifecycle.unfreeze();
    }

    /// Capture the current live content without freezing.
    pub fn take_snapshot(&mut self) -> RgbaImage {
        self.lifecycle.take_snapshot(self.renderer.as_ref())
    }

    /// Paint the package onto `surface`.
    pub fn paint(&self, surface: &mut dyn Surface, context: RenderContext) {
        self.lifecycle.paint(self.renderer.as_ref(), surface, context);
    }

    /// Where the host keeps this package's snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Assign the snapshot file location.
    pub fn set_snapshot_path(&mut self, path: impl Into<PathBuf>) {
        self.snapshot_path = Some(path.into());
    }

    /// Write the snapshot to the snapshot path.
    ///
    /// # Errors
    ///
    /// [`PackageError::NoSnapshot`] when no path was assigned or nothing
    /// was captured, otherwise the errors of [`Lifecycle::save_snapshot`].
    pub fn save_snapshot(&self) -> PackageResult<()> {
        let path = self.snapshot_path.as_deref().ok_or(PackageError::NoSnapshot)?;
        self.lifecycle.save_snapshot(path)
    }

    /// Read the snapshot from the snapshot path.
    ///
    /// # Errors
    ///
    /// [`PackageError::NoSnapshot`] when no path was assigned, otherwise
    /// the errors of [`Lifecycle::load_snapshot`].
    pub fn load_snapshot(&mut self) -> PackageResult<()> {
        let path = self.snapshot_path.clone().ok_or(PackageError::NoSnapshot)?;
        self.lifecycle.load_snapshot(&path)
    }

    /// Open a fresh copy of this package with the same identity, size and
    /// store contents.
    ///
    /// # Errors
    ///
    /// The errors of [`Self::open`], when the package no longer exists.
    pub fn duplicate(
        &self,
        ctx: &PackageContext,
        renderer: Box<dyn Renderer>,
    ) -> PackageResult<Self> {
        let mut copy = Self::open(&self.source_url, ctx, renderer)?;
        copy.uuid = self.uuid;
        copy.snapshot_path.clone_from(&self.snapshot_path);
        copy.resize(self.size);

        // Replayed entries are not edits; the sink is attached afterwards.
        copy.preferences.set_sink(None);
        copy.datastore.set_sink(None);
        for (key, value) in self.preferences.all() {
            copy.preferences.set(&key, &value);
        }
        for (key, value) in self.datastore.all() {
            copy.datastore.set(&key, &value);
        }
        copy.preferences.set_sink(ctx.modified_sink());
        copy.datastore.set_sink(ctx.modified_sink());
        debug!(uuid = %copy.uuid, "duplicated package");
        Ok(copy)
    }

    /// Delete the package directory and its snapshot file.
    ///
    /// # Errors
    ///
    /// [`PackageError::Io`] when an existing file or directory cannot be
    /// removed.
    pub fn clear_source(&self) -> PackageResult<()> {
        remove_if_present(&self.base_path, |p| std::fs::remove_dir_all(p))?;
        if let Some(snapshot) = &self.snapshot_path {
            remove_if_present(snapshot, |p| std::fs::remove_file(p))?;
        }
        info!(path = %self.base_path.display(), "cleared package source");
        Ok(())
    }
}

fn remove_if_present<F>(path: &Path, remove: F) -> PackageResult<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    match remove(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot delete");
            Err(PackageError::io(path, e))
        },
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::lifecycle::PLACEHOLDER_TEXT;
    use crate::paint::SnapshotSurface;
    use crate::store::tests::CountingSink;

    #[derive(Default)]
    struct Recorded {
        loads: Vec<(String, LoadTicket)>,
        scripts: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer(Rc<RefCell<Recorded>>);

    impl Renderer for RecordingRenderer {
        fn load(&mut self, url: &str, ticket: LoadTicket) {
            self.0.borrow_mut().loads.push((url.to_owned(), ticket));
        }

        fn paint(&self, _surface: &mut dyn Surface) {}

        fn evaluate_script(&mut self, script: &str) {
            self.0.borrow_mut().scripts.push(script.to_owned());
        }
    }

    fn w3c_package(dir: &Path) -> PathBuf {
        let pkg = dir.join("clock.wgt");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(
            pkg.join("config.xml"),
            r#"<widget xmlns="http://www.w3.org/ns/widgets" version="1.0" width="200" height="100">
                <name>Clock</name>
                <content src="clock.html"/>
            </widget>"#,
        )
        .unwrap();
        std::fs::write(pkg.join("clock.html"), "<p>tick</p>").unwrap();
        pkg
    }

    fn context() -> PackageContext {
        PackageContext::new("/nonexistent/templates")
            .with_language("en")
            .with_platform(Platform::Unix)
    }

    #[test]
    fn test_open_starts_loading_entry() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let renderer = RecordingRenderer::default();

        let pkg = WidgetPackage::open(
            pkg_dir.to_str().unwrap(),
            &context(),
            Box::new(renderer.clone()),
        )
        .unwrap();

        assert_eq!(pkg.kind(), ManifestKind::W3c);
        assert_eq!(pkg.metadata().name, "Clock");
        assert_eq!(pkg.size(), Size::new(200, 100));
        assert_eq!(pkg.state(), RenderState::Loading);
        assert!(pkg.can_be_content());
        assert!(pkg.can_be_tool());
        assert_eq!(pkg.icon(), IconSource::Default);

        let recorded = renderer.0.borrow();
        assert_eq!(recorded.loads.len(), 1);
        assert!(recorded.loads[0].0.ends_with("clock.wgt/clock.html"));
    }

    #[test]
    fn test_open_from_inner_file() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let inner = format!("file://{}", pkg_dir.join("clock.html").display());

        let pkg = WidgetPackage::open(&inner, &context(), Box::new(RecordingRenderer::default()))
            .unwrap();
        assert_eq!(pkg.base_path(), pkg_dir);
    }

    #[test]
    fn test_open_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let result = WidgetPackage::open(
            dir.path().to_str().unwrap(),
            &context(),
            Box::new(RecordingRenderer::default()),
        );
        assert!(matches!(result, Err(PackageError::NoManifest(_))));
    }

    #[test]
    fn test_load_completion_and_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let renderer = RecordingRenderer::default();
        let mut pkg =
            WidgetPackage::open(pkg_dir.to_str().unwrap(), &context(), Box::new(renderer.clone()))
                .unwrap();

        let mut surface = SnapshotSurface::new(pkg.size());
        pkg.paint(&mut surface, RenderContext::Screen);
        assert_eq!(surface.text_runs()[0].text, PLACEHOLDER_TEXT);

        let first = renderer.0.borrow().loads[0].1;
        let second = pkg.reload();
        assert!(!pkg.on_load_finished(first, true));
        assert!(pkg.on_load_finished(second, true));
        assert_eq!(pkg.state(), RenderState::Live);
    }

    #[test]
    fn test_script_hooks() {
        let scripts = tempfile::tempdir().unwrap();
        std::fs::write(scripts.path().join("api.js"), "var api = {};").unwrap();
        let ctx = context().with_scripts_dir(scripts.path());

        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let renderer = RecordingRenderer::default();
        let mut pkg =
            WidgetPackage::open(pkg_dir.to_str().unwrap(), &ctx, Box::new(renderer.clone()))
                .unwrap();

        pkg.on_script_object_cleared(&ctx);
        pkg.on_enter();
        pkg.on_leave();
        pkg.on_remove();

        assert_eq!(
            renderer.0.borrow().scripts,
            vec![
                "var api = {};".to_owned(),
                ENTER_HOOK.to_owned(),
                LEAVE_HOOK.to_owned(),
                REMOVE_HOOK.to_owned(),
            ]
        );
    }

    #[test]
    fn test_stores_notify_context_sink() {
        let sink = Arc::new(CountingSink::default());
        let ctx = context().with_modified_sink(sink.clone());
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let mut pkg = WidgetPackage::open(
            pkg_dir.to_str().unwrap(),
            &ctx,
            Box::new(RecordingRenderer::default()),
        )
        .unwrap();

        pkg.preferences_mut().set("theme", "dark");
        pkg.preferences_mut().set("theme", "dark");
        pkg.datastore_mut().set("count", "1");
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_duplicate_replays_state() {
        let ctx = context();
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let mut pkg = WidgetPackage::open(
            pkg_dir.to_str().unwrap(),
            &ctx,
            Box::new(RecordingRenderer::default()),
        )
        .unwrap();
        pkg.preferences_mut().set("theme", "dark");
        pkg.datastore_mut().set("count", "3");
        pkg.resize(Size::new(400, 300));

        let copy = pkg
            .duplicate(&ctx, Box::new(RecordingRenderer::default()))
            .unwrap();
        assert_eq!(copy.uuid(), pkg.uuid());
        assert_eq!(copy.size(), Size::new(400, 300));
        assert_eq!(copy.preferences().get("theme"), Some("dark"));
        assert_eq!(copy.datastore().get("count"), "3");
        assert_eq!(copy.state(), RenderState::Loading);
    }

    #[test]
    fn test_duplicate_does_not_notify_for_replayed_entries() {
        let sink = Arc::new(CountingSink::default());
        let ctx = context().with_modified_sink(sink.clone());
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let mut pkg = WidgetPackage::open(
            pkg_dir.to_str().unwrap(),
            &ctx,
            Box::new(RecordingRenderer::default()),
        )
        .unwrap();
        pkg.preferences_mut().set("theme", "dark");
        pkg.datastore_mut().set("count", "3");
        assert_eq!(sink.count(), 2);

        let mut copy = pkg
            .duplicate(&ctx, Box::new(RecordingRenderer::default()))
            .unwrap();
        assert_eq!(sink.count(), 2);
        assert_eq!(copy.preferences().get("theme"), Some("dark"));

        copy.datastore_mut().set("count", "4");
        assert_eq!(sink.count(), 3);
    }

    #[test]
    fn test_clear_source_removes_dir_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = w3c_package(dir.path());
        let mut pkg = WidgetPackage::open(
            pkg_dir.to_str().unwrap(),
            &context(),
            Box::new(RecordingRenderer::default()),
        )
        .unwrap();

        let snapshot = dir.path().join("snap").join("clock.png");
        pkg.set_snapshot_path(&snapshot);
        pkg.freeze();
        pkg.save_snapshot().unwrap();
        assert!(snapshot.exists());

        pkg.clear_source().unwrap();
        assert!(!pkg_dir.exists());
        assert!(!snapshot.exists());
        pkg.clear_source().unwrap();
    }

    #[test]
    fn test_kind_from_url() {
        assert_eq!(
            WidgetPackage::kind_from_url("/a/Stocks.wdgt"),
            Some(ManifestKind::Apple)
        );
        assert_eq!(WidgetPackage::kind_from_url("/a/movie.swf"), None);
    }
}

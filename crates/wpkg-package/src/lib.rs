//! wpkg Package - widget package manifests, wrapper synthesis and paint
//! lifecycle.
//!
//! This crate provides:
//! - Manifest parsing for W3C (`config.xml`) and Apple (`Info.plist`)
//!   packages, normalized into one metadata model
//! - Capability masks, localized text selection and entry point resolution
//! - Wrapper package synthesis from a template directory
//! - The load/freeze/snapshot state machine driving package painting
//! - Preference and datastore key-value stores
//!
//! # Example
//!
//! ```rust,no_run
//! use wpkg_package::{NullRenderer, PackageContext, WidgetPackage};
//!
//! # fn main() -> Result<(), wpkg_package::PackageError> {
//! let ctx = PackageContext::new("/usr/share/wpkg/etc").with_language("en");
//! let package = WidgetPackage::open("/home/me/Clock.wgt", &ctx, Box::new(NullRenderer))?;
//! println!("{} {}", package.metadata().name, package.size());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod capability;
pub mod discovery;
pub mod entry;
pub mod icon;
pub mod lifecycle;
pub mod locale;
pub mod manifest;
pub mod paint;
pub mod store;
pub mod synth;
pub mod template;
pub mod tree;

mod context;
mod error;
mod package;

pub use capability::{Capabilities, CapabilityMask, Platform};
pub use context::PackageContext;
pub use discovery::{DiscoveredPackage, discover_packages, load_packages_from_dir};
pub use entry::EntryUrl;
pub use error::{PackageError, PackageResult};
pub use icon::IconSource;
pub use lifecycle::{Lifecycle, LoadTicket, RenderContext, RenderState};
pub use manifest::{Dialect, ManifestKind, ParsedManifest, Size, WidgetMetadata, describe};
pub use package::{ENTER_HOOK, LEAVE_HOOK, REMOVE_HOOK, WidgetPackage};
pub use paint::{NullRenderer, Renderer, SnapshotSurface, Surface};
pub use store::{DatastoreStore, ModifiedSink, PreferenceStore};
pub use synth::{WrapRequest, WrapperSynthesizer, synthesize_from_markup};
pub use template::TemplateRegistry;

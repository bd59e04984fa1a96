//! Bridge from `wpkg_config::Config` to library and logging types.

use std::path::PathBuf;

use wpkg_config::{Config, WpkgHome};
use wpkg_package::PackageContext;
use wpkg_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};

/// Logging configuration described by the `[logging]` section.
///
/// Unknown format or rotation names fall back to compact output and daily
/// files. File logs go to `logging.dir`, else the home's `logs` directory.
#[must_use]
pub(crate) fn to_log_config(cfg: &Config, home: &WpkgHome) -> LogConfig {
    let logging = &cfg.logging;
    let format = logging.format.parse().unwrap_or(LogFormat::Compact);
    let target = match logging.target.to_ascii_lowercase().as_str() {
        "stdout" => LogTarget::Stdout,
        "file" => file_target(cfg.log_dir(home.root(), &home.logs_dir()), &logging.rotation),
        _ => LogTarget::Stderr,
    };
    logging.directives.iter().fold(
        LogConfig::new(logging.level.clone())
            .with_format(format)
            .with_target(target),
        |log, directive| log.with_directive(directive.clone()),
    )
}

/// Rolling file target in `dir`.
#[must_use]
pub(crate) fn file_target(dir: PathBuf, rotation: &str) -> LogTarget {
    LogTarget::File {
        dir,
        rotation: rotation.parse().unwrap_or(FileRotation::Daily),
    }
}

/// Template directory, relative paths resolved against the wpkg home.
#[must_use]
pub(crate) fn templates_dir(cfg: &Config, home: &WpkgHome) -> PathBuf {
    cfg.templates_dir(home.root())
}

/// Directory receiving synthesized wrappers.
#[must_use]
pub(crate) fn web_library_dir(cfg: &Config, home: &WpkgHome) -> PathBuf {
    cfg.web_library_dir(&home.library_dir())
}

/// Package context configured from `cfg`.
#[must_use]
pub(crate) fn build_context(cfg: &Config, home: &WpkgHome) -> PackageContext {
    let mut ctx = PackageContext::new(templates_dir(cfg, home))
        .with_language(cfg.locale.language.clone())
        .with_library_dir(web_library_dir(cfg, home));
    if let Some(scripts) = cfg.scripts_dir(home.root()) {
        ctx = ctx.with_scripts_dir(scripts);
    }
    ctx
}

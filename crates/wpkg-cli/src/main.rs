//! wpkg CLI - widget package toolkit
//!
//! Inspects W3C and Apple widget packages, lists package libraries and
//! builds wrapper packages around plugin content or HTML fragments.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wpkg_config::{Config, ResolvedConfig, WpkgHome};
use wpkg_package::Size;

mod commands;
mod config_bridge;
mod formatter;
mod theme;

use commands::wrap::WrapOptions;
use commands::{config, inspect, list, templates, wrap};
use formatter::OutputFormat;
use theme::Theme;

/// wpkg - widget package toolkit
#[derive(Parser)]
#[command(name = "wpkg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty (default) or json
    #[arg(long, global = true, default_value = "pretty")]
    format: String,

    /// Write logs to rolling files in this directory instead of stderr
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a package's "name version" label
    Describe {
        /// Package directory or file:// URL
        package: String,
    },

    /// Show a package's normalized manifest
    Inspect {
        /// Package directory, file inside it, or file:// URL
        package: String,
    },

    /// List packages in a library directory
    List {
        /// Library directory (defaults to the configured library)
        dir: Option<PathBuf>,
    },

    /// Wrap a plugin resource (e.g. a .swf file) into a package
    Wrap {
        /// Local path, file:// URL or remote URL of the resource
        resource: String,

        /// MIME type used to pick the template (default: from extension)
        #[arg(long)]
        mime: Option<String>,

        /// Width in pixels
        #[arg(long, default_value_t = Size::DEFAULT.width)]
        width: u32,

        /// Height in pixels
        #[arg(long, default_value_t = Size::DEFAULT.height)]
        height: u32,

        /// Package name (default: resource base name)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory (default: the web library directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Wrap an HTML fragment file into a package
    WrapHtml {
        /// File holding the markup
        file: PathBuf,

        /// Package name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Width in pixels
        #[arg(long, default_value_t = Size::DEFAULT.width)]
        width: u32,

        /// Height in pixels
        #[arg(long, default_value_t = Size::DEFAULT.height)]
        height: u32,

        /// Output directory (default: the web library directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List registered wrapper templates
    Templates,

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration (TOML, or JSON with --format json)
    Show {
        /// Only show one section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Show the configuration files and variables consulted
    Paths,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", Theme::error(&format!("{e:#}")));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let home = WpkgHome::resolve()?;
    let workspace_root = std::env::current_dir().ok();
    let resolved = Config::load(workspace_root.as_deref());

    // Set up logging from config, with --verbose and --log-dir overrides.
    let mut log_config = match &resolved {
        Ok(r) => config_bridge::to_log_config(&r.config, &home),
        Err(_) => wpkg_telemetry::LogConfig::new("warn"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Some(dir) = &cli.log_dir {
        let rotation = resolved
            .as_ref()
            .map_or("daily", |r| r.config.logging.rotation.as_str());
        log_config = log_config.with_target(config_bridge::file_target(dir.clone(), rotation));
    }
    if let Err(e) = wpkg_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let output_format = OutputFormat::parse(&cli.format);

    // Configuration errors only matter to commands that need the config.
    let command = match cli.command {
        Commands::Config { command } => {
            return handle_config(command, resolved?, &home, &cli.format);
        },
        other => other,
    };
    let cfg = match resolved {
        Ok(r) => r.config,
        Err(e) => {
            tracing::warn!(error = %e, "configuration invalid, using defaults");
            Config::default()
        },
    };
    let ctx = config_bridge::build_context(&cfg, &home);

    match command {
        Commands::Describe { package } => inspect::describe_package(&package, output_format),
        Commands::Inspect { package } => inspect::inspect_package(&package, &ctx, output_format),
        Commands::List { dir } => {
            let dirs = dir.map_or_else(|| library_dirs(&cfg, &home), |d| vec![d]);
            list::list_packages(&dirs, ctx.language(), output_format)
        },
        Commands::Wrap {
            resource,
            mime,
            width,
            height,
            name,
            out,
        } => {
            let options = WrapOptions {
                name,
                size: Size::new(width, height),
                out,
            };
            wrap::wrap_resource(&ctx, &resource, mime, options, output_format)
        },
        Commands::WrapHtml {
            file,
            name,
            width,
            height,
            out,
        } => {
            let options = WrapOptions {
                name,
                size: Size::new(width, height),
                out,
            };
            let default_out = config_bridge::web_library_dir(&cfg, &home);
            wrap::wrap_markup(&file, &default_out, options, output_format)
        },
        Commands::Templates => templates::list_templates(&ctx, output_format),
        Commands::Config { .. } => Ok(()),
    }
}

/// Library root and its web sub-directory, without duplicates.
fn library_dirs(cfg: &Config, home: &WpkgHome) -> Vec<PathBuf> {
    let root = if cfg.library.dir.is_empty() {
        home.library_dir()
    } else {
        PathBuf::from(&cfg.library.dir)
    };
    let web = config_bridge::web_library_dir(cfg, home);
    if web == root {
        vec![root]
    } else {
        vec![root, web]
    }
}

fn handle_config(
    command: ConfigCommands,
    resolved: ResolvedConfig,
    home: &WpkgHome,
    format: &str,
) -> Result<()> {
    match command {
        ConfigCommands::Show { section } => {
            config::show_config(&resolved, format, section.as_deref())
        },
        ConfigCommands::Paths => {
            config::show_paths(home);
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_wrap_defaults() {
        let cli = Cli::parse_from(["wpkg", "wrap", "movie.swf", "--name", "Movie"]);
        let Commands::Wrap {
            resource,
            width,
            height,
            name,
            ..
        } = cli.command
        else {
            panic!("expected wrap");
        };
        assert_eq!(resource, "movie.swf");
        assert_eq!((width, height), (300, 150));
        assert_eq!(name.as_deref(), Some("Movie"));
    }

    #[test]
    fn test_parse_global_log_dir() {
        let cli = Cli::parse_from(["wpkg", "templates", "--log-dir", "/tmp/wpkg-logs"]);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/wpkg-logs")));
        assert!(matches!(cli.command, Commands::Templates));

        let cli = Cli::parse_from(["wpkg", "list"]);
        assert!(cli.log_dir.is_none());
    }

    #[test]
    fn test_library_dirs_dedup() {
        let home = WpkgHome::from_path("/home/me/.wpkg");
        let mut cfg = Config::default();
        assert_eq!(
            library_dirs(&cfg, &home),
            vec![home.library_dir(), home.library_dir().join("Web")]
        );

        cfg.library.web_subdir = String::new();
        assert_eq!(library_dirs(&cfg, &home), vec![home.library_dir()]);
    }
}

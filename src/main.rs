//! Tokenlint CLI - design token linter for CSS custom properties

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokenlint::config::{load_config, TokenlintConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tokenlint")]
#[command(version)]
#[command(about = "Design token linter - tier hierarchy, reference cycles and theme overrides")]
#[command(long_about = r#"
Tokenlint reads CSS custom properties as design tokens and reports:
  • Reference cycles between tokens
  • Tier inversions (primitive → semantic → component)
  • Dangling var() references
  • Resolved values under every theme scope

Example usage:
  tokenlint check ./styles
  tokenlint resolve tokens.css --scope '[data-theme="dark"]'
  tokenlint tiers tokens.css
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./tokenlint.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputMode::Human, global = true)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint stylesheets for cycles, tier inversions and dangling references
    Check {
        /// Files or directories to lint
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Worker threads for per-file analysis (defaults to available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Treat all files as one token set
        #[arg(long)]
        combined: bool,

        /// Re-lint whenever a stylesheet changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Print resolved token values per scope
    Resolve {
        /// Files or directories to read
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Override scope selector to apply; repeat to compose scopes
        #[arg(short, long = "scope")]
        scopes: Vec<String>,

        /// Only show this token
        #[arg(short, long)]
        token: Option<String>,

        /// Treat all files as one token set
        #[arg(long)]
        combined: bool,
    },

    /// Print each token's tier and what decided it
    Tiers {
        /// Files or directories to read
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Treat all files as one token set
        #[arg(long)]
        combined: bool,
    },

    /// Write a default tokenlint.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a `{ command, ok, data }` envelope
pub fn emit_json(command: &str, ok: bool, data: serde_json::Value) -> anyhow::Result<()> {
    let envelope = serde_json::json!({
        "command": command,
        "ok": ok,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if !output_mode.is_human() {
        emit_json(command, true, data)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Some(path) = &cli.config {
        if !path.exists() && !matches!(cli.command, Commands::Init { .. }) {
            anyhow::bail!("config file not found: {}", path.display());
        }
    }

    let load = || -> anyhow::Result<TokenlintConfig> {
        Ok(load_config(cli.config.as_deref())?.unwrap_or_default())
    };

    let code = match &cli.command {
        Commands::Check {
            paths,
            jobs,
            combined,
            watch,
        } => {
            let ctx = commands::Context::new(load()?, cli.format);
            let jobs = jobs.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4));
            commands::run_check(&ctx, paths, jobs, *combined, *watch)?
        }
        Commands::Resolve {
            paths,
            scopes,
            token,
            combined,
        } => {
            let ctx = commands::Context::new(load()?, cli.format);
            commands::run_resolve(&ctx, paths, scopes, token.as_deref(), *combined)?
        }
        Commands::Tiers { paths, combined } => {
            let ctx = commands::Context::new(load()?, cli.format);
            commands::run_tiers(&ctx, paths, *combined)?
        }
        Commands::Init { force } => commands::run_init(cli.config.as_deref(), *force, cli.format)?,
        Commands::Version => commands::run_version(cli.format)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

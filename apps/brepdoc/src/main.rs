//! # brepdoc - B-Rep and Mesh Defect Doctor
//!
//! The main binary for the brepdoc defect engine.
//!
//! This application provides:
//! - CLI interface over the defect registry
//! - Mesh and topology checks of JSON snapshots
//! - Problem reports and fix plans, as text or JSON
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │           apps/brepdoc (THE BINARY)           │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │  Config (TOML) │   │
//! │   │   (clap)    │        │  + snapshots   │   │
//! │   └──────┬──────┘        └───────┬────────┘   │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │ brepdoc-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! brepdoc kinds --group mesh
//! brepdoc mesh -f part.mesh.json
//! brepdoc --config brepdoc.toml --json topology -f part.topology.json
//! brepdoc options
//! ```

use brepdoc::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. BREPDOC_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("BREPDOC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "brepdoc=debug,brepdoc_core=debug"
    } else {
        "brepdoc=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so `--json` output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the brepdoc startup banner.
fn print_banner() {
    println!(
        r#"
  brepdoc  :: B-Rep & Mesh Defect Doctor v{}

  Rank defects, plan repairs
"#,
        env!("CARGO_PKG_VERSION")
    );
}

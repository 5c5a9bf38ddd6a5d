//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dashgrid",
    version,
    about = "Inspect and edit persisted Dashgrid dashboard layouts",
    long_about = "Inspect and edit persisted Dashgrid dashboard layouts.\n\n\
                  Every command opens the same SQLite store the dashboard uses,\n\
                  applies its change through the layout components and prints\n\
                  the result as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the layout database (default: platform data dir).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Viewport width in pixels the dashboard is measured at.
    #[arg(long = "viewport", value_name = "PX", default_value_t = 1280, global = true)]
    pub viewport: u32,

    /// Log filter directive, e.g. `debug` or `dashgrid_ui=trace`.
    #[arg(long = "log-level", value_name = "FILTER", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the full dashboard state.
    Show,

    /// List the available breakpoint presets.
    Presets,

    /// Select a breakpoint preset. Clears the top and side layouts.
    Preset {
        /// Preset id, e.g. `wide` or `experimental`.
        id: String,
    },

    /// Select the navigation surface (horizontal, hover or sidebar).
    NavMode {
        mode: String,
    },

    /// Set the workspace sidebar width in columns.
    PaneWidth {
        columns: u32,
    },

    /// Resolve a navigation request and print the selection.
    Navigate {
        /// Main path, up to three levels.
        #[arg(value_name = "PATH", num_args = 0..=3)]
        path: Vec<String>,

        /// Select a utility icon instead of a main path.
        #[arg(long = "icon", value_name = "ID", conflicts_with = "path")]
        icon: Option<String>,

        /// Sub-item below the icon.
        #[arg(long = "sub", value_name = "NAME", requires = "icon")]
        sub: Option<String>,
    },

    /// Reset every layout and setting to defaults.
    Reset,
}

//! Command handlers.

use dashgrid_core::models::BREAKPOINT_PRESETS;
use dashgrid_core::{DashError, DashState};
use dashgrid_ui::{Dashboard, NavigationEvent, NavigationMode};
use serde_json::{json, Value};

use crate::cli::{Cli, Command};

/// Open the store and build the dashboard at the requested viewport.
fn open(cli: &Cli) -> Result<Dashboard, DashError> {
    let state = match &cli.data_dir {
        Some(dir) => DashState::with_data_dir(dir.clone())?,
        None => DashState::new()?,
    };
    let mut dashboard = Dashboard::new(state);
    dashboard.set_viewport_width(cli.viewport);
    Ok(dashboard)
}

/// Run a command and return the JSON document to print.
pub fn run(cli: &Cli) -> Result<Value, DashError> {
    match &cli.command {
        Command::Presets => Ok(serde_json::to_value(&BREAKPOINT_PRESETS[..])?),
        command => {
            let mut dashboard = open(cli)?;
            apply(&mut dashboard, command)
        }
    }
}

/// Human-readable failure report for stderr.
pub fn render_error(error: &DashError) -> String {
    let info = error.to_error_info();
    let mut text = format!("error: {}", info.message);
    if let Some(hint) = &info.hint {
        text.push_str(&format!("\n  hint: {hint}"));
    }
    if let Some(detail) = &info.technical_detail {
        tracing::debug!(error_type = %info.error_type, detail = %detail, "Command failed");
    }
    text
}

fn apply(dashboard: &mut Dashboard, command: &Command) -> Result<Value, DashError> {
    match command {
        Command::Show | Command::Presets => {}
        Command::Preset { id } => dashboard.select_preset(id)?,
        Command::NavMode { mode } => dashboard.set_navigation_mode(mode.parse::<NavigationMode>()?),
        Command::PaneWidth { columns } => {
            let pane = dashboard.workspace().pane();
            if !pane.set_left_width(*columns) {
                tracing::info!(columns, current = pane.left_width(), "Pane width unchanged");
            }
        }
        Command::Navigate { path, icon, sub } => {
            let event = match icon {
                Some(icon) => NavigationEvent::from_icon(icon, sub.as_deref()),
                None => NavigationEvent::Main { path: path.clone(), source: None },
            };
            let selection = dashboard.navigate(event)?;
            return Ok(serde_json::to_value(selection)?);
        }
        Command::Reset => {
            let summary = dashboard.reset_layout();
            return Ok(json!({ "reset": summary, "dashboard": dashboard.snapshot() }));
        }
    }
    Ok(serde_json::to_value(dashboard.snapshot())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run_in(dir: &TempDir, args: &[&str]) -> Result<Value, DashError> {
        let mut argv = vec!["dashgrid", "--data-dir", dir.path().to_str().unwrap()];
        argv.extend_from_slice(args);
        run(&Cli::parse_from(argv))
    }

    #[test]
    fn test_show_defaults() {
        let dir = TempDir::new().unwrap();
        let value = run_in(&dir, &["show"]).unwrap();
        assert_eq!(value["preset"], "default");
        assert_eq!(value["navigation_mode"], "horizontal");
        assert_eq!(value["activities_columns"], 8);
    }

    #[test]
    fn test_settings_persist_across_runs() {
        let dir = TempDir::new().unwrap();
        run_in(&dir, &["preset", "wide"]).unwrap();
        run_in(&dir, &["nav-mode", "sidebar"]).unwrap();
        run_in(&dir, &["pane-width", "6"]).unwrap();

        let value = run_in(&dir, &["show"]).unwrap();
        assert_eq!(value["preset"], "wide");
        assert_eq!(value["navigation_mode"], "sidebar");
        assert_eq!(value["sidebar_columns"], 6);
        assert_eq!(value["activities_columns"], 6);

        let value = run_in(&dir, &["reset"]).unwrap();
        assert_eq!(value["reset"]["reset_callbacks"], 3);
        assert_eq!(value["dashboard"]["preset"], "default");
    }

    #[test]
    fn test_invalid_arguments_are_errors() {
        let dir = TempDir::new().unwrap();
        assert!(run_in(&dir, &["preset", "huge"]).is_err());
        assert!(run_in(&dir, &["nav-mode", "floating"]).is_err());
        assert!(run_in(&dir, &["navigate", "Nowhere"]).is_err());
    }

    #[test]
    fn test_render_error_includes_hint() {
        let dir = TempDir::new().unwrap();
        let error = run_in(&dir, &["preset", "huge"]).unwrap_err();
        assert_eq!(
            render_error(&error),
            "error: Unknown breakpoint preset: huge\n  hint: Choose one of the registered preset ids"
        );

        let error = run_in(&dir, &["nav-mode", "floating"]).unwrap_err();
        assert!(!render_error(&error).contains("hint:"));
    }

    #[test]
    fn test_navigate_fills_default_child() {
        let dir = TempDir::new().unwrap();
        let value = run_in(&dir, &["navigate", "ChubbyPay"]).unwrap();
        assert_eq!(value["type"], "main");
        assert_eq!(value["path"], json!(["ChubbyPay", "Plans"]));
    }

    #[test]
    fn test_presets_lists_registry() {
        let dir = TempDir::new().unwrap();
        let value = run_in(&dir, &["presets"]).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(BREAKPOINT_PRESETS.len()));
        assert_eq!(value[0]["id"], "default");
    }
}

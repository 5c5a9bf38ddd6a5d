//! The dashboard shell.
//!
//! [`Dashboard`] owns every layout component, the navigation state and the
//! persisted shell settings (breakpoint preset and navigation mode). Hosts
//! feed it viewport widths and clock ticks and read back a [`DashboardSnapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashgrid_core::models::{find_preset, DEFAULT_PRESET_ID};
use dashgrid_core::services::blob;
use dashgrid_core::{get_breakpoint_preset, Breakpoint, BreakpointPreset, DashError, DashState, Layout, ResetFamily};

use crate::events::InteractionHooks;
use crate::layout::is_mobile;
use crate::layout::sizes::OVERLAY_BREAKPOINT;
use crate::metrics_bar::{create_metrics_config, MetricSize, MetricsBar, MetricsBarOptions};
use crate::navigation::{NavigationEvent, NavigationMode, NavigationSelection, Navigator, OverlaySidebar};
use crate::remeasure::{Remeasure, RemeasureScheduler};
use crate::workspace::{ResetSummary, WorkspaceLayout, WorkspaceReset};

const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const METRIC_CARDS: [&str; 4] = ["clients", "plans", "assets", "tasks"];

/// Shell-owned "a gesture is in progress" flags.
///
/// Hosts read these to disable text selection while dragging or resizing.
#[derive(Debug, Clone, Default)]
pub struct InteractionFlags {
    dragging: Arc<AtomicBool>,
    resizing: Arc<AtomicBool>,
}

impl InteractionFlags {
    /// Hooks that keep these flags current.
    pub fn hooks(&self) -> InteractionHooks {
        let dragging = Arc::clone(&self.dragging);
        let resizing = Arc::clone(&self.resizing);
        InteractionHooks::none()
            .set_dragging(move |value| dragging.store(value, Ordering::Relaxed))
            .set_resizing(move |value| resizing.store(value, Ordering::Relaxed))
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.load(Ordering::Relaxed)
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing.load(Ordering::Relaxed)
    }

    /// Either gesture is active.
    pub fn is_interacting(&self) -> bool {
        self.is_dragging() || self.is_resizing()
    }
}

/// Serializable view of the whole shell.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub storage_version: String,
    pub preset: String,
    pub navigation_mode: NavigationMode,
    pub navigation: NavigationSelection,
    pub viewport_width: u32,
    pub container_width: u32,
    pub mobile: bool,
    pub breakpoint: Breakpoint,
    pub top_layout: Layout,
    pub side_layout: Layout,
    pub sidebar_columns: u32,
    pub activities_columns: u32,
    pub workspace_height: u32,
}

/// The dashboard shell.
pub struct Dashboard {
    state: DashState,
    preset: &'static BreakpointPreset,
    navigation_mode: NavigationMode,
    navigator: Navigator,
    overlay: OverlaySidebar,
    flags: InteractionFlags,
    metrics: MetricsBar,
    workspace: WorkspaceLayout,
    remeasure: RemeasureScheduler,
    viewport_width: u32,
    mobile: bool,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("preset", &self.preset.id)
            .field("navigation_mode", &self.navigation_mode)
            .field("viewport_width", &self.viewport_width)
            .field("mobile", &self.mobile)
            .finish()
    }
}

impl Dashboard {
    /// Build the shell, restoring persisted settings and layouts.
    pub fn new(state: DashState) -> Self {
        let keys = state.keys();
        let preset = blob::read_scalar::<String>(state.storage().as_ref(), keys.breakpoint_preset.as_str())
            .map(|id| get_breakpoint_preset(&id))
            .unwrap_or_else(|| get_breakpoint_preset(DEFAULT_PRESET_ID));
        let navigation_mode =
            blob::read_scalar::<NavigationMode>(state.storage().as_ref(), keys.navigation_mode.as_str()).unwrap_or_default();

        let flags = InteractionFlags::default();
        let viewport_width = DEFAULT_VIEWPORT_WIDTH;
        let metrics = Self::build_metrics(&state, preset, viewport_width, &flags);
        let workspace = WorkspaceLayout::new(&state, flags.hooks());

        tracing::info!(preset = preset.id, navigation_mode = %navigation_mode, "Dashboard ready");
        Self {
            state,
            preset,
            navigation_mode,
            navigator: Navigator::default(),
            overlay: OverlaySidebar::new(viewport_width),
            flags,
            metrics,
            workspace,
            remeasure: RemeasureScheduler::default(),
            viewport_width,
            mobile: false,
        }
    }

    fn build_metrics(
        state: &DashState,
        preset: &BreakpointPreset,
        viewport_width: u32,
        flags: &InteractionFlags,
    ) -> MetricsBar {
        let options = MetricsBarOptions {
            storage_key: Some(state.keys().top_layouts.as_str().to_string()),
            breakpoints: preset.breakpoints,
            container_width: preset.container_sizing().resolve(viewport_width),
            ..Default::default()
        };
        let cards = create_metrics_config(METRIC_CARDS, MetricSize::Medium, false);
        MetricsBar::with_hooks(state, cards, options, flags.hooks())
    }

    fn rebuild_metrics(&mut self) {
        let mut metrics = Self::build_metrics(&self.state, self.preset, self.viewport_width, &self.flags);
        metrics.set_mobile(self.mobile);
        self.metrics = metrics;
    }

    // ========== Accessors ==========

    pub fn state(&self) -> &DashState {
        &self.state
    }

    pub fn metrics(&self) -> &MetricsBar {
        &self.metrics
    }

    pub fn workspace(&self) -> &WorkspaceLayout {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut WorkspaceLayout {
        &mut self.workspace
    }

    pub fn flags(&self) -> &InteractionFlags {
        &self.flags
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn overlay_sidebar(&self) -> &OverlaySidebar {
        &self.overlay
    }

    pub fn overlay_sidebar_mut(&mut self) -> &mut OverlaySidebar {
        &mut self.overlay
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    /// Container width for the current viewport and preset.
    pub fn container_width(&self) -> u32 {
        self.preset.container_sizing().resolve(self.viewport_width)
    }

    // ========== Settings ==========

    pub fn preset(&self) -> &'static BreakpointPreset {
        self.preset
    }

    /// Switch breakpoint preset.
    ///
    /// The top and side layouts were arranged for the old breakpoints, so
    /// both are deleted and their components return to defaults.
    pub fn select_preset(&mut self, id: &str) -> Result<(), DashError> {
        let preset = find_preset(id)?;
        let keys = self.state.keys().clone();
        let storage = self.state.storage();

        for key in [&keys.top_layouts, &keys.side_layouts] {
            if let Err(e) = storage.remove(key.as_str()) {
                tracing::warn!(storage_key = key.as_str(), error = %e, "Failed to clear layout for preset change");
            }
        }
        if let Err(e) = blob::write_scalar(storage.as_ref(), keys.breakpoint_preset.as_str(), &preset.id) {
            tracing::warn!(preset = preset.id, error = %e, "Failed to save breakpoint preset");
        }

        self.preset = preset;
        self.rebuild_metrics();
        self.state.registry().reset(ResetFamily::Sidebar, keys.side_layouts.as_str());

        tracing::info!(preset = preset.id, "Breakpoint preset changed");
        Ok(())
    }

    pub fn navigation_mode(&self) -> NavigationMode {
        self.navigation_mode
    }

    /// Switch navigation surface and persist the choice.
    pub fn set_navigation_mode(&mut self, mode: NavigationMode) {
        let key = self.state.keys().navigation_mode.as_str();
        if let Err(e) = blob::write_scalar(self.state.storage().as_ref(), key, &mode) {
            tracing::warn!(storage_key = key, error = %e, "Failed to save navigation mode");
        }
        self.navigation_mode = mode;
        tracing::debug!(navigation_mode = %mode, "Navigation mode changed");
    }

    /// Apply a navigation event from any surface.
    pub fn navigate(&mut self, event: NavigationEvent) -> Result<&NavigationSelection, DashError> {
        self.navigator.dispatch(event)
    }

    // ========== Viewport ==========

    /// Report a new viewport width.
    ///
    /// Recomputes mobile mode, dual-pane stacking, header overflow, overlay
    /// mode and every grid's breakpoint. Idempotent for an unchanged width.
    pub fn set_viewport_width(&mut self, viewport_width: u32) {
        self.viewport_width = viewport_width;
        let mobile = is_mobile(viewport_width);
        if mobile != self.mobile {
            self.mobile = mobile;
            self.metrics.set_mobile(mobile);
            self.workspace.set_mobile(mobile);
            tracing::debug!(viewport_width, mobile, "Mobile mode changed");
        }

        self.workspace.set_viewport_width(viewport_width);
        self.navigator.set_viewport_width(viewport_width);
        if self.overlay.is_overlay() != (viewport_width < OVERLAY_BREAKPOINT) {
            self.overlay.set_viewport_width(viewport_width);
        }

        let container_width = self.container_width();
        self.metrics.grid().remeasure(container_width);
        Remeasure::remeasure(&self.workspace, container_width);
    }

    /// Ask for a debounced remeasure after content changed size.
    pub fn request_remeasure(&mut self, now: Instant) {
        self.remeasure.request(now);
    }

    /// Run deferred work that is due. Returns whether anything ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        let container_width = self.container_width();
        let targets: [&dyn Remeasure; 2] = [self.metrics.grid(), &self.workspace];
        let remeasured = self.remeasure.poll(now, container_width, &targets);
        let closed = self.overlay.poll(now);
        remeasured || closed
    }

    // ========== Reset ==========

    /// Reset every layout and shell setting to defaults.
    pub fn reset_layout(&mut self) -> ResetSummary {
        let summary = WorkspaceReset::new(&self.state).reset();
        self.navigation_mode = NavigationMode::default();
        let default_preset = get_breakpoint_preset(DEFAULT_PRESET_ID);
        if self.preset.id != default_preset.id {
            self.preset = default_preset;
            self.rebuild_metrics();
        }
        summary
    }

    /// Everything a host or CLI needs to render the current state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            storage_version: self.state.keys().version.clone(),
            preset: self.preset.id.to_string(),
            navigation_mode: self.navigation_mode,
            navigation: self.navigator.selection().clone(),
            viewport_width: self.viewport_width,
            container_width: self.container_width(),
            mobile: self.mobile,
            breakpoint: self.metrics.grid().breakpoint(),
            top_layout: self.metrics.grid().current_layout(),
            side_layout: self.workspace.sidebar().layout(),
            sidebar_columns: self.workspace.pane().left_width(),
            activities_columns: self.workspace.activities_width(),
            workspace_height: self.workspace.pane().height(),
        }
    }
}

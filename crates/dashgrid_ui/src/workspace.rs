//! The sidebar/activities workspace and the aggregated layout reset.
//!
//! [`WorkspaceLayout`] puts the widget sidebar in the left pane of a dual
//! split and the activities feed in the right one. The sidebar's height
//! drives the split height, and the activities width is mirrored under its
//! own key. [`WorkspaceReset`] holds no layout state; it clears every known
//! key and asks the registry to reset whichever components are mounted.

use serde::Serialize;
use std::sync::Arc;

use dashgrid_core::models::layout_bottom;
use dashgrid_core::services::blob;
use dashgrid_core::{DashState, KeyValueStore, Layout, LayoutRegistry, ResetFamily, StorageKeys};

use crate::dual_pane::{DualPaneLayout, DualPaneOptions, DualPaneView, HandlePosition, StackOrder, WidthChangeHandler};
use crate::events::InteractionHooks;
use crate::layout::columns::{ACTIVITIES_DEFAULT, ACTIVITIES_MAX, ACTIVITIES_MIN, WORKSPACE_TOTAL};
use crate::remeasure::Remeasure;
use crate::sidebar_layout::{SidebarCallbacks, SidebarLayout, SidebarLayoutOptions, SidebarView, SidebarWidget};

const SIDEBAR_MIN_COLUMNS: u32 = 2;
const SIDEBAR_MAX_COLUMNS: u32 = 8;
const STACK_BREAKPOINT: u32 = 1200;

/// The widgets shown in the workspace sidebar, in default order.
pub fn workspace_widgets() -> Vec<SidebarWidget> {
    vec![
        SidebarWidget::new("recent-plans").title("Recent Plans").heights(7, 2, 10),
        SidebarWidget::new("tasks").title("Tasks").heights(6, 2, 8),
        SidebarWidget::new("events").title("Events").heights(6, 2, 8),
        SidebarWidget::new("workflows").title("Workflows").heights(6, 2, 8),
    ]
}

/// Load the persisted activities width, falling back to the default.
pub fn load_activities_width(storage: &dyn KeyValueStore, key: &str) -> u32 {
    match blob::read_scalar::<u32>(storage, key) {
        Some(width) if (ACTIVITIES_MIN..=ACTIVITIES_MAX).contains(&width) => width,
        Some(width) => {
            tracing::debug!(storage_key = key, width, "Ignoring out-of-range activities width");
            ACTIVITIES_DEFAULT
        }
        None => ACTIVITIES_DEFAULT,
    }
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceView {
    /// Sidebar and activities side by side (or stacked by the split).
    Desktop(DualPaneView),
    /// Activities first, then the sidebar in its collapsed form.
    Mobile { sidebar: SidebarView },
}

/// Sidebar plus activities, joined by a resizable split.
pub struct WorkspaceLayout {
    sidebar: SidebarLayout,
    pane: DualPaneLayout,
    mobile: bool,
    /// Mobile shows the sidebar collapsed until expanded.
    mobile_collapsed: bool,
}

impl std::fmt::Debug for WorkspaceLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceLayout")
            .field("activities_width", &self.activities_width())
            .field("height", &self.pane.height())
            .field("mobile", &self.mobile)
            .finish()
    }
}

impl WorkspaceLayout {
    /// Build the workspace, restoring persisted widths and widget layout.
    pub fn new(state: &DashState, hooks: InteractionHooks) -> Self {
        let keys = state.keys();
        let storage = Arc::clone(state.storage());
        let activities = load_activities_width(storage.as_ref(), keys.activities_columns.as_str());
        let widgets = workspace_widgets();
        let default_height: u32 = widgets.iter().map(|w| w.default_height).sum();

        let activities_key = keys.activities_columns.as_str().to_string();
        let on_width_change: WidthChangeHandler = Arc::new(move |_left, right| {
            if let Err(e) = blob::write_scalar(storage.as_ref(), &activities_key, &right) {
                tracing::warn!(storage_key = %activities_key, width = right, error = %e, "Failed to save activities width");
            }
        });

        let pane_options = DualPaneOptions {
            initial_left_width: WORKSPACE_TOTAL - activities,
            default_left_width: Some(WORKSPACE_TOTAL - ACTIVITIES_DEFAULT),
            min_left_width: SIDEBAR_MIN_COLUMNS,
            max_left_width: SIDEBAR_MAX_COLUMNS,
            total_columns: WORKSPACE_TOTAL,
            resizable: true,
            handle: HandlePosition::Right,
            stack_breakpoint: STACK_BREAKPOINT,
            stacked_on_tablet: false,
            stack_order: StackOrder::LeftFirst,
            default_height,
            storage_key: Some(keys.dual_pane.as_str().to_string()),
            ..Default::default()
        };
        let pane = DualPaneLayout::with_callbacks(state, pane_options, hooks.clone(), Some(on_width_change));

        let height_target = pane.clone();
        let callbacks = SidebarCallbacks {
            on_layout_change: Some(Arc::new(move |layout: &Layout| {
                let height = layout_bottom(layout).max(1);
                tracing::trace!(height, "Sidebar height changed");
                height_target.set_height(Some(height));
            })),
            ..Default::default()
        };
        let sidebar_options = SidebarLayoutOptions {
            width: 1,
            reorderable: true,
            resizable: true,
            storage_key: Some(keys.side_layouts.as_str().to_string()),
            ..Default::default()
        };
        let sidebar = SidebarLayout::new(state, widgets, sidebar_options, callbacks, hooks);
        pane.set_height(Some(sidebar.total_height()));

        tracing::debug!(activities, height = pane.height(), "Workspace created");
        Self { sidebar, pane, mobile: false, mobile_collapsed: true }
    }

    pub fn sidebar(&self) -> &SidebarLayout {
        &self.sidebar
    }

    pub fn pane(&self) -> &DualPaneLayout {
        &self.pane
    }

    /// Columns given to the activities feed.
    pub fn activities_width(&self) -> u32 {
        self.pane.right_width()
    }

    /// Enter or leave mobile mode.
    pub fn set_mobile(&mut self, mobile: bool) {
        self.mobile = mobile;
        self.sidebar.set_mobile(mobile);
        self.pane.set_mobile(mobile);
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    /// Report a viewport width to the split.
    pub fn set_viewport_width(&self, viewport_width: u32) {
        self.pane.set_viewport_width(viewport_width);
    }

    /// Expand or collapse the mobile sidebar.
    pub fn toggle_mobile_sidebar(&mut self) {
        self.mobile_collapsed = !self.mobile_collapsed;
    }

    /// Current render plan.
    pub fn view(&self) -> WorkspaceView {
        if self.mobile {
            let sidebar = if self.mobile_collapsed {
                SidebarView::Collapsed { widget_count: self.sidebar.widgets().len() }
            } else {
                SidebarView::Expanded(self.sidebar.layout())
            };
            WorkspaceView::Mobile { sidebar }
        } else {
            WorkspaceView::Desktop(self.pane.view())
        }
    }
}

impl Remeasure for WorkspaceLayout {
    fn remeasure(&self, container_width: u32) {
        self.sidebar.grid().remeasure(container_width);
        Remeasure::remeasure(&self.pane, container_width);
    }
}

/// Outcome of an aggregated reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    /// Keys that were present and removed.
    pub cleared_keys: Vec<String>,
    /// Registered callbacks that ran.
    pub reset_callbacks: usize,
    /// Expected callbacks with no mounted component.
    pub missing_callbacks: usize,
}

/// Resets every dashboard layout at once.
#[derive(Clone)]
pub struct WorkspaceReset {
    storage: Arc<dyn KeyValueStore>,
    registry: Arc<LayoutRegistry>,
    keys: StorageKeys,
}

impl std::fmt::Debug for WorkspaceReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceReset")
            .field("storage", &self.storage.name())
            .field("version", &self.keys.version)
            .finish()
    }
}

impl WorkspaceReset {
    pub fn new(state: &DashState) -> Self {
        Self {
            storage: Arc::clone(state.storage()),
            registry: Arc::clone(state.registry()),
            keys: state.keys().clone(),
        }
    }

    /// Clear every known key, then run each mounted component's reset.
    ///
    /// Never fails: storage errors are logged and skipped, and a component
    /// that is not mounted is simply not reset.
    pub fn reset(&self) -> ResetSummary {
        let mut summary = ResetSummary::default();

        for key in self.keys.all() {
            let key = key.as_str();
            match self.storage.contains(key) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!(storage_key = key, error = %e, "Failed to read key during reset");
                }
            }
            match self.storage.remove(key) {
                Ok(()) => summary.cleared_keys.push(key.to_string()),
                Err(e) => tracing::warn!(storage_key = key, error = %e, "Failed to clear key during reset"),
            }
        }

        let targets = [
            (ResetFamily::Grid, &self.keys.top_layouts),
            (ResetFamily::Sidebar, &self.keys.side_layouts),
            (ResetFamily::DualPane, &self.keys.dual_pane),
        ];
        for (family, key) in targets {
            if self.registry.reset(family, key.as_str()) {
                summary.reset_callbacks += 1;
            } else {
                tracing::trace!(?family, storage_key = key.as_str(), "No component mounted for reset");
                summary.missing_callbacks += 1;
            }
        }

        tracing::info!(
            cleared = summary.cleared_keys.len(),
            reset = summary.reset_callbacks,
            missing = summary.missing_callbacks,
            "Workspace layout reset"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics_bar::{create_metrics_config, MetricSize, MetricsBar, MetricsBarOptions};
    use crate::resizer::{Axis, GridMetrics};
    use dashgrid_core::ResizeHandle;

    fn metrics_bar(state: &DashState) -> MetricsBar {
        let options = MetricsBarOptions {
            storage_key: Some(state.keys().top_layouts.as_str().to_string()),
            ..Default::default()
        };
        MetricsBar::new(state, create_metrics_config(["a", "b", "c", "d"], MetricSize::Medium, false), options)
    }

    #[test]
    fn test_defaults() {
        let state = DashState::in_memory();
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        assert_eq!(workspace.activities_width(), 8);
        assert_eq!(workspace.pane().left_width(), 4);
        assert_eq!(workspace.pane().height(), 25);
    }

    #[test]
    fn test_restores_activities_width() {
        let state = DashState::in_memory();
        state.storage().set(state.keys().activities_columns.as_str(), "6").unwrap();
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        assert_eq!(workspace.activities_width(), 6);

        state.storage().set(state.keys().activities_columns.as_str(), "3").unwrap();
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        assert_eq!(workspace.activities_width(), 8);
    }

    #[test]
    fn test_width_change_mirrors_activities_key() {
        let state = DashState::in_memory();
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        assert!(workspace.pane().set_left_width(5));
        assert_eq!(workspace.activities_width(), 7);
        assert_eq!(state.storage().get(state.keys().activities_columns.as_str()).unwrap().as_deref(), Some("7"));
        assert_eq!(state.storage().get(state.keys().dual_pane.as_str()).unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_sidebar_resize_feeds_pane_height() {
        let state = DashState::in_memory();
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        let grid = workspace.sidebar().grid();

        assert!(grid.begin_resize("workflows", ResizeHandle::S));
        assert!(grid.resize_to(0.0, GridMetrics::new(1200, 1).cell_size(Axis::Vertical) * 2.0));
        grid.end_resize();
        assert_eq!(workspace.pane().height(), 21);
    }

    #[test]
    fn test_mobile_view_shows_collapsed_sidebar() {
        let state = DashState::in_memory();
        let mut workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        workspace.set_mobile(true);
        assert_eq!(workspace.view(), WorkspaceView::Mobile { sidebar: SidebarView::Collapsed { widget_count: 4 } });
        assert!(!workspace.sidebar().grid().begin_drag("tasks"));

        workspace.toggle_mobile_sidebar();
        assert!(matches!(workspace.view(), WorkspaceView::Mobile { sidebar: SidebarView::Expanded(_) }));
        workspace.set_mobile(false);
        assert!(matches!(workspace.view(), WorkspaceView::Desktop(DualPaneView::Split { .. })));
    }

    #[test]
    fn test_reset_with_missing_component_clears_every_key() {
        let state = DashState::in_memory();
        let keys = state.keys().clone();
        let _bar = metrics_bar(&state);
        let pane = DualPaneLayout::new(
            &state,
            DualPaneOptions { storage_key: Some(keys.dual_pane.as_str().to_string()), ..Default::default() },
        );
        assert!(pane.set_left_width(6));

        for key in [&keys.top_layouts, &keys.side_layouts, &keys.breakpoint_preset, &keys.navigation_mode] {
            state.storage().set(key.as_str(), "\"x\"").unwrap();
        }

        let summary = WorkspaceReset::new(&state).reset();
        assert_eq!(summary.reset_callbacks, 2);
        assert_eq!(summary.missing_callbacks, 1);
        assert_eq!(summary.cleared_keys.len(), 5);
        assert!(state.storage().keys().unwrap().is_empty());
        assert_eq!(pane.left_width(), 4);
    }

    #[test]
    fn test_full_workspace_reset() {
        let state = DashState::in_memory();
        let bar = metrics_bar(&state);
        let workspace = WorkspaceLayout::new(&state, InteractionHooks::none());
        workspace.pane().set_left_width(6);
        bar.grid().begin_drag("a");
        bar.grid().drag_to(3, 0);
        bar.grid().end_drag();

        let summary = WorkspaceReset::new(&state).reset();
        assert_eq!(summary.reset_callbacks, 3);
        assert_eq!(summary.missing_callbacks, 0);
        assert_eq!(workspace.activities_width(), 8);
        assert_eq!(workspace.pane().height(), 25);
        assert_eq!(bar.grid().current_layout()[0].x, 0);
        assert!(state.storage().keys().unwrap().is_empty());
    }
}

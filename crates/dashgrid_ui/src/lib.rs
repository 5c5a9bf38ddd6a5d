//! Headless dashboard components for Dashgrid.
//!
//! Components hold layout state and gesture logic only; a host renders them
//! from the returned views and feeds back pointer gestures, viewport widths
//! and clock ticks.

pub mod compaction;
pub mod dual_pane;
pub mod events;
pub mod grid_layout;
pub mod layout;
pub mod metrics_bar;
pub mod navigation;
pub mod remeasure;
pub mod resizer;
pub mod shell;
pub mod sidebar_layout;
pub mod timer;
pub mod workspace;

pub use compaction::CompactType;
pub use dual_pane::{DualPaneLayout, DualPaneOptions, DualPaneView, HandlePosition, StackOrder};
pub use events::{GridEvent, InteractionHooks};
pub use grid_layout::{GridLayout, GridLayoutOptions};
pub use metrics_bar::{create_metrics_config, MetricConfig, MetricSize, MetricsBar, MetricsBarOptions, MetricsView};
pub use navigation::{NavigationEvent, NavigationMode, NavigationSelection, NavigationTree, Navigator, OverlaySidebar};
pub use remeasure::{Remeasure, RemeasureScheduler};
pub use shell::{Dashboard, DashboardSnapshot, InteractionFlags};
pub use sidebar_layout::{SidebarLayout, SidebarLayoutOptions, SidebarView, SidebarWidget};
pub use workspace::{ResetSummary, WorkspaceLayout, WorkspaceReset, WorkspaceView};

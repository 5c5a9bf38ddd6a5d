//! A single row of metric cards on top of the grid engine.
//!
//! Cards get a baseline span of `12 / desktop_columns`, adjusted by size, and
//! are flowed horizontally in one row. Persistence, reset registration and
//! gesture forwarding all belong to the underlying [`GridLayout`].

use dashgrid_core::models::{Breakpoints, Columns, GRID_CONFIG};
use dashgrid_core::{Breakpoint, DashState, Layout, LayoutItem, LayoutSet};

use crate::compaction::CompactType;
use crate::events::InteractionHooks;
use crate::grid_layout::{GridLayout, GridLayoutOptions};

/// Card height in rows.
const CARD_HEIGHT: u32 = 2;
/// Columns in the desktop grid the spans are expressed in.
const DESKTOP_GRID_COLUMNS: u32 = 12;
const MIN_SPAN: u32 = 2;
const MAX_SPAN: u32 = 6;
/// Widest a card can be resized to unless its own span is wider.
const MAX_CARD_WIDTH: u32 = 4;

/// Relative card width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// What the bar does on narrow viewports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabletBehavior {
    /// Reflow through the grid with fewer columns.
    #[default]
    Grid,
    /// Bypass the grid and list cards by descending priority.
    Stack,
}

/// One metric card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricConfig {
    pub id: String,
    pub size: MetricSize,
    /// Explicit column span; overrides `size`.
    pub span: Option<u32>,
    /// Higher sorts first when stacked.
    pub priority: i32,
    /// Omitted from the stacked list.
    pub hide_on_tablet: bool,
}

impl MetricConfig {
    /// A medium card with priority 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), size: MetricSize::Medium, span: None, priority: 0, hide_on_tablet: false }
    }

    pub fn size(mut self, size: MetricSize) -> Self {
        self.size = size;
        self
    }

    pub fn span(mut self, span: u32) -> Self {
        self.span = Some(span);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn hide_on_tablet(mut self, hide: bool) -> Self {
        self.hide_on_tablet = hide;
        self
    }
}

/// Build uniformly sized cards whose priority falls with position.
pub fn create_metrics_config<I, S>(ids: I, size: MetricSize, hide_on_tablet: bool) -> Vec<MetricConfig>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
    let len = ids.len() as i32;
    ids.into_iter()
        .enumerate()
        .map(|(index, id)| MetricConfig::new(id).size(size).priority(len - index as i32).hide_on_tablet(hide_on_tablet))
        .collect()
}

/// Bar configuration.
#[derive(Debug, Clone)]
pub struct MetricsBarOptions {
    /// Cards per row on desktop.
    pub desktop_columns: u32,
    /// Cards per row on tablet.
    pub tablet_columns: u32,
    pub tablet_behavior: TabletBehavior,
    pub reorderable: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub storage_key: Option<String>,
    /// Pixel thresholds, usually from the selected preset.
    pub breakpoints: Breakpoints,
    pub container_width: u32,
}

impl Default for MetricsBarOptions {
    fn default() -> Self {
        Self {
            desktop_columns: 4,
            tablet_columns: 2,
            tablet_behavior: TabletBehavior::Grid,
            reorderable: true,
            draggable: true,
            resizable: false,
            storage_key: Some("metrics-layout".to_string()),
            breakpoints: GRID_CONFIG.breakpoints,
            container_width: GRID_CONFIG.breakpoints.lg,
        }
    }
}

/// Baseline span for a desktop column count.
pub fn baseline_span(desktop_columns: u32) -> u32 {
    DESKTOP_GRID_COLUMNS / desktop_columns.clamp(1, DESKTOP_GRID_COLUMNS)
}

/// Column span of one card.
pub fn metric_span(metric: &MetricConfig, desktop_columns: u32) -> u32 {
    let base = baseline_span(desktop_columns);
    if let Some(span) = metric.span {
        return span.max(1);
    }
    match metric.size {
        MetricSize::Small => base.saturating_sub(1).max(MIN_SPAN),
        MetricSize::Medium => base,
        MetricSize::Large => (base + 1).min(MAX_SPAN),
    }
}

/// Row-major default placement of the cards.
pub fn default_placement(metrics: &[MetricConfig], desktop_columns: u32) -> Layout {
    let per_row = desktop_columns.clamp(1, DESKTOP_GRID_COLUMNS);
    let base = baseline_span(desktop_columns);

    metrics
        .iter()
        .enumerate()
        .map(|(index, metric)| {
            let index = index as u32;
            let span = metric_span(metric, desktop_columns);
            LayoutItem::new(&metric.id, (index % per_row) * base, (index / per_row) * CARD_HEIGHT, span, CARD_HEIGHT)
                .with_min_size(MIN_SPAN.min(span), CARD_HEIGHT)
                .with_max_size(MAX_CARD_WIDTH.max(span), CARD_HEIGHT + 1)
        })
        .collect()
}

/// Grid column counts for the bar.
pub fn grid_columns(options: &MetricsBarOptions) -> Columns {
    let tablet = match options.tablet_behavior {
        TabletBehavior::Stack => 4,
        TabletBehavior::Grid => options.tablet_columns.max(1) * 3,
    };
    Columns::new(DESKTOP_GRID_COLUMNS, 10, tablet, 6, 4)
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsView {
    /// Cards placed by the grid.
    Grid(Layout),
    /// Card ids in display order, outside the grid.
    Stack(Vec<String>),
}

/// The metrics bar.
#[derive(Debug)]
pub struct MetricsBar {
    metrics: Vec<MetricConfig>,
    options: MetricsBarOptions,
    grid: GridLayout,
    mobile: bool,
}

impl MetricsBar {
    /// Create a bar without interaction hooks.
    pub fn new(state: &DashState, metrics: Vec<MetricConfig>, options: MetricsBarOptions) -> Self {
        Self::with_hooks(state, metrics, options, InteractionHooks::none())
    }

    /// Create a bar forwarding gestures to `hooks`.
    pub fn with_hooks(
        state: &DashState,
        metrics: Vec<MetricConfig>,
        options: MetricsBarOptions,
        hooks: InteractionHooks,
    ) -> Self {
        let placement = default_placement(&metrics, options.desktop_columns);
        let explicit: LayoutSet = Breakpoint::ALL.into_iter().map(|bp| (bp, placement.clone())).collect();
        let items: Vec<LayoutItem> = placement;

        let mut grid_options = GridLayoutOptions::default()
            .responsive(options.breakpoints, grid_columns(&options))
            .compact_type(CompactType::Horizontal)
            .max_rows(1)
            .interactive(options.draggable && options.reorderable, options.resizable)
            .container_width(options.container_width);
        grid_options.storage_key = options.storage_key.clone();

        let grid = GridLayout::with_callbacks(state, &items, Some(explicit), grid_options, hooks, None);

        tracing::debug!(cards = metrics.len(), desktop_columns = options.desktop_columns, "Metrics bar created");
        Self { metrics, options, grid, mobile: false }
    }

    /// The underlying grid.
    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    /// The configured cards.
    pub fn metrics(&self) -> &[MetricConfig] {
        &self.metrics
    }

    /// Enter or leave mobile mode.
    pub fn set_mobile(&mut self, mobile: bool) {
        self.mobile = mobile;
        self.grid.set_interactive(!mobile);
    }

    /// Current render plan.
    pub fn view(&self) -> MetricsView {
        if self.mobile && self.options.tablet_behavior == TabletBehavior::Stack {
            let mut visible: Vec<&MetricConfig> = self.metrics.iter().filter(|m| !m.hide_on_tablet).collect();
            visible.sort_by(|a, b| b.priority.cmp(&a.priority));
            return MetricsView::Stack(visible.into_iter().map(|m| m.id.clone()).collect());
        }
        MetricsView::Grid(self.grid.current_layout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_medium() -> Vec<MetricConfig> {
        create_metrics_config(["clients", "plans", "assets", "tasks"], MetricSize::Medium, false)
    }

    #[test]
    fn test_fresh_load_places_third_card() {
        let state = DashState::in_memory();
        let bar = MetricsBar::new(&state, four_medium(), MetricsBarOptions::default());
        let MetricsView::Grid(layout) = bar.view() else {
            panic!("expected grid view");
        };
        let third = &layout[2];
        assert_eq!((third.x, third.y, third.w, third.h), (6, 0, 3, 2));
    }

    #[test]
    fn test_spans_by_size() {
        let small = MetricConfig::new("s").size(MetricSize::Small);
        let large = MetricConfig::new("l").size(MetricSize::Large);
        assert_eq!(metric_span(&small, 4), 2);
        assert_eq!(metric_span(&large, 4), 4);
        assert_eq!(metric_span(&large, 2), 6);
        assert_eq!(metric_span(&small, 6), 2);
        assert_eq!(metric_span(&large.clone().span(5), 4), 5);
    }

    #[test]
    fn test_row_major_placement_uses_baseline_span() {
        let metrics = vec![
            MetricConfig::new("a").size(MetricSize::Large),
            MetricConfig::new("b").size(MetricSize::Small),
            MetricConfig::new("c"),
        ];
        let layout = default_placement(&metrics, 2);
        assert_eq!((layout[0].x, layout[0].y, layout[0].w), (0, 0, 6));
        assert_eq!((layout[1].x, layout[1].y, layout[1].w), (6, 0, 5));
        assert_eq!((layout[2].x, layout[2].y), (0, 2));
        assert!(layout.iter().all(LayoutItem::within_bounds));
    }

    #[test]
    fn test_resize_limits() {
        let metrics = vec![MetricConfig::new("a"), MetricConfig::new("b").size(MetricSize::Large)];
        let layout = default_placement(&metrics, 4);
        assert_eq!((layout[0].max_w, layout[0].max_h), (Some(4), Some(3)));
        assert_eq!(layout[0].min_w, Some(2));

        let layout = default_placement(&metrics, 2);
        assert_eq!(layout[0].max_w, Some(6));
        assert_eq!(layout[1].max_w, Some(6));
    }

    #[test]
    fn test_cards_never_wrap() {
        let state = DashState::in_memory();
        let metrics = create_metrics_config((0..6).map(|i| format!("m{i}")), MetricSize::Medium, false);
        let bar = MetricsBar::new(&state, metrics, MetricsBarOptions::default());
        assert!(bar.grid().current_layout().iter().all(|item| item.y == 0));
    }

    #[test]
    fn test_stack_view_orders_by_priority_and_hides() {
        let state = DashState::in_memory();
        let mut metrics = four_medium();
        metrics[0].hide_on_tablet = true;
        metrics[3].priority = 10;
        let options = MetricsBarOptions { tablet_behavior: TabletBehavior::Stack, ..Default::default() };
        let mut bar = MetricsBar::new(&state, metrics, options);

        assert!(matches!(bar.view(), MetricsView::Grid(_)));
        bar.set_mobile(true);
        assert_eq!(bar.view(), MetricsView::Stack(vec!["tasks".into(), "plans".into(), "assets".into()]));
        assert!(!bar.grid().begin_drag("plans"));
    }

    #[test]
    fn test_create_metrics_config_priorities() {
        let metrics = create_metrics_config(["a", "b", "c"], MetricSize::Small, true);
        let priorities: Vec<i32> = metrics.iter().map(|m| m.priority).collect();
        assert_eq!(priorities, vec![3, 2, 1]);
        assert!(metrics.iter().all(|m| m.hide_on_tablet && m.size == MetricSize::Small));
    }

    #[test]
    fn test_tablet_columns() {
        assert_eq!(grid_columns(&MetricsBarOptions::default()).sm, 6);
        let stack = MetricsBarOptions { tablet_behavior: TabletBehavior::Stack, ..Default::default() };
        assert_eq!(grid_columns(&stack).sm, 4);
    }

    #[test]
    fn test_persists_under_storage_key() {
        let state = DashState::in_memory();
        let options = MetricsBarOptions { storage_key: Some("dashboard-top-layouts-test".into()), ..Default::default() };
        let bar = MetricsBar::new(&state, four_medium(), options);

        assert!(bar.grid().begin_drag("clients"));
        assert!(bar.grid().drag_to(3, 0));
        bar.grid().end_drag();

        let layout = bar.grid().current_layout();
        assert_eq!(layout.iter().find(|i| i.id == "clients").map(|i| i.x), Some(3));
        assert_eq!(layout.iter().find(|i| i.id == "plans").map(|i| i.x), Some(0));
        assert!(state.storage().contains("dashboard-top-layouts-test").unwrap());
    }
}

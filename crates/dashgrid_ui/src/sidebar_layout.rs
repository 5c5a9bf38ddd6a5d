//! Single-column stack of sidebar widgets.
//!
//! Widgets can be reordered vertically and resized from their bottom edge.
//! The layout is persisted as one schema-tagged array; two older untagged
//! shapes (a bare array, or an object whose `lg` entry is the array) are
//! migrated on load.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use dashgrid_core::models::{Breakpoints, Columns};
use dashgrid_core::services::blob::{self, StoredBlob, SIDEBAR_SCHEMA};
use dashgrid_core::{
    Breakpoint, DashState, KeyValueStore, Layout, LayoutItem, LayoutSet, Registration, ResetFamily, ResizeHandle,
};

use crate::compaction::CompactType;
use crate::events::InteractionHooks;
use crate::grid_layout::{GridLayout, GridLayoutOptions, GridResetHandle, LayoutChangeHandler};

const DEFAULT_HEIGHT: u32 = 6;
const DEFAULT_MIN_HEIGHT: u32 = 2;
const DEFAULT_MAX_HEIGHT: u32 = 10;

/// One widget in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarWidget {
    pub id: String,
    pub title: Option<String>,
    pub default_height: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl SidebarWidget {
    /// A widget with the default height bounds.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            default_height: DEFAULT_HEIGHT,
            min_height: DEFAULT_MIN_HEIGHT,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn heights(mut self, default: u32, min: u32, max: u32) -> Self {
        self.default_height = default;
        self.min_height = min;
        self.max_height = max;
        self
    }
}

/// Sidebar configuration.
#[derive(Debug, Clone)]
pub struct SidebarLayoutOptions {
    /// Width in columns.
    pub width: u32,
    pub collapsible: bool,
    pub default_collapsed: bool,
    pub reorderable: bool,
    pub resizable: bool,
    pub storage_key: Option<String>,
}

impl Default for SidebarLayoutOptions {
    fn default() -> Self {
        Self {
            width: 1,
            collapsible: false,
            default_collapsed: false,
            reorderable: false,
            resizable: true,
            storage_key: None,
        }
    }
}

/// Observers of sidebar changes.
#[derive(Clone, Default)]
pub struct SidebarCallbacks {
    /// Widgets in their new visual order.
    pub on_reorder: Option<Arc<dyn Fn(&[SidebarWidget]) + Send + Sync>>,
    /// A widget whose height differs from its default.
    pub on_height_change: Option<Arc<dyn Fn(&str, u32) + Send + Sync>>,
    /// The full layout after every change, including resets.
    pub on_layout_change: Option<Arc<dyn Fn(&Layout) + Send + Sync>>,
}

impl fmt::Debug for SidebarCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidebarCallbacks")
            .field("on_reorder", &self.on_reorder.is_some())
            .field("on_height_change", &self.on_height_change.is_some())
            .field("on_layout_change", &self.on_layout_change.is_some())
            .finish()
    }
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarView {
    /// A single expand affordance showing how many widgets are hidden.
    Collapsed { widget_count: usize },
    /// The widget grid.
    Expanded(Layout),
}

/// Stack widgets in declaration order.
pub fn default_sidebar_layout(widgets: &[SidebarWidget], options: &SidebarLayoutOptions) -> Layout {
    let width = options.width.max(1);
    let handles: Vec<ResizeHandle> = if options.resizable { vec![ResizeHandle::S] } else { Vec::new() };

    let mut y = 0;
    widgets
        .iter()
        .map(|widget| {
            let mut item = LayoutItem::new(&widget.id, 0, y, width, widget.default_height)
                .with_min_size(width, widget.min_height)
                .with_max_size(width, widget.max_height)
                .with_resize_handles(handles.clone());
            item.clamp_to_bounds();
            y += item.h;
            item
        })
        .collect()
}

/// Load a persisted sidebar layout, migrating legacy shapes.
pub fn load_sidebar_layout(storage: &dyn KeyValueStore, key: &str) -> Option<Layout> {
    let parse = |value: Value| -> Option<Layout> {
        match serde_json::from_value(value) {
            Ok(layout) => Some(layout),
            Err(e) => {
                tracing::warn!(storage_key = key, error = %e, "Discarding malformed sidebar layout");
                None
            }
        }
    };

    match blob::read_blob(storage, key)? {
        blob @ StoredBlob::Tagged { .. } => match blob.into_tagged::<Layout>(SIDEBAR_SCHEMA) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(storage_key = key, error = %e, "Discarding malformed sidebar layout");
                None
            }
        },
        StoredBlob::Legacy(value) => {
            let legacy = match value {
                Value::Array(_) => parse(value)?,
                Value::Object(mut map) => parse(map.remove(Breakpoint::PRIMARY.as_str())?)?,
                _ => return None,
            };
            match blob::write_tagged(storage, key, SIDEBAR_SCHEMA, &legacy) {
                Ok(()) => tracing::info!(storage_key = key, "Migrated legacy sidebar layout"),
                Err(e) => tracing::warn!(storage_key = key, error = %e, "Failed to rewrite legacy sidebar layout"),
            }
            Some(legacy)
        }
    }
}

struct SidebarShared {
    widgets: Vec<SidebarWidget>,
    options: SidebarLayoutOptions,
    storage: Arc<dyn KeyValueStore>,
    callbacks: SidebarCallbacks,
}

impl SidebarShared {
    fn handle_layout_change(&self, layout: &Layout) {
        if let Some(key) = self.options.storage_key.as_deref() {
            if let Err(e) = blob::write_tagged(self.storage.as_ref(), key, SIDEBAR_SCHEMA, layout) {
                tracing::warn!(storage_key = key, error = %e, "Failed to save sidebar layout");
            }
        }

        if self.options.reorderable {
            if let Some(on_reorder) = &self.callbacks.on_reorder {
                let mut sorted: Vec<&LayoutItem> = layout.iter().collect();
                sorted.sort_by_key(|item| item.y);
                let ordered: Vec<SidebarWidget> = sorted
                    .into_iter()
                    .filter_map(|item| self.widgets.iter().find(|w| w.id == item.id).cloned())
                    .collect();
                on_reorder(&ordered);
            }
        }

        if self.options.resizable {
            if let Some(on_height_change) = &self.callbacks.on_height_change {
                for item in layout {
                    let Some(widget) = self.widgets.iter().find(|w| w.id == item.id) else {
                        continue;
                    };
                    if item.h != widget.default_height {
                        on_height_change(&item.id, item.h);
                    }
                }
            }
        }

        if let Some(on_layout_change) = &self.callbacks.on_layout_change {
            on_layout_change(layout);
        }
    }
}

/// The sidebar layout.
pub struct SidebarLayout {
    shared: Arc<SidebarShared>,
    grid: GridLayout,
    collapsed: bool,
    _registration: Option<Registration>,
}

impl fmt::Debug for SidebarLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidebarLayout")
            .field("storage_key", &self.shared.options.storage_key)
            .field("widgets", &self.shared.widgets.len())
            .field("collapsed", &self.collapsed)
            .finish()
    }
}

impl SidebarLayout {
    /// Create a sidebar and resolve its layout from storage or defaults.
    pub fn new(
        state: &DashState,
        widgets: Vec<SidebarWidget>,
        options: SidebarLayoutOptions,
        callbacks: SidebarCallbacks,
        hooks: InteractionHooks,
    ) -> Self {
        let storage = Arc::clone(state.storage());
        let defaults = default_sidebar_layout(&widgets, &options);
        let initial = options
            .storage_key
            .as_deref()
            .and_then(|key| load_sidebar_layout(storage.as_ref(), key))
            .unwrap_or_else(|| defaults.clone());

        let width = options.width.max(1);
        let grid_options = GridLayoutOptions::default()
            .responsive(Breakpoints::uniform(0), Columns::uniform(width))
            .compact_type(CompactType::Vertical)
            .interactive(options.reorderable, options.resizable);

        let collapsed = options.collapsible && options.default_collapsed;
        let shared = Arc::new(SidebarShared { widgets, options, storage, callbacks });

        let observer = Arc::clone(&shared);
        let on_change: LayoutChangeHandler = Arc::new(move |layouts: &LayoutSet| {
            if let Some(layout) = layouts.get(Breakpoint::PRIMARY) {
                observer.handle_layout_change(layout);
            }
        });

        let explicit: LayoutSet = [(Breakpoint::PRIMARY, initial)].into_iter().collect();
        let grid = GridLayout::with_callbacks(state, &defaults, Some(explicit), grid_options, hooks, Some(on_change));

        // Reset restores the declaration-order stack, not whatever was loaded
        let registration = shared.options.storage_key.clone().map(|key| {
            let reset_grid = grid.reset_handle();
            let reset_shared = Arc::downgrade(&shared);
            state.registry().register(ResetFamily::Sidebar, key, move || {
                if let Some(shared) = reset_shared.upgrade() {
                    Self::reset_parts(&shared, &reset_grid);
                }
            })
        });

        grid.set_default_layouts(default_set(&shared));
        Self { shared, grid, collapsed, _registration: registration }
    }

    fn reset_parts(shared: &SidebarShared, grid: &GridResetHandle) {
        grid.reset();
        if let Some(key) = shared.options.storage_key.as_deref() {
            if let Err(e) = shared.storage.remove(key) {
                tracing::warn!(storage_key = key, error = %e, "Failed to delete sidebar layout");
            }
        }
        if let Some(on_layout_change) = &shared.callbacks.on_layout_change {
            on_layout_change(&default_sidebar_layout(&shared.widgets, &shared.options));
        }
        tracing::debug!(storage_key = ?shared.options.storage_key, "Sidebar layout reset");
    }

    // ========== Accessors ==========

    /// The underlying grid, for gestures.
    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    /// Widgets in declaration order.
    pub fn widgets(&self) -> &[SidebarWidget] {
        &self.shared.widgets
    }

    /// The current layout.
    pub fn layout(&self) -> Layout {
        self.grid.current_layout()
    }

    /// Rows occupied by the stack, at least 1.
    pub fn total_height(&self) -> u32 {
        dashgrid_core::models::layout_bottom(&self.layout()).max(1)
    }

    /// Current render plan.
    pub fn view(&self) -> SidebarView {
        if self.is_collapsed() {
            SidebarView::Collapsed { widget_count: self.shared.widgets.len() }
        } else {
            SidebarView::Expanded(self.layout())
        }
    }

    // ========== Collapse ==========

    /// Whether the sidebar is collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.shared.options.collapsible && self.collapsed
    }

    /// Collapse to the summary affordance.
    pub fn collapse(&mut self) {
        if self.shared.options.collapsible {
            self.collapsed = true;
        }
    }

    /// Expand back to the grid.
    pub fn expand(&mut self) {
        self.collapsed = false;
    }

    /// Toggle collapse.
    pub fn toggle_collapsed(&mut self) {
        if self.is_collapsed() {
            self.expand();
        } else {
            self.collapse();
        }
    }

    /// Enter or leave mobile mode.
    pub fn set_mobile(&self, mobile: bool) {
        self.grid.set_interactive(!mobile);
    }

    /// Restore the default stack and delete the persisted layout.
    pub fn reset(&self) {
        Self::reset_parts(&self.shared, &self.grid.reset_handle());
    }
}

fn default_set(shared: &SidebarShared) -> LayoutSet {
    [(Breakpoint::PRIMARY, default_sidebar_layout(&shared.widgets, &shared.options))].into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashgrid_core::services::blob::decode;
    use parking_lot::Mutex;

    const KEY: &str = "dashboard-side-layouts-test";

    fn widgets() -> Vec<SidebarWidget> {
        vec![
            SidebarWidget::new("recent-plans").heights(7, 2, 10),
            SidebarWidget::new("tasks").heights(6, 2, 8),
            SidebarWidget::new("events").heights(6, 2, 8),
        ]
    }

    fn options() -> SidebarLayoutOptions {
        SidebarLayoutOptions { storage_key: Some(KEY.into()), reorderable: true, ..Default::default() }
    }

    fn sidebar(state: &DashState, callbacks: SidebarCallbacks) -> SidebarLayout {
        SidebarLayout::new(state, widgets(), options(), callbacks, InteractionHooks::none())
    }

    #[test]
    fn test_default_stack_offsets() {
        let state = DashState::in_memory();
        let sidebar = sidebar(&state, SidebarCallbacks::default());
        let ys: Vec<u32> = sidebar.layout().iter().map(|i| i.y).collect();
        assert_eq!(ys, vec![0, 7, 13]);
        assert_eq!(sidebar.total_height(), 19);
        assert!(sidebar.layout().iter().all(|i| i.resize_handles == Some(vec![ResizeHandle::S])));
    }

    #[test]
    fn test_legacy_array_is_migrated() {
        let state = DashState::in_memory();
        let legacy = r#"[{"i":"tasks","x":0,"y":0,"w":1,"h":4},{"i":"recent-plans","x":0,"y":4,"w":1,"h":7}]"#;
        state.storage().set(KEY, legacy).unwrap();

        let sidebar = sidebar(&state, SidebarCallbacks::default());
        assert_eq!(sidebar.layout()[0].id, "tasks");

        let raw = state.storage().get(KEY).unwrap().unwrap();
        assert!(matches!(decode(&raw).unwrap(), StoredBlob::Tagged { schema: SIDEBAR_SCHEMA, .. }));
    }

    #[test]
    fn test_legacy_breakpoint_object_is_migrated() {
        let state = DashState::in_memory();
        let legacy = r#"{"lg":[{"i":"events","x":0,"y":0,"w":1,"h":3}],"md":[]}"#;
        state.storage().set(KEY, legacy).unwrap();

        let layout = load_sidebar_layout(state.storage().as_ref(), KEY).unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].id, "events");
        assert_eq!(load_sidebar_layout(state.storage().as_ref(), KEY), Some(layout));
    }

    #[test]
    fn test_unrecognized_shape_falls_back_to_defaults() {
        let state = DashState::in_memory();
        state.storage().set(KEY, r#"{"md":[]}"#).unwrap();
        let sidebar = sidebar(&state, SidebarCallbacks::default());
        assert_eq!(sidebar.layout().len(), 3);
    }

    #[test]
    fn test_reorder_and_height_callbacks() {
        let state = DashState::in_memory();
        let order = Arc::new(Mutex::new(Vec::new()));
        let heights = Arc::new(Mutex::new(Vec::new()));

        let order_log = Arc::clone(&order);
        let height_log = Arc::clone(&heights);
        let callbacks = SidebarCallbacks {
            on_reorder: Some(Arc::new(move |widgets: &[SidebarWidget]| {
                *order_log.lock() = widgets.iter().map(|w| w.id.clone()).collect::<Vec<_>>();
            })),
            on_height_change: Some(Arc::new(move |id: &str, h: u32| height_log.lock().push((id.to_string(), h)))),
            on_layout_change: None,
        };
        let sidebar = sidebar(&state, callbacks);

        assert!(sidebar.grid().begin_drag("events"));
        assert!(sidebar.grid().drag_to(0, 0));
        sidebar.grid().end_drag();
        assert_eq!(order.lock()[0], "events");
        assert!(heights.lock().is_empty());

        assert!(sidebar.grid().begin_resize("tasks", ResizeHandle::S));
        assert!(sidebar.grid().resize_to(0.0, 68.0 * 3.0));
        sidebar.grid().end_resize();
        assert_eq!(heights.lock().as_slice(), &[("tasks".to_string(), 3)]);
        assert!(state.storage().contains(KEY).unwrap());
    }

    #[test]
    fn test_reset_restores_declaration_order() {
        let state = DashState::in_memory();
        let sidebar = sidebar(&state, SidebarCallbacks::default());
        sidebar.grid().begin_drag("events");
        sidebar.grid().drag_to(0, 0);
        sidebar.grid().end_drag();

        assert!(state.registry().reset(ResetFamily::Sidebar, KEY));
        assert!(state.registry().reset(ResetFamily::Sidebar, KEY));
        assert_eq!(sidebar.layout()[0].id, "recent-plans");
        assert!(!state.storage().contains(KEY).unwrap());
    }

    #[test]
    fn test_collapse_shows_count() {
        let state = DashState::in_memory();
        let options = SidebarLayoutOptions { collapsible: true, default_collapsed: true, ..options() };
        let mut sidebar = SidebarLayout::new(&state, widgets(), options, SidebarCallbacks::default(), InteractionHooks::none());

        assert_eq!(sidebar.view(), SidebarView::Collapsed { widget_count: 3 });
        sidebar.toggle_collapsed();
        assert!(matches!(sidebar.view(), SidebarView::Expanded(_)));
    }

    #[test]
    fn test_collapse_ignored_when_not_collapsible() {
        let state = DashState::in_memory();
        let mut sidebar = sidebar(&state, SidebarCallbacks::default());
        sidebar.collapse();
        assert!(!sidebar.is_collapsed());
    }
}

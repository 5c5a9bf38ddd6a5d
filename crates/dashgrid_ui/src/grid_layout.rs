//! Responsive grid layout engine.
//!
//! A [`GridLayout`] owns the placement of a set of items for every
//! breakpoint. It resolves its initial layout from storage, an explicit
//! layout set, or a synthesized single-column stack; applies drag and resize
//! gestures; persists only when a gesture ends; and registers a reset
//! callback under its storage key.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

use dashgrid_core::models::{breakpoint_for_width, Breakpoints, Columns, GRID_CONFIG};
use dashgrid_core::services::blob::{self, LAYOUT_SET_SCHEMA};
use dashgrid_core::{
    Breakpoint, DashState, KeyValueStore, Layout, LayoutItem, LayoutSet, Registration, ResetFamily, ResizeHandle,
};

use crate::compaction::{compact, move_item, resolve_collisions, CompactType};
use crate::events::{GridEvent, InteractionHooks};
use crate::remeasure::Remeasure;
use crate::resizer::{snap_to_cells, Axis, GridMetrics};

/// Callback receiving the full layout set after a committed change.
pub type LayoutChangeHandler = Arc<dyn Fn(&LayoutSet) + Send + Sync>;

/// Static configuration of one grid.
#[derive(Debug, Clone)]
pub struct GridLayoutOptions {
    /// Key the layout set is persisted under. `None` disables persistence
    /// and reset registration.
    pub storage_key: Option<String>,
    /// Pixel thresholds per breakpoint.
    pub breakpoints: Breakpoints,
    /// Column count per breakpoint.
    pub cols: Columns,
    pub compact_type: CompactType,
    pub max_rows: Option<u32>,
    /// Reject moves that would overlap another item.
    pub prevent_collision: bool,
    pub is_draggable: bool,
    pub is_resizable: bool,
    /// Initial container width in pixels.
    pub container_width: u32,
}

impl Default for GridLayoutOptions {
    fn default() -> Self {
        Self {
            storage_key: None,
            breakpoints: GRID_CONFIG.breakpoints,
            cols: GRID_CONFIG.main_cols,
            compact_type: CompactType::Vertical,
            max_rows: None,
            prevent_collision: false,
            is_draggable: true,
            is_resizable: true,
            container_width: GRID_CONFIG.breakpoints.lg,
        }
    }
}

impl GridLayoutOptions {
    /// Persist under a storage key.
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    /// Use custom thresholds and columns.
    pub fn responsive(mut self, breakpoints: Breakpoints, cols: Columns) -> Self {
        self.breakpoints = breakpoints;
        self.cols = cols;
        self
    }

    /// Set the compaction policy.
    pub fn compact_type(mut self, compact_type: CompactType) -> Self {
        self.compact_type = compact_type;
        self
    }

    /// Cap the number of rows.
    pub fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Reject overlapping moves.
    pub fn prevent_collision(mut self, prevent: bool) -> Self {
        self.prevent_collision = prevent;
        self
    }

    /// Container-level drag and resize switches.
    pub fn interactive(mut self, draggable: bool, resizable: bool) -> Self {
        self.is_draggable = draggable;
        self.is_resizable = resizable;
        self
    }

    /// Initial container width.
    pub fn container_width(mut self, width: u32) -> Self {
        self.container_width = width;
        self
    }
}

#[derive(Debug, Clone)]
enum Gesture {
    Drag { item_id: String },
    Resize { item_id: String, handle: ResizeHandle },
}

impl Gesture {
    fn item_id(&self) -> &str {
        match self {
            Self::Drag { item_id } | Self::Resize { item_id, .. } => item_id,
        }
    }
}

struct GridState {
    layouts: LayoutSet,
    defaults: LayoutSet,
    breakpoint: Breakpoint,
    container_width: u32,
    /// Cleared in mobile mode.
    interactive: bool,
    gesture: Option<Gesture>,
}

struct GridShared {
    state: Mutex<GridState>,
    options: GridLayoutOptions,
    storage: Arc<dyn KeyValueStore>,
    hooks: InteractionHooks,
    on_layout_change: Option<LayoutChangeHandler>,
}

/// Handle to one grid. Dropping it deregisters its reset callback.
pub struct GridLayout {
    shared: Arc<GridShared>,
    _registration: Option<Registration>,
}

impl fmt::Debug for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridLayout")
            .field("storage_key", &self.shared.options.storage_key)
            .field("breakpoint", &self.breakpoint())
            .finish()
    }
}

// ========== Initialization ==========

/// Stack items in one column per breakpoint, applying their bounds.
pub fn synthesize_layouts(items: &[LayoutItem], cols: &Columns) -> LayoutSet {
    Breakpoint::ALL
        .into_iter()
        .map(|bp| {
            let cols = cols.get(bp);
            let mut y = 0;
            let layout = items
                .iter()
                .map(|template| {
                    let mut item = template.clone();
                    item.x = 0;
                    item.y = y;
                    item.clamp_to_bounds();
                    item.fit_columns(cols);
                    y += item.h;
                    item
                })
                .collect();
            (bp, layout)
        })
        .collect()
}

/// Load a persisted layout set. Anything unusable counts as absent.
pub fn load_layouts(storage: &dyn KeyValueStore, key: &str) -> Option<LayoutSet> {
    let blob = blob::read_blob(storage, key)?;
    let layouts: LayoutSet = match blob.into_tagged(LAYOUT_SET_SCHEMA) {
        Ok(Some(layouts)) => layouts,
        Ok(None) => {
            tracing::debug!(storage_key = key, "Ignoring untagged layout blob");
            return None;
        }
        Err(e) => {
            tracing::warn!(storage_key = key, error = %e, "Discarding malformed layout set");
            return None;
        }
    };

    if !layouts.has_primary() {
        tracing::warn!(storage_key = key, "Stored layout set has no primary breakpoint");
        return None;
    }
    Some(layouts)
}

/// Pull sizes into their declared bounds and items inside `cols` columns.
///
/// Positions are otherwise kept, so a stored layout keeps its gaps.
fn normalize(layout: &mut Layout, cols: u32) {
    for item in layout.iter_mut() {
        item.clamp_to_bounds();
        item.fit_columns(cols);
    }
}

fn persist(shared: &GridShared, layouts: &LayoutSet) {
    let Some(key) = shared.options.storage_key.as_deref() else {
        return;
    };
    if let Err(e) = blob::write_tagged(shared.storage.as_ref(), key, LAYOUT_SET_SCHEMA, layouts) {
        tracing::warn!(storage_key = key, error = %e, "Failed to persist layout; keeping it in memory");
    }
}

impl GridLayout {
    /// Create a grid and resolve its initial layout.
    ///
    /// Resolution order: the stored blob (if it has the primary breakpoint,
    /// used as-is), then `explicit`, then a synthesized stack of `items`.
    pub fn new(
        state: &DashState,
        items: &[LayoutItem],
        explicit: Option<LayoutSet>,
        options: GridLayoutOptions,
    ) -> Self {
        Self::with_callbacks(state, items, explicit, options, InteractionHooks::none(), None)
    }

    /// Create a grid with interaction hooks and a layout-change callback.
    pub fn with_callbacks(
        state: &DashState,
        items: &[LayoutItem],
        explicit: Option<LayoutSet>,
        options: GridLayoutOptions,
        hooks: InteractionHooks,
        on_layout_change: Option<LayoutChangeHandler>,
    ) -> Self {
        let storage = Arc::clone(state.storage());

        let mut defaults = explicit.unwrap_or_else(|| synthesize_layouts(items, &options.cols));
        for bp in Breakpoint::ALL {
            if let Some(layout) = defaults.get_mut(bp) {
                let cols = options.cols.get(bp);
                normalize(layout, cols);
                compact(layout, options.compact_type, cols, options.max_rows);
            }
        }

        let stored = options.storage_key.as_deref().and_then(|key| load_layouts(storage.as_ref(), key));
        let layouts = match stored {
            // Stored sets are only normalized, never compacted or merged with `items`
            Some(mut stored) => {
                for bp in Breakpoint::ALL {
                    if let Some(layout) = stored.get_mut(bp) {
                        normalize(layout, options.cols.get(bp));
                    }
                }
                tracing::debug!(storage_key = ?options.storage_key, "Restored stored layout set");
                stored
            }
            None => defaults.clone(),
        };

        let container_width = options.container_width;
        let breakpoint = breakpoint_for_width(container_width, &options.breakpoints);

        let shared = Arc::new(GridShared {
            state: Mutex::new(GridState {
                layouts,
                defaults,
                breakpoint,
                container_width,
                interactive: true,
                gesture: None,
            }),
            options,
            storage,
            hooks,
            on_layout_change,
        });
        Self::ensure_layout(&shared, breakpoint);

        let registration = shared.options.storage_key.clone().map(|key| {
            let weak: Weak<GridShared> = Arc::downgrade(&shared);
            state.registry().register(ResetFamily::Grid, key, move || {
                if let Some(shared) = weak.upgrade() {
                    Self::reset_shared(&shared);
                }
            })
        });

        Self { shared, _registration: registration }
    }

    /// Derive a missing breakpoint's layout from the closest one present.
    fn ensure_layout(shared: &GridShared, breakpoint: Breakpoint) {
        let mut state = shared.state.lock();
        if state.layouts.contains(breakpoint) {
            return;
        }

        let source = Breakpoint::ALL
            .into_iter()
            .filter(|bp| state.layouts.contains(*bp))
            .min_by_key(|bp| ((*bp as i32) - (breakpoint as i32)).abs())
            .and_then(|bp| state.layouts.get(bp).cloned())
            .or_else(|| state.defaults.get(breakpoint).cloned())
            .unwrap_or_default();

        let cols = shared.options.cols.get(breakpoint);
        let mut layout = source;
        normalize(&mut layout, cols);
        compact(&mut layout, shared.options.compact_type, cols, shared.options.max_rows);

        tracing::debug!(%breakpoint, items = layout.len(), "Derived layout for breakpoint");
        state.layouts.insert(breakpoint, layout);
    }

    // ========== Accessors ==========

    /// All layouts.
    pub fn layouts(&self) -> LayoutSet {
        self.shared.state.lock().layouts.clone()
    }

    /// The layout for the active breakpoint.
    pub fn current_layout(&self) -> Layout {
        let state = self.shared.state.lock();
        state.layouts.get(state.breakpoint).cloned().unwrap_or_default()
    }

    /// The default layouts restored by [`GridLayout::reset`].
    pub fn default_layouts(&self) -> LayoutSet {
        self.shared.state.lock().defaults.clone()
    }

    /// The active breakpoint.
    pub fn breakpoint(&self) -> Breakpoint {
        self.shared.state.lock().breakpoint
    }

    /// Column count at the active breakpoint.
    pub fn columns(&self) -> u32 {
        self.shared.options.cols.get(self.breakpoint())
    }

    /// Pixel geometry at the current container width.
    pub fn metrics(&self) -> GridMetrics {
        let state = self.shared.state.lock();
        GridMetrics::new(state.container_width, self.shared.options.cols.get(state.breakpoint))
    }

    /// The storage key, if persisted.
    pub fn storage_key(&self) -> Option<&str> {
        self.shared.options.storage_key.as_deref()
    }

    /// Find an item in the active layout.
    pub fn item(&self, id: &str) -> Option<LayoutItem> {
        self.current_layout().into_iter().find(|item| item.id == id)
    }

    /// Whether a gesture is in progress.
    pub fn is_interacting(&self) -> bool {
        self.shared.state.lock().gesture.is_some()
    }

    // ========== Viewport ==========

    /// Enable or disable interaction (disabled in mobile mode).
    pub fn set_interactive(&self, interactive: bool) {
        let mut state = self.shared.state.lock();
        state.interactive = interactive;
        if !interactive {
            state.gesture = None;
        }
    }

    /// Whether gestures are currently accepted.
    pub fn is_interactive(&self) -> bool {
        self.shared.state.lock().interactive
    }

    /// Recompute the active breakpoint for a container width.
    ///
    /// Idempotent for an unchanged width.
    pub fn remeasure(&self, container_width: u32) -> Breakpoint {
        let breakpoint = breakpoint_for_width(container_width, &self.shared.options.breakpoints);
        let changed = {
            let mut state = self.shared.state.lock();
            state.container_width = container_width;
            let changed = state.breakpoint != breakpoint;
            state.breakpoint = breakpoint;
            changed
        };

        if changed {
            Self::ensure_layout(&self.shared, breakpoint);
            tracing::debug!(storage_key = ?self.shared.options.storage_key, %breakpoint, container_width, "Breakpoint changed");
        }
        breakpoint
    }

    // ========== Gestures ==========

    fn begin(&self, gesture: Gesture) -> bool {
        let event = {
            let mut state = self.shared.state.lock();
            if !state.interactive || state.gesture.is_some() {
                return false;
            }
            let Some(item) = state.layouts.get(state.breakpoint).and_then(|l| l.iter().find(|i| i.id == gesture.item_id()))
            else {
                return false;
            };

            let allowed = match &gesture {
                Gesture::Drag { .. } => item.draggable(self.shared.options.is_draggable),
                Gesture::Resize { handle, .. } => {
                    item.resizable(self.shared.options.is_resizable)
                        && item.resize_handles.as_ref().map_or(true, |handles| handles.contains(handle))
                }
            };
            if !allowed {
                return false;
            }

            let event = match &gesture {
                Gesture::Drag { item_id } => GridEvent::DragStart { item_id: item_id.clone() },
                Gesture::Resize { item_id, .. } => GridEvent::ResizeStart { item_id: item_id.clone() },
            };
            state.gesture = Some(gesture);
            event
        };

        self.shared.hooks.forward(&event);
        true
    }

    /// Start dragging an item. Returns `false` if the item cannot be dragged.
    pub fn begin_drag(&self, item_id: &str) -> bool {
        self.begin(Gesture::Drag { item_id: item_id.to_string() })
    }

    /// Move the dragged item to a cell. Nothing is persisted until [`GridLayout::end_drag`].
    pub fn drag_to(&self, x: u32, y: u32) -> bool {
        let mut state = self.shared.state.lock();
        let Some(Gesture::Drag { item_id }) = state.gesture.clone() else {
            return false;
        };

        let breakpoint = state.breakpoint;
        let cols = self.shared.options.cols.get(breakpoint);
        let options = &self.shared.options;
        let Some(layout) = state.layouts.get_mut(breakpoint) else {
            return false;
        };

        let before = layout.clone();
        if !move_item(layout, &item_id, x, y, cols, options.prevent_collision) {
            return false;
        }
        compact(layout, options.compact_type, cols, options.max_rows);
        *layout != before
    }

    /// Release the dragged item and commit the layout.
    pub fn end_drag(&self) {
        self.end(|g| matches!(g, Gesture::Drag { .. }));
    }

    /// Start resizing an item from a handle.
    pub fn begin_resize(&self, item_id: &str, handle: ResizeHandle) -> bool {
        self.begin(Gesture::Resize { item_id: item_id.to_string(), handle })
    }

    /// Offer a candidate pixel size for the resized item.
    ///
    /// Each axis the handle controls is snapped to whole cells and clamped to
    /// the item's bounds. The item is only mutated when a snapped value
    /// differs from its current size; returns whether it was.
    pub fn resize_to(&self, width_px: f32, height_px: f32) -> bool {
        let mut state = self.shared.state.lock();
        let Some(Gesture::Resize { item_id, handle }) = state.gesture.clone() else {
            return false;
        };

        let breakpoint = state.breakpoint;
        let cols = self.shared.options.cols.get(breakpoint);
        let metrics = GridMetrics::new(state.container_width, cols);
        let options = &self.shared.options;
        let Some(layout) = state.layouts.get_mut(breakpoint) else {
            return false;
        };
        let Some(item) = layout.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };

        let mut w = item.w;
        let mut h = item.h;
        if handle.affects_width() {
            let max_w = item.max_w.unwrap_or(cols).min(cols.saturating_sub(item.x)).max(1);
            w = snap_to_cells(width_px, metrics.cell_size(Axis::Horizontal), item.min_w.unwrap_or(1).min(max_w), max_w);
        }
        if handle.affects_height() {
            let max_h = item.max_h.unwrap_or(u32::MAX);
            h = snap_to_cells(height_px, metrics.cell_size(Axis::Vertical), item.min_h.unwrap_or(1), max_h);
        }

        if (w, h) == (item.w, item.h) {
            return false;
        }
        item.w = w;
        item.h = h;
        tracing::trace!(%item_id, w, h, "Resized item");

        resolve_collisions(layout, &item_id);
        compact(layout, options.compact_type, cols, options.max_rows);
        true
    }

    /// Release the resized item and commit the layout.
    pub fn end_resize(&self) {
        self.end(|g| matches!(g, Gesture::Resize { .. }));
    }

    fn end(&self, matches_kind: impl Fn(&Gesture) -> bool) {
        let (event, breakpoint, layout) = {
            let mut state = self.shared.state.lock();
            if !state.gesture.as_ref().is_some_and(&matches_kind) {
                return;
            }
            let Some(gesture) = state.gesture.take() else {
                return;
            };
            let event = match gesture {
                Gesture::Drag { item_id } => GridEvent::DragStop { item_id },
                Gesture::Resize { item_id, .. } => GridEvent::ResizeStop { item_id },
            };
            let breakpoint = state.breakpoint;
            (event, breakpoint, state.layouts.get(breakpoint).cloned().unwrap_or_default())
        };

        self.shared.hooks.forward(&event);
        self.commit_layout(breakpoint, layout);
    }

    /// Replace the layout for a breakpoint, persist and notify.
    ///
    /// This is the interaction-end path; hosts that run their own gesture
    /// handling call it directly with the released layout.
    pub fn commit_layout(&self, breakpoint: Breakpoint, mut layout: Layout) {
        normalize(&mut layout, self.shared.options.cols.get(breakpoint));

        let layouts = {
            let mut state = self.shared.state.lock();
            state.layouts.insert(breakpoint, layout);
            state.layouts.clone()
        };

        persist(&self.shared, &layouts);
        self.shared.hooks.forward(&GridEvent::LayoutChanged { breakpoint });
        if let Some(callback) = &self.shared.on_layout_change {
            callback(&layouts);
        }
    }

    // ========== Reset ==========

    /// Restore the default layouts and delete the persisted blob.
    pub fn reset(&self) {
        Self::reset_shared(&self.shared);
    }

    /// Replace the layouts restored by [`GridLayout::reset`].
    pub fn set_default_layouts(&self, mut defaults: LayoutSet) {
        let options = &self.shared.options;
        for bp in Breakpoint::ALL {
            if let Some(layout) = defaults.get_mut(bp) {
                let cols = options.cols.get(bp);
                normalize(layout, cols);
                compact(layout, options.compact_type, cols, options.max_rows);
            }
        }
        self.shared.state.lock().defaults = defaults;
    }

    /// A handle that can reset this grid without keeping it alive.
    pub fn reset_handle(&self) -> GridResetHandle {
        GridResetHandle { shared: Arc::downgrade(&self.shared) }
    }

    fn reset_shared(shared: &GridShared) {
        {
            let mut state = shared.state.lock();
            state.layouts = state.defaults.clone();
            state.gesture = None;
        }
        let breakpoint = shared.state.lock().breakpoint;
        Self::ensure_layout(shared, breakpoint);

        if let Some(key) = shared.options.storage_key.as_deref() {
            if let Err(e) = shared.storage.remove(key) {
                tracing::warn!(storage_key = key, error = %e, "Failed to delete stored layout");
            }
        }
        tracing::debug!(storage_key = ?shared.options.storage_key, "Grid layout reset");
    }
}

/// Weak reset access to a [`GridLayout`].
#[derive(Clone)]
pub struct GridResetHandle {
    shared: Weak<GridShared>,
}

impl GridResetHandle {
    /// Reset the grid if it still exists.
    pub fn reset(&self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => {
                GridLayout::reset_shared(&shared);
                true
            }
            None => false,
        }
    }
}

impl Remeasure for GridLayout {
    fn remeasure(&self, container_width: u32) {
        GridLayout::remeasure(self, container_width);
    }
}

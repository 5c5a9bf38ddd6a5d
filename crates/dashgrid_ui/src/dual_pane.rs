//! Two side-by-side panes split by a draggable edge.
//!
//! Only the left width is state; the right width is always derived from the
//! column total. Below a viewport breakpoint (or in mobile mode) the panes
//! stack vertically and the width is frozen until the split returns.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use dashgrid_core::services::blob;
use dashgrid_core::{DashState, KeyValueStore, Layout, LayoutItem, Registration, ResetFamily, ResizeHandle};

use crate::events::{GridEvent, InteractionHooks};
use crate::remeasure::Remeasure;
use crate::resizer::{snap_to_cells, Axis, GridMetrics};

/// Item id of the left pane.
pub const LEFT_PANE: &str = "left-pane";
/// Item id of the right pane.
pub const RIGHT_PANE: &str = "right-pane";

/// Which pane carries the resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlePosition {
    /// East edge of the left pane.
    Left,
    /// West edge of the right pane.
    #[default]
    Right,
}

impl HandlePosition {
    fn pane_id(self) -> &'static str {
        match self {
            Self::Left => LEFT_PANE,
            Self::Right => RIGHT_PANE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Left,
    Right,
}

/// Order of the panes when stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackOrder {
    #[default]
    LeftFirst,
    RightFirst,
}

impl StackOrder {
    /// Panes from top to bottom.
    pub fn panes(self) -> [Pane; 2] {
        match self {
            Self::LeftFirst => [Pane::Left, Pane::Right],
            Self::RightFirst => [Pane::Right, Pane::Left],
        }
    }
}

/// Dual-pane configuration.
#[derive(Debug, Clone)]
pub struct DualPaneOptions {
    pub initial_left_width: u32,
    /// Width restored by reset. Defaults to `initial_left_width`.
    pub default_left_width: Option<u32>,
    pub min_left_width: u32,
    pub max_left_width: u32,
    pub total_columns: u32,
    pub resizable: bool,
    pub handle: HandlePosition,
    /// Viewport width below which the panes stack.
    pub stack_breakpoint: u32,
    /// Whether narrow viewports stack at all. Mobile mode always stacks.
    pub stacked_on_tablet: bool,
    pub stack_order: StackOrder,
    /// Row height used when no height has been supplied.
    pub default_height: u32,
    /// Key the left width is persisted under.
    pub storage_key: Option<String>,
    pub viewport_width: u32,
    pub container_width: u32,
}

impl Default for DualPaneOptions {
    fn default() -> Self {
        Self {
            initial_left_width: 4,
            default_left_width: None,
            min_left_width: 2,
            max_left_width: 10,
            total_columns: 12,
            resizable: true,
            handle: HandlePosition::Right,
            stack_breakpoint: 1200,
            stacked_on_tablet: true,
            stack_order: StackOrder::LeftFirst,
            default_height: 1,
            storage_key: None,
            viewport_width: 1280,
            container_width: 1200,
        }
    }
}

impl DualPaneOptions {
    /// Left-width bounds, kept inside the column total.
    fn bounds(&self) -> (u32, u32) {
        let total = self.total_columns.max(1);
        let min = self.min_left_width.min(total);
        let max = self.max_left_width.clamp(min, total);
        (min, max)
    }

    fn initial(&self) -> u32 {
        let (min, max) = self.bounds();
        self.initial_left_width.clamp(min, max)
    }

    fn reset_width(&self) -> u32 {
        let (min, max) = self.bounds();
        self.default_left_width.unwrap_or(self.initial_left_width).clamp(min, max)
    }
}

/// Receives `(left, right)` after a committed width change. Not called on reset.
pub type WidthChangeHandler = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// What the host should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DualPaneView {
    Split {
        layout: Layout,
        height: u32,
        /// `"{right}/{total}"` while the right pane is being resized.
        resize_label: Option<String>,
    },
    Stacked {
        order: [Pane; 2],
        height: u32,
    },
}

/// Load a persisted left width, ignoring values outside `[min, max]`.
pub fn load_left_width(storage: &dyn KeyValueStore, key: &str, min: u32, max: u32) -> Option<u32> {
    let width: u32 = blob::read_scalar(storage, key)?;
    if (min..=max).contains(&width) {
        Some(width)
    } else {
        tracing::debug!(storage_key = key, left_width = width, min, max, "Ignoring out-of-range pane width");
        None
    }
}

struct PaneState {
    left_width: u32,
    /// Last width persisted or restored.
    committed: u32,
    height: Option<u32>,
    viewport_width: u32,
    container_width: u32,
    mobile: bool,
    resizing: bool,
}

struct PaneShared {
    state: Mutex<PaneState>,
    options: DualPaneOptions,
    storage: Arc<dyn KeyValueStore>,
    hooks: InteractionHooks,
    on_width_change: Option<WidthChangeHandler>,
}

impl PaneShared {
    fn stacked(&self, state: &PaneState) -> bool {
        state.mobile || (self.options.stacked_on_tablet && state.viewport_width < self.options.stack_breakpoint)
    }

    fn commit(&self, left_width: u32) {
        let right_width = self.options.total_columns - left_width;
        if let Some(key) = self.options.storage_key.as_deref() {
            if let Err(e) = blob::write_scalar(self.storage.as_ref(), key, &left_width) {
                tracing::warn!(storage_key = key, left_width, error = %e, "Failed to save pane width");
            }
        }
        tracing::debug!(storage_key = ?self.options.storage_key, left_width, right_width, "Pane width changed");
        if let Some(callback) = &self.on_width_change {
            callback(left_width, right_width);
        }
    }

    fn reset(&self) {
        {
            let mut state = self.state.lock();
            let width = self.options.reset_width();
            state.left_width = width;
            state.committed = width;
            state.resizing = false;
        }
        if let Some(key) = self.options.storage_key.as_deref() {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(storage_key = key, error = %e, "Failed to delete pane width");
            }
        }
        tracing::debug!(storage_key = ?self.options.storage_key, "Dual pane reset");
    }
}

/// Handle to a dual-pane split. Clones share state.
#[derive(Clone)]
pub struct DualPaneLayout {
    shared: Arc<PaneShared>,
    _registration: Option<Arc<Registration>>,
}

impl fmt::Debug for DualPaneLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualPaneLayout")
            .field("storage_key", &self.shared.options.storage_key)
            .field("left_width", &self.left_width())
            .field("stacked", &self.is_stacked())
            .finish()
    }
}

impl DualPaneLayout {
    pub fn new(state: &DashState, options: DualPaneOptions) -> Self {
        Self::with_callbacks(state, options, InteractionHooks::none(), None)
    }

    /// Create a split forwarding gestures to `hooks`.
    pub fn with_callbacks(
        state: &DashState,
        mut options: DualPaneOptions,
        hooks: InteractionHooks,
        on_width_change: Option<WidthChangeHandler>,
    ) -> Self {
        options.total_columns = options.total_columns.max(1);
        let storage = Arc::clone(state.storage());
        let (min, max) = options.bounds();
        let left_width = options
            .storage_key
            .as_deref()
            .and_then(|key| load_left_width(storage.as_ref(), key, min, max))
            .unwrap_or_else(|| options.initial());

        let shared = Arc::new(PaneShared {
            state: Mutex::new(PaneState {
                left_width,
                committed: left_width,
                height: None,
                viewport_width: options.viewport_width,
                container_width: options.container_width,
                mobile: false,
                resizing: false,
            }),
            options,
            storage,
            hooks,
            on_width_change,
        });

        let registration = shared.options.storage_key.clone().map(|key| {
            let weak = Arc::downgrade(&shared);
            Arc::new(state.registry().register(ResetFamily::DualPane, key, move || {
                if let Some(shared) = weak.upgrade() {
                    shared.reset();
                }
            }))
        });

        Self { shared, _registration: registration }
    }

    // ========== Width ==========

    pub fn left_width(&self) -> u32 {
        self.shared.state.lock().left_width
    }

    /// Always `total_columns - left_width`.
    pub fn right_width(&self) -> u32 {
        self.shared.options.total_columns - self.left_width()
    }

    pub fn total_columns(&self) -> u32 {
        self.shared.options.total_columns
    }

    /// Set the left width, clamped to its bounds. Persists and notifies.
    ///
    /// Ignored while stacked. Returns whether anything changed.
    pub fn set_left_width(&self, width: u32) -> bool {
        let left_width = {
            let mut state = self.shared.state.lock();
            if self.shared.stacked(&state) {
                tracing::trace!(left_width = width, "Pane width is frozen while stacked");
                return false;
            }
            let (min, max) = self.shared.options.bounds();
            let width = width.clamp(min, max);
            if width == state.left_width && width == state.committed {
                return false;
            }
            state.left_width = width;
            state.committed = width;
            width
        };
        self.shared.commit(left_width);
        true
    }

    /// Derive the left width from a released layout.
    ///
    /// Reads the pane adjacent to the handle: with the handle on the right
    /// pane, `left = total - right.w`.
    pub fn apply_layout_change(&self, layout: &[LayoutItem]) -> bool {
        let handle = self.shared.options.handle;
        let Some(item) = layout.iter().find(|item| item.id == handle.pane_id()) else {
            return false;
        };
        let left = match handle {
            HandlePosition::Right => self.shared.options.total_columns.saturating_sub(item.w),
            HandlePosition::Left => item.w,
        };
        self.set_left_width(left)
    }

    // ========== Gestures ==========

    /// Whether the handle currently accepts gestures.
    pub fn is_resizable(&self) -> bool {
        let state = self.shared.state.lock();
        self.shared.options.resizable && !self.shared.stacked(&state)
    }

    /// Start dragging the handle.
    pub fn begin_resize(&self) -> bool {
        {
            let mut state = self.shared.state.lock();
            if !self.shared.options.resizable || self.shared.stacked(&state) || state.resizing {
                return false;
            }
            state.resizing = true;
        }
        let item_id = self.shared.options.handle.pane_id().to_string();
        self.shared.hooks.forward(&GridEvent::ResizeStart { item_id });
        true
    }

    /// Offer a candidate pixel width for the pane carrying the handle.
    ///
    /// Updates both widths immediately; nothing is persisted until
    /// [`DualPaneLayout::end_resize`].
    pub fn resize_to(&self, width_px: f32) -> bool {
        let mut state = self.shared.state.lock();
        if !state.resizing {
            return false;
        }

        let options = &self.shared.options;
        let total = options.total_columns;
        let (min, max) = options.bounds();
        let cell = GridMetrics::new(state.container_width, total).cell_size(Axis::Horizontal);
        let left = match options.handle {
            HandlePosition::Right => total - snap_to_cells(width_px, cell, total - max, total - min),
            HandlePosition::Left => snap_to_cells(width_px, cell, min, max),
        };

        if left == state.left_width {
            return false;
        }
        state.left_width = left;
        tracing::trace!(left_width = left, right_width = total - left, "Resizing panes");
        true
    }

    /// Release the handle and commit the width.
    pub fn end_resize(&self) {
        let changed = {
            let mut state = self.shared.state.lock();
            if !state.resizing {
                return;
            }
            state.resizing = false;
            let changed = state.left_width != state.committed;
            state.committed = state.left_width;
            changed.then_some(state.left_width)
        };

        self.forward_resize_stop();
        if let Some(left_width) = changed {
            self.shared.commit(left_width);
        }
    }

    /// Width readout shown while the right pane is resized.
    pub fn resize_label(&self) -> Option<String> {
        let state = self.shared.state.lock();
        let options = &self.shared.options;
        (state.resizing && options.handle == HandlePosition::Right)
            .then(|| format!("{}/{}", options.total_columns - state.left_width, options.total_columns))
    }

    // ========== Height ==========

    /// Height in rows shared by both panes.
    pub fn height(&self) -> u32 {
        self.shared.state.lock().height.unwrap_or(self.shared.options.default_height)
    }

    /// Supply the current height. `None` falls back to the default.
    pub fn set_height(&self, height: Option<u32>) {
        self.shared.state.lock().height = height;
    }

    // ========== Viewport ==========

    /// Whether the panes are stacked.
    pub fn is_stacked(&self) -> bool {
        let state = self.shared.state.lock();
        self.shared.stacked(&state)
    }

    /// Report a new viewport width. Returns whether stacking changed.
    pub fn set_viewport_width(&self, viewport_width: u32) -> bool {
        let mut state = self.shared.state.lock();
        let before = self.shared.stacked(&state);
        state.viewport_width = viewport_width;
        let after = self.shared.stacked(&state);
        let cancelled = after && Self::cancel_resize(&mut state);
        drop(state);

        if cancelled {
            self.forward_resize_stop();
        }
        if before != after {
            tracing::debug!(viewport_width, stacked = after, "Dual pane stacking changed");
        }
        before != after
    }

    /// Enter or leave mobile mode. Mobile always stacks.
    pub fn set_mobile(&self, mobile: bool) {
        let cancelled = {
            let mut state = self.shared.state.lock();
            state.mobile = mobile;
            mobile && Self::cancel_resize(&mut state)
        };
        if cancelled {
            self.forward_resize_stop();
        }
    }

    /// Abandon an in-progress resize, restoring the last committed width.
    fn cancel_resize(state: &mut PaneState) -> bool {
        if !state.resizing {
            return false;
        }
        state.resizing = false;
        if state.left_width != state.committed {
            tracing::debug!(discarded = state.left_width, left_width = state.committed, "Resize cancelled by stacking");
            state.left_width = state.committed;
        }
        true
    }

    fn forward_resize_stop(&self) {
        let item_id = self.shared.options.handle.pane_id().to_string();
        self.shared.hooks.forward(&GridEvent::ResizeStop { item_id });
    }

    /// Pane items for the split view.
    pub fn layout(&self) -> Layout {
        let state = self.shared.state.lock();
        let options = &self.shared.options;
        let total = options.total_columns;
        let (min, max) = options.bounds();
        let height = state.height.unwrap_or(options.default_height).max(1);
        let left_width = state.left_width;

        let mut left = LayoutItem::new(LEFT_PANE, 0, 0, left_width, height).with_min_size(min, 1).with_max_size(max, u32::MAX);
        let mut right = LayoutItem::new(RIGHT_PANE, left_width, 0, total - left_width, height)
            .with_min_size(total - max, 1)
            .with_max_size(total - min, u32::MAX);
        left.is_draggable = Some(false);
        right.is_draggable = Some(false);

        match options.handle {
            HandlePosition::Left => {
                left.is_resizable = Some(options.resizable);
                left.resize_handles = Some(vec![ResizeHandle::E]);
                right.is_resizable = Some(false);
                right.resize_handles = Some(Vec::new());
            }
            HandlePosition::Right => {
                left = left.as_static();
                right.is_resizable = Some(options.resizable);
                right.resize_handles = Some(vec![ResizeHandle::W]);
            }
        }
        if !options.resizable {
            left = left.as_static();
        }
        vec![left, right]
    }

    /// Current render plan.
    pub fn view(&self) -> DualPaneView {
        let height = self.height();
        if self.is_stacked() {
            return DualPaneView::Stacked { order: self.shared.options.stack_order.panes(), height };
        }
        DualPaneView::Split { layout: self.layout(), height, resize_label: self.resize_label() }
    }

    /// Restore the default width and delete the persisted value.
    pub fn reset(&self) {
        self.shared.reset();
    }
}

impl Remeasure for DualPaneLayout {
    fn remeasure(&self, container_width: u32) {
        self.shared.state.lock().container_width = container_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    const KEY: &str = "workspace-dual-pane-test";

    fn options() -> DualPaneOptions {
        DualPaneOptions { storage_key: Some(KEY.into()), ..Default::default() }
    }

    fn column_px(cols: u32) -> f32 {
        GridMetrics::new(1200, 12).cell_size(Axis::Horizontal) * cols as f32
    }

    #[test]
    fn test_dragging_handle_narrows_left_pane() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, options());
        assert_eq!((pane.left_width(), pane.right_width()), (4, 8));

        assert!(pane.begin_resize());
        assert!(pane.resize_to(column_px(9)));
        assert_eq!((pane.left_width(), pane.right_width()), (3, 9));
        assert_eq!(pane.resize_label().as_deref(), Some("9/12"));
        // Nothing is written mid-gesture
        assert!(!state.storage().contains(KEY).unwrap());

        pane.end_resize();
        assert_eq!(state.storage().keys().unwrap(), vec![KEY.to_string()]);
        assert_eq!(state.storage().get(KEY).unwrap().as_deref(), Some("3"));
        assert_eq!(pane.resize_label(), None);
    }

    #[test]
    fn test_widths_always_sum_to_total() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, options());
        pane.begin_resize();
        for cols in 0..=14 {
            pane.resize_to(column_px(cols));
            assert_eq!(pane.left_width() + pane.right_width(), 12);
            assert!((2..=10).contains(&pane.left_width()));
        }
        pane.end_resize();
    }

    #[test]
    fn test_viewport_crossing_breakpoint_stacks() {
        let state = DashState::in_memory();
        let options = DualPaneOptions { viewport_width: 1300, ..options() };
        let pane = DualPaneLayout::new(&state, options.clone());
        assert!(matches!(pane.view(), DualPaneView::Split { .. }));

        assert!(pane.set_viewport_width(1100));
        assert_eq!(pane.view(), DualPaneView::Stacked { order: [Pane::Left, Pane::Right], height: 1 });
        assert!(!pane.set_left_width(6));
        assert!(!pane.begin_resize());
        assert_eq!(pane.left_width(), 4);

        let right_first = DualPaneLayout::new(
            &DashState::in_memory(),
            DualPaneOptions { viewport_width: 1100, stack_order: StackOrder::RightFirst, ..options },
        );
        assert!(matches!(right_first.view(), DualPaneView::Stacked { order: [Pane::Right, Pane::Left], .. }));
    }

    #[test]
    fn test_stacking_mid_resize_restores_committed_width() {
        let state = DashState::in_memory();
        let resizing = Arc::new(PlMutex::new(Vec::new()));
        let flags = Arc::clone(&resizing);
        let hooks = InteractionHooks::none().set_resizing(move |value| flags.lock().push(value));
        let widths = Arc::new(PlMutex::new(Vec::new()));
        let log = Arc::clone(&widths);
        let on_change: WidthChangeHandler = Arc::new(move |l, r| log.lock().push((l, r)));
        let options = DualPaneOptions { viewport_width: 1300, ..options() };
        let pane = DualPaneLayout::with_callbacks(&state, options, hooks, Some(on_change));

        assert!(pane.begin_resize());
        assert!(pane.resize_to(column_px(9)));
        assert_eq!(pane.left_width(), 3);

        assert!(pane.set_viewport_width(1100));
        assert_eq!(pane.left_width(), 4);
        assert_eq!(resizing.lock().as_slice(), &[true, false]);
        assert_eq!(pane.resize_label(), None);

        pane.end_resize();
        assert!(pane.set_viewport_width(1300));
        assert_eq!((pane.left_width(), pane.right_width()), (4, 8));
        assert!(!state.storage().contains(KEY).unwrap());
        assert!(widths.lock().is_empty());
        assert_eq!(resizing.lock().len(), 2);
    }

    #[test]
    fn test_entering_mobile_mid_resize_restores_committed_width() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, DualPaneOptions { stacked_on_tablet: false, ..options() });
        assert!(pane.set_left_width(5));
        assert!(pane.begin_resize());
        assert!(pane.resize_to(column_px(9)));

        pane.set_mobile(true);
        pane.set_mobile(false);
        assert_eq!(pane.left_width(), 5);
        assert_eq!(state.storage().get(KEY).unwrap().as_deref(), Some("5"));
        assert!(pane.begin_resize());
    }

    #[test]
    fn test_mobile_forces_stacking() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, DualPaneOptions { stacked_on_tablet: false, viewport_width: 900, ..options() });
        assert!(!pane.is_stacked());
        pane.set_mobile(true);
        assert!(pane.is_stacked());
        assert!(!pane.is_resizable());
    }

    #[test]
    fn test_inverted_bounds_are_ordered() {
        let state = DashState::in_memory();
        let options = DualPaneOptions { min_left_width: 8, max_left_width: 3, initial_left_width: 5, ..options() };
        let pane = DualPaneLayout::new(&state, options);
        assert_eq!(pane.left_width(), 8);
        assert!(!pane.set_left_width(2));
        assert_eq!(pane.right_width(), 4);
    }

    #[test]
    fn test_out_of_range_stored_width_is_ignored() {
        let state = DashState::in_memory();
        state.storage().set(KEY, "11").unwrap();
        assert_eq!(DualPaneLayout::new(&state, options()).left_width(), 4);

        state.storage().set(KEY, "6").unwrap();
        assert_eq!(DualPaneLayout::new(&state, options()).left_width(), 6);
    }

    #[test]
    fn test_reset_is_idempotent_and_silent() {
        let state = DashState::in_memory();
        let calls = Arc::new(PlMutex::new(Vec::new()));
        let log = Arc::clone(&calls);
        let on_change: WidthChangeHandler = Arc::new(move |l, r| log.lock().push((l, r)));
        let pane = DualPaneLayout::with_callbacks(&state, options(), InteractionHooks::none(), Some(on_change));

        assert!(pane.set_left_width(7));
        assert_eq!(calls.lock().as_slice(), &[(7, 5)]);

        assert!(state.registry().reset(ResetFamily::DualPane, KEY));
        assert!(state.registry().reset(ResetFamily::DualPane, KEY));
        assert_eq!(pane.left_width(), 4);
        assert!(!state.storage().contains(KEY).unwrap());
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_reset_uses_default_width_over_initial() {
        let state = DashState::in_memory();
        let options = DualPaneOptions { initial_left_width: 6, default_left_width: Some(4), ..options() };
        let pane = DualPaneLayout::new(&state, options);
        assert_eq!(pane.left_width(), 6);
        pane.reset();
        assert_eq!(pane.left_width(), 4);
    }

    #[test]
    fn test_apply_layout_change_reads_handle_pane() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, options());
        let mut layout = pane.layout();
        layout[1].w = 5;
        assert!(pane.apply_layout_change(&layout));
        assert_eq!(pane.left_width(), 7);
        assert!(!pane.apply_layout_change(&layout));
    }

    #[test]
    fn test_only_handle_pane_is_resizable() {
        let state = DashState::in_memory();
        let right = DualPaneLayout::new(&state, options()).layout();
        assert!(right[0].is_static);
        assert_eq!(right[1].resize_handles, Some(vec![ResizeHandle::W]));
        assert_eq!((right[1].min_w, right[1].max_w), (Some(2), Some(10)));

        let left = DualPaneLayout::new(&state, DualPaneOptions { handle: HandlePosition::Left, ..options() }).layout();
        assert!(!left[0].is_static);
        assert_eq!(left[0].resize_handles, Some(vec![ResizeHandle::E]));
        assert_eq!(left[1].is_resizable, Some(false));
    }

    #[test]
    fn test_height_falls_back_to_default() {
        let state = DashState::in_memory();
        let pane = DualPaneLayout::new(&state, DualPaneOptions { default_height: 25, ..options() });
        assert_eq!(pane.height(), 25);
        pane.set_height(Some(19));
        assert!(pane.layout().iter().all(|item| item.h == 19));
        pane.set_height(None);
        assert_eq!(pane.height(), 25);
    }
}

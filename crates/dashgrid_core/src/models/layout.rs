//! Grid placement models: items, layouts and per-breakpoint layout sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DashError;

/// A named viewport-width class.
///
/// Declaration order is the canonical order, widest first: `lg > md > sm >
/// xs > xxs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// Desktop.
    Lg,
    /// Small desktop / large tablet.
    Md,
    /// Tablet.
    Sm,
    /// Large phone.
    Xs,
    /// Everything narrower.
    Xxs,
}

impl Breakpoint {
    /// All breakpoints, widest first.
    pub const ALL: [Breakpoint; 5] =
        [Breakpoint::Lg, Breakpoint::Md, Breakpoint::Sm, Breakpoint::Xs, Breakpoint::Xxs];

    /// The breakpoint whose layout must be present for a stored set to count.
    pub const PRIMARY: Breakpoint = Breakpoint::Lg;

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lg => "lg",
            Self::Md => "md",
            Self::Sm => "sm",
            Self::Xs => "xs",
            Self::Xxs => "xxs",
        }
    }

    /// Parse from a string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lg" => Some(Self::Lg),
            "md" => Some(Self::Md),
            "sm" => Some(Self::Sm),
            "xs" => Some(Self::Xs),
            "xxs" => Some(Self::Xxs),
            _ => None,
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compass direction of an interactive resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    /// Bottom edge.
    S,
    /// Left edge.
    W,
    /// Right edge.
    E,
    /// Top edge.
    N,
    /// Bottom-left corner.
    Sw,
    /// Top-left corner.
    Nw,
    /// Bottom-right corner.
    Se,
    /// Top-right corner.
    Ne,
}

impl ResizeHandle {
    /// Whether dragging this handle changes the item's width.
    pub fn affects_width(&self) -> bool {
        !matches!(self, Self::S | Self::N)
    }

    /// Whether dragging this handle changes the item's height.
    pub fn affects_height(&self) -> bool {
        !matches!(self, Self::W | Self::E)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One placed widget in grid cell coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Identifier, unique within its container.
    #[serde(alias = "i")]
    pub id: String,
    /// Column of the left edge.
    pub x: u32,
    /// Row of the top edge.
    pub y: u32,
    /// Width in columns.
    pub w: u32,
    /// Height in rows.
    pub h: u32,
    /// Minimum width (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    /// Maximum width (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    /// Minimum height (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    /// Maximum height (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    /// Static items never move or resize and act as obstacles.
    #[serde(default, rename = "static", skip_serializing_if = "is_false")]
    pub is_static: bool,
    /// Per-item drag override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draggable: Option<bool>,
    /// Per-item resize override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_resizable: Option<bool>,
    /// Enabled resize handles. `None` leaves the choice to the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_handles: Option<Vec<ResizeHandle>>,
}

impl LayoutItem {
    /// Create an unconstrained item.
    pub fn new(id: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w: w.max(1),
            h: h.max(1),
            min_w: None,
            max_w: None,
            min_h: None,
            max_h: None,
            is_static: false,
            is_draggable: None,
            is_resizable: None,
            resize_handles: None,
        }
    }

    /// Set the minimum size.
    pub fn with_min_size(mut self, w: u32, h: u32) -> Self {
        self.min_w = Some(w);
        self.min_h = Some(h);
        self
    }

    /// Set the maximum size.
    pub fn with_max_size(mut self, w: u32, h: u32) -> Self {
        self.max_w = Some(w);
        self.max_h = Some(h);
        self
    }

    /// Mark the item static.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the enabled resize handles.
    pub fn with_resize_handles(mut self, handles: impl IntoIterator<Item = ResizeHandle>) -> Self {
        self.resize_handles = Some(handles.into_iter().collect());
        self
    }

    /// Row just below the item.
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Column just right of the item.
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// Whether the occupied cell rectangles of two distinct items intersect.
    pub fn collides(&self, other: &LayoutItem) -> bool {
        if self.id == other.id {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Clamp a candidate width into `[min_w, max_w]` and at least one column.
    pub fn clamp_width(&self, w: u32) -> u32 {
        clamp_span(w, self.min_w, self.max_w)
    }

    /// Clamp a candidate height into `[min_h, max_h]` and at least one row.
    pub fn clamp_height(&self, h: u32) -> u32 {
        clamp_span(h, self.min_h, self.max_h)
    }

    /// Apply the declared size bounds to the current size.
    pub fn clamp_to_bounds(&mut self) {
        self.w = self.clamp_width(self.w);
        self.h = self.clamp_height(self.h);
    }

    /// Make the item fit inside `cols` columns.
    ///
    /// Width is shrunk first, then the item is shifted left.
    pub fn fit_columns(&mut self, cols: u32) {
        let cols = cols.max(1);
        if self.w > cols {
            self.w = cols;
        }
        if self.right() > cols {
            self.x = cols - self.w;
        }
    }

    /// Whether the size honours the declared bounds.
    pub fn within_bounds(&self) -> bool {
        let w_ok = self.min_w.map_or(true, |m| self.w >= m) && self.max_w.map_or(true, |m| self.w <= m);
        let h_ok = self.min_h.map_or(true, |m| self.h >= m) && self.max_h.map_or(true, |m| self.h <= m);
        w_ok && h_ok && self.w >= 1 && self.h >= 1
    }

    /// Whether the item can be dragged given the container-level switch.
    pub fn draggable(&self, container_draggable: bool) -> bool {
        !self.is_static && self.is_draggable.unwrap_or(container_draggable)
    }

    /// Whether the item can be resized given the container-level switch.
    pub fn resizable(&self, container_resizable: bool) -> bool {
        if self.is_static || !self.is_resizable.unwrap_or(container_resizable) {
            return false;
        }
        // An explicit empty handle list disables interactive resize
        self.resize_handles.as_ref().map_or(true, |handles| !handles.is_empty())
    }
}

fn clamp_span(value: u32, min: Option<u32>, max: Option<u32>) -> u32 {
    let mut value = value;
    if let Some(max) = max {
        value = value.min(max);
    }
    if let Some(min) = min {
        value = value.max(min);
    }
    value.max(1)
}

/// Ordered items for one breakpoint. Array order is z-order.
pub type Layout = Vec<LayoutItem>;

/// Lowest occupied row + 1 across a layout (0 when empty).
pub fn layout_bottom(layout: &[LayoutItem]) -> u32 {
    layout.iter().map(LayoutItem::bottom).max().unwrap_or(0)
}

/// Find the first item colliding with `item`.
pub fn first_collision<'a>(layout: &'a [LayoutItem], item: &LayoutItem) -> Option<&'a LayoutItem> {
    layout.iter().find(|other| other.collides(item))
}

/// Check that ids are unique and every item fits `cols` columns.
pub fn validate_layout(layout: &[LayoutItem], cols: u32) -> Result<(), DashError> {
    let mut seen = std::collections::HashSet::new();
    for item in layout {
        if !seen.insert(item.id.as_str()) {
            return Err(DashError::invalid_layout(format!("duplicate item id '{}'", item.id)));
        }
        if item.right() > cols {
            return Err(DashError::invalid_layout(format!(
                "item '{}' spans columns {}..{} but the grid has {cols}",
                item.id,
                item.x,
                item.right()
            )));
        }
    }
    Ok(())
}

/// Mapping from breakpoint to its layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutSet(BTreeMap<Breakpoint, Layout>);

impl LayoutSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the layout for a breakpoint.
    pub fn get(&self, breakpoint: Breakpoint) -> Option<&Layout> {
        self.0.get(&breakpoint)
    }

    /// Get a mutable layout for a breakpoint.
    pub fn get_mut(&mut self, breakpoint: Breakpoint) -> Option<&mut Layout> {
        self.0.get_mut(&breakpoint)
    }

    /// Replace the layout for a breakpoint.
    pub fn insert(&mut self, breakpoint: Breakpoint, layout: Layout) -> Option<Layout> {
        self.0.insert(breakpoint, layout)
    }

    /// Whether the set has a layout for the breakpoint.
    pub fn contains(&self, breakpoint: Breakpoint) -> bool {
        self.0.contains_key(&breakpoint)
    }

    /// Whether the primary breakpoint is present.
    pub fn has_primary(&self) -> bool {
        self.contains(Breakpoint::PRIMARY)
    }

    /// Iterate widest breakpoint first.
    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, &Layout)> {
        self.0.iter().map(|(bp, layout)| (*bp, layout))
    }

    /// Number of breakpoints present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no breakpoint is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Breakpoint, Layout)> for LayoutSet {
    fn from_iter<I: IntoIterator<Item = (Breakpoint, Layout)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_order_is_widest_first() {
        let mut shuffled = vec![Breakpoint::Xs, Breakpoint::Lg, Breakpoint::Xxs, Breakpoint::Sm];
        shuffled.sort();
        assert_eq!(shuffled, vec![Breakpoint::Lg, Breakpoint::Sm, Breakpoint::Xs, Breakpoint::Xxs]);
        assert_eq!(Breakpoint::parse("md"), Some(Breakpoint::Md));
        assert_eq!(Breakpoint::parse("xl"), None);
    }

    #[test]
    fn test_collision_is_rectangle_overlap() {
        let a = LayoutItem::new("a", 0, 0, 3, 2);
        let b = LayoutItem::new("b", 3, 0, 3, 2);
        let c = LayoutItem::new("c", 2, 1, 2, 2);
        assert!(!a.collides(&b));
        assert!(a.collides(&c));
        assert!(b.collides(&c));
        assert!(!a.collides(&a.clone()));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let mut item = LayoutItem::new("m", 0, 0, 9, 1).with_min_size(2, 2).with_max_size(4, 3);
        assert!(!item.within_bounds());
        item.clamp_to_bounds();
        assert_eq!((item.w, item.h), (4, 2));
        assert!(item.within_bounds());
    }

    #[test]
    fn test_fit_columns_shrinks_then_shifts() {
        let mut wide = LayoutItem::new("w", 2, 0, 14, 1);
        wide.fit_columns(12);
        assert_eq!((wide.x, wide.w), (0, 12));

        let mut shifted = LayoutItem::new("s", 10, 0, 4, 1);
        shifted.fit_columns(12);
        assert_eq!((shifted.x, shifted.w), (8, 4));
    }

    #[test]
    fn test_empty_handle_list_disables_resize() {
        let item = LayoutItem::new("p", 0, 0, 4, 1).with_resize_handles([]);
        assert!(!item.resizable(true));
        let item = LayoutItem::new("p", 0, 0, 4, 1).with_resize_handles([ResizeHandle::E]);
        assert!(item.resizable(true));
        assert!(!item.clone().as_static().resizable(true));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = LayoutItem::new("a", 1, 2, 3, 4).with_min_size(1, 1).as_static();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["minW"], 1);
        assert_eq!(json["static"], true);
        assert!(json.get("maxW").is_none());
        assert!(json.get("isDraggable").is_none());
    }

    #[test]
    fn test_layout_set_serializes_by_breakpoint_name() {
        let set: LayoutSet = [(Breakpoint::Lg, vec![LayoutItem::new("a", 0, 0, 1, 1)])]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("lg").is_some());
        let back: LayoutSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
        assert!(back.has_primary());
    }

    #[test]
    fn test_validate_layout_rejects_duplicates_and_overflow() {
        let dup = vec![LayoutItem::new("a", 0, 0, 1, 1), LayoutItem::new("a", 1, 0, 1, 1)];
        assert!(validate_layout(&dup, 12).is_err());
        let overflow = vec![LayoutItem::new("a", 10, 0, 4, 1)];
        assert!(validate_layout(&overflow, 12).is_err());
        assert_eq!(layout_bottom(&overflow), 1);
    }
}

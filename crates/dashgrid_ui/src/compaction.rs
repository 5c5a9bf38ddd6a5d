//! Compaction and collision handling for grid layouts.
//!
//! Items keep their array position (z-order); only coordinates change.
//! Static items are never moved and act as obstacles for everything else.

use dashgrid_core::LayoutItem;

/// Automatic repacking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactType {
    /// Pull items up to the first free row.
    #[default]
    Vertical,
    /// Flow items left to right, wrapping at the column count.
    Horizontal,
    /// Leave items where they were placed.
    None,
}

/// Visit order for compaction: by row, then column, then array position.
fn placement_order(layout: &[LayoutItem]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layout.len()).collect();
    order.sort_by_key(|&i| (layout[i].y, layout[i].x, i));
    order
}

fn obstacles(layout: &[LayoutItem]) -> Vec<LayoutItem> {
    layout.iter().filter(|item| item.is_static).cloned().collect()
}

/// Repack a layout in place.
///
/// `max_rows` caps how far down an item may sit; items taller than the cap
/// are pinned to row 0.
pub fn compact(layout: &mut [LayoutItem], mode: CompactType, cols: u32, max_rows: Option<u32>) {
    match mode {
        CompactType::Vertical => compact_vertical(layout),
        CompactType::Horizontal => compact_horizontal(layout, cols),
        CompactType::None => {}
    }

    if let Some(max_rows) = max_rows {
        for item in layout.iter_mut().filter(|item| !item.is_static) {
            item.y = item.y.min(max_rows.saturating_sub(item.h));
        }
    }
}

fn compact_vertical(layout: &mut [LayoutItem]) {
    let mut placed = obstacles(layout);

    for idx in placement_order(layout) {
        if layout[idx].is_static {
            continue;
        }

        let mut candidate = layout[idx].clone();
        candidate.y = 0;
        // Every collider blocks all rows down to its bottom edge
        while let Some(bottom) = placed.iter().filter(|p| p.collides(&candidate)).map(LayoutItem::bottom).max() {
            candidate.y = bottom;
        }

        layout[idx].y = candidate.y;
        placed.push(candidate);
    }
}

fn compact_horizontal(layout: &mut [LayoutItem], cols: u32) {
    let cols = cols.max(1);
    let mut placed = obstacles(layout);
    let (mut cursor_x, mut row_y, mut row_h) = (0u32, 0u32, 0u32);

    for idx in placement_order(layout) {
        if layout[idx].is_static {
            continue;
        }

        let mut candidate = layout[idx].clone();
        candidate.w = candidate.w.min(cols);

        loop {
            if cursor_x + candidate.w > cols {
                cursor_x = 0;
                row_y += row_h.max(1);
                row_h = 0;
            }
            candidate.x = cursor_x;
            candidate.y = row_y;

            match placed.iter().filter(|p| p.collides(&candidate)).map(LayoutItem::right).max() {
                Some(right) => cursor_x = right,
                None => break,
            }
        }

        cursor_x += candidate.w;
        row_h = row_h.max(candidate.h);

        let item = &mut layout[idx];
        item.x = candidate.x;
        item.y = candidate.y;
        item.w = candidate.w;
        placed.push(candidate);
    }
}

/// Push items down until nothing overlaps the anchor or any static item.
///
/// The anchor keeps its position. Returns `true` if anything moved.
pub fn resolve_collisions(layout: &mut [LayoutItem], anchor_id: &str) -> bool {
    let mut fixed: Vec<LayoutItem> =
        layout.iter().filter(|item| item.is_static || item.id == anchor_id).cloned().collect();
    let mut moved = false;

    for idx in placement_order(layout) {
        let item = &layout[idx];
        if item.is_static || item.id == anchor_id {
            continue;
        }

        let mut candidate = item.clone();
        while let Some(bottom) = fixed.iter().filter(|p| p.collides(&candidate)).map(LayoutItem::bottom).max() {
            candidate.y = bottom;
        }

        if candidate.y != layout[idx].y {
            layout[idx].y = candidate.y;
            moved = true;
        }
        fixed.push(candidate);
    }

    moved
}

/// Move an item to `(x, y)`.
///
/// `x` is clamped so the item stays inside `cols`. When the target overlaps
/// exactly one movable item, that item swaps into the vacated slot; any
/// remaining overlap is pushed down. With `prevent_collision` (or when a
/// static item is in the way) an overlapping move is rejected. Returns `true`
/// if the layout changed.
pub fn move_item(
    layout: &mut [LayoutItem],
    id: &str,
    x: u32,
    y: u32,
    cols: u32,
    prevent_collision: bool,
) -> bool {
    let Some(idx) = layout.iter().position(|item| item.id == id) else {
        return false;
    };
    if layout[idx].is_static {
        return false;
    }

    let old = (layout[idx].x, layout[idx].y);
    let x = x.min(cols.saturating_sub(layout[idx].w));
    if (x, y) == old {
        return false;
    }

    let mut target = layout[idx].clone();
    target.x = x;
    target.y = y;

    let colliders: Vec<usize> = (0..layout.len()).filter(|&i| i != idx && layout[i].collides(&target)).collect();
    if !colliders.is_empty() && (prevent_collision || colliders.iter().any(|&i| layout[i].is_static)) {
        tracing::trace!(item_id = id, x, y, "Rejected colliding move");
        return false;
    }

    layout[idx].x = x;
    layout[idx].y = y;

    if let [other] = colliders[..] {
        let other = &mut layout[other];
        if old.0 + other.w <= cols {
            other.x = old.0;
            other.y = old.1;
        }
    }

    resolve_collisions(layout, id);
    true
}

/// Whether any two items overlap.
pub fn has_overlaps(layout: &[LayoutItem]) -> bool {
    layout.iter().enumerate().any(|(i, a)| layout[i + 1..].iter().any(|b| a.collides(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, x: u32, y: u32, w: u32, h: u32) -> LayoutItem {
        LayoutItem::new(id, x, y, w, h)
    }

    fn pos(layout: &[LayoutItem], id: &str) -> (u32, u32) {
        let item = layout.iter().find(|i| i.id == id).unwrap();
        (item.x, item.y)
    }

    #[test]
    fn test_vertical_pulls_items_up() {
        let mut layout = vec![item("a", 0, 3, 6, 2), item("b", 6, 9, 6, 1), item("c", 0, 8, 6, 1)];
        compact(&mut layout, CompactType::Vertical, 12, None);
        assert_eq!(pos(&layout, "a"), (0, 0));
        assert_eq!(pos(&layout, "c"), (0, 2));
        assert_eq!(pos(&layout, "b"), (6, 0));
        // Array order is untouched
        assert_eq!(layout[1].id, "b");
    }

    #[test]
    fn test_vertical_respects_static_obstacles() {
        let mut layout = vec![item("s", 0, 0, 12, 1).as_static(), item("a", 0, 5, 4, 2)];
        compact(&mut layout, CompactType::Vertical, 12, None);
        assert_eq!(pos(&layout, "s"), (0, 0));
        assert_eq!(pos(&layout, "a"), (0, 1));
    }

    #[test]
    fn test_horizontal_wraps_at_column_count() {
        let mut layout: Vec<_> = (0..5).map(|i| item(&format!("m{i}"), 0, 0, 3, 2)).collect();
        compact(&mut layout, CompactType::Horizontal, 12, None);
        assert_eq!(pos(&layout, "m0"), (0, 0));
        assert_eq!(pos(&layout, "m3"), (9, 0));
        assert_eq!(pos(&layout, "m4"), (0, 2));
        assert!(!has_overlaps(&layout));
    }

    #[test]
    fn test_max_rows_caps_vertical_position() {
        let mut layout: Vec<_> = (0..5).map(|i| item(&format!("m{i}"), 0, 0, 3, 2)).collect();
        compact(&mut layout, CompactType::Horizontal, 12, Some(1));
        assert!(layout.iter().all(|i| i.y == 0));
    }

    #[test]
    fn test_none_leaves_positions() {
        let mut layout = vec![item("a", 2, 7, 2, 2)];
        compact(&mut layout, CompactType::None, 12, None);
        assert_eq!(pos(&layout, "a"), (2, 7));
    }

    #[test]
    fn test_move_swaps_with_single_collider() {
        let mut layout = vec![item("a", 0, 0, 3, 2), item("b", 3, 0, 3, 2)];
        assert!(move_item(&mut layout, "a", 3, 0, 12, false));
        assert_eq!(pos(&layout, "a"), (3, 0));
        assert_eq!(pos(&layout, "b"), (0, 0));
    }

    #[test]
    fn test_move_pushes_down_when_swap_does_not_fit() {
        let mut layout = vec![item("a", 0, 0, 12, 1), item("b", 0, 1, 6, 1), item("c", 6, 1, 6, 1)];
        assert!(move_item(&mut layout, "a", 0, 1, 12, false));
        assert!(!has_overlaps(&layout));
        assert_eq!(pos(&layout, "a"), (0, 1));
    }

    #[test]
    fn test_prevent_collision_rejects_move() {
        let mut layout = vec![item("a", 0, 0, 3, 2), item("b", 3, 0, 3, 2)];
        assert!(!move_item(&mut layout, "a", 2, 0, 12, true));
        assert_eq!(pos(&layout, "a"), (0, 0));
        assert!(move_item(&mut layout, "a", 6, 0, 12, true));
    }

    #[test]
    fn test_static_items_block_moves() {
        let mut layout = vec![item("a", 0, 0, 3, 2), item("s", 3, 0, 3, 2).as_static()];
        assert!(!move_item(&mut layout, "a", 3, 0, 12, false));
        assert!(!move_item(&mut layout, "s", 9, 0, 12, false));
    }

    #[test]
    fn test_move_clamps_to_columns() {
        let mut layout = vec![item("a", 0, 0, 4, 1)];
        assert!(move_item(&mut layout, "a", 11, 0, 12, false));
        assert_eq!(pos(&layout, "a"), (8, 0));
    }
}

//! Pixel-to-cell conversion for resize gestures.
//!
//! Hosts report resize candidates in pixels; components snap them to whole
//! cells with [`snap_to_cells`] before touching any layout.

use dashgrid_core::GRID_CONFIG;

/// Direction a resize handle moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left/right, changes width.
    Horizontal,
    /// Up/down, changes height.
    Vertical,
}

/// Pixel geometry of one grid at one container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub container_width: u32,
    pub cols: u32,
    pub row_height: u32,
    pub margin: [u32; 2],
    pub container_padding: [u32; 2],
}

impl GridMetrics {
    /// Metrics with the dashboard's row height, margin and padding.
    pub fn new(container_width: u32, cols: u32) -> Self {
        Self {
            container_width,
            cols: cols.max(1),
            row_height: GRID_CONFIG.row_height,
            margin: GRID_CONFIG.margin,
            container_padding: GRID_CONFIG.container_padding,
        }
    }

    /// Width of one column in pixels.
    pub fn column_width(&self) -> f32 {
        let gaps = self.margin[0] * (self.cols - 1) + self.container_padding[0] * 2;
        (self.container_width.saturating_sub(gaps) as f32 / self.cols as f32).max(1.0)
    }

    /// Size in pixels of one cell along an axis.
    pub fn cell_size(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.column_width(),
            Axis::Vertical => self.row_height.max(1) as f32,
        }
    }

    /// Pixel width of an item spanning `w` columns.
    pub fn item_width(&self, w: u32) -> f32 {
        let w = w.max(1);
        self.column_width() * w as f32 + (self.margin[0] * (w - 1)) as f32
    }

    /// Pixel height of an item spanning `h` rows.
    pub fn item_height(&self, h: u32) -> u32 {
        let h = h.max(1);
        self.row_height * h + self.margin[1] * (h - 1)
    }
}

/// Convert a pixel size to a whole cell count within `[min, max]`.
pub fn snap_to_cells(pixels: f32, cell_size: f32, min: u32, max: u32) -> u32 {
    let cells = if cell_size > 0.0 && pixels.is_finite() {
        (pixels / cell_size).round().max(0.0) as u32
    } else {
        min
    };
    cells.clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_width_accounts_for_margins() {
        // 12 columns, 11 gaps of 16px
        let metrics = GridMetrics::new(1200, 12);
        assert!((metrics.column_width() - 85.333).abs() < 0.01);
        assert_eq!(metrics.item_height(2), 68 * 2 + 16);
    }

    #[test]
    fn test_snap_rounds_then_clamps() {
        assert_eq!(snap_to_cells(260.0, 100.0, 2, 10), 3);
        assert_eq!(snap_to_cells(240.0, 100.0, 2, 10), 2);
        assert_eq!(snap_to_cells(40.0, 100.0, 2, 10), 2);
        assert_eq!(snap_to_cells(5000.0, 100.0, 2, 10), 10);
        assert_eq!(snap_to_cells(f32::NAN, 100.0, 2, 10), 2);
    }
}

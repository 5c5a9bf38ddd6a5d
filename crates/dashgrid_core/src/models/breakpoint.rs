//! Breakpoint thresholds, column tables and the static preset registry.

use serde::Serialize;

use super::layout::Breakpoint;
use crate::error::DashError;

/// One value per breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakpointTable<T> {
    pub lg: T,
    pub md: T,
    pub sm: T,
    pub xs: T,
    pub xxs: T,
}

impl<T: Copy> BreakpointTable<T> {
    /// Build a table from explicit values, widest first.
    pub const fn new(lg: T, md: T, sm: T, xs: T, xxs: T) -> Self {
        Self { lg, md, sm, xs, xxs }
    }

    /// Build a table holding the same value for every breakpoint.
    pub const fn uniform(value: T) -> Self {
        Self { lg: value, md: value, sm: value, xs: value, xxs: value }
    }

    /// Value for a breakpoint.
    pub fn get(&self, breakpoint: Breakpoint) -> T {
        match breakpoint {
            Breakpoint::Lg => self.lg,
            Breakpoint::Md => self.md,
            Breakpoint::Sm => self.sm,
            Breakpoint::Xs => self.xs,
            Breakpoint::Xxs => self.xxs,
        }
    }

    /// Iterate `(breakpoint, value)` widest first.
    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, T)> + '_ {
        Breakpoint::ALL.into_iter().map(move |bp| (bp, self.get(bp)))
    }
}

/// Pixel thresholds per breakpoint.
pub type Breakpoints = BreakpointTable<u32>;

/// Column counts per breakpoint.
pub type Columns = BreakpointTable<u32>;

/// Pick the widest breakpoint whose threshold the width reaches.
pub fn breakpoint_for_width(width: u32, thresholds: &Breakpoints) -> Breakpoint {
    Breakpoint::ALL
        .into_iter()
        .find(|bp| width >= thresholds.get(*bp))
        .unwrap_or(Breakpoint::Xxs)
}

// ========== Grid Constants ==========

/// Static grid geometry shared by every grid in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridConfig {
    /// Height of one grid row in pixels.
    pub row_height: u32,
    /// Horizontal and vertical gap between items in pixels.
    pub margin: [u32; 2],
    /// Container padding in pixels.
    pub container_padding: [u32; 2],
    /// Default pixel thresholds.
    pub breakpoints: Breakpoints,
    /// Column counts for the main dashboard grid.
    pub main_cols: Columns,
    /// Column counts for nested single-column grids.
    pub nested_cols: Columns,
    /// Column counts for the top metrics row.
    pub top_cols: Columns,
}

/// The dashboard grid geometry.
pub const GRID_CONFIG: GridConfig = GridConfig {
    row_height: 68,
    margin: [16, 16],
    container_padding: [0, 0],
    breakpoints: Breakpoints::new(1200, 996, 768, 480, 0),
    main_cols: Columns::new(12, 12, 12, 1, 1),
    nested_cols: Columns::uniform(1),
    top_cols: Columns::new(4, 4, 2, 1, 1),
};

/// Width in pixels of the fixed (non-adaptive) container class.
pub const FIXED_CONTAINER_WIDTH: u32 = 1280;

// ========== Presets ==========

/// Optional container sizing attached to a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerConfig {
    pub min_width: u32,
    pub max_width: u32,
    /// Fill 100% of the available width within `[min_width, max_width]`.
    pub adaptive: bool,
}

/// How the dashboard container is sized for a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerSizing {
    /// Fill the viewport, clamped to the bounds.
    Adaptive { min_width: u32, max_width: u32 },
    /// Cap at a fixed maximum width class.
    Fixed { max_width: u32 },
}

impl ContainerSizing {
    /// Resolve the container width for a viewport width.
    pub fn resolve(&self, viewport_width: u32) -> u32 {
        match *self {
            Self::Adaptive { min_width, max_width } => viewport_width.clamp(min_width, max_width.max(min_width)),
            Self::Fixed { max_width } => viewport_width.min(max_width),
        }
    }
}

/// A named, immutable breakpoint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakpointPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub breakpoints: Breakpoints,
    pub cols: Columns,
    pub container: Option<ContainerConfig>,
}

impl BreakpointPreset {
    /// Container sizing policy for this preset.
    pub fn container_sizing(&self) -> ContainerSizing {
        match self.container {
            Some(c) if c.adaptive => ContainerSizing::Adaptive { min_width: c.min_width, max_width: c.max_width },
            _ => ContainerSizing::Fixed { max_width: FIXED_CONTAINER_WIDTH },
        }
    }

    /// Breakpoint active at a container width.
    pub fn breakpoint_for(&self, width: u32) -> Breakpoint {
        breakpoint_for_width(width, &self.breakpoints)
    }

    /// Column count at a container width.
    pub fn columns_for(&self, width: u32) -> u32 {
        self.cols.get(self.breakpoint_for(width))
    }
}

const fn preset(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    breakpoints: Breakpoints,
    cols: Columns,
) -> BreakpointPreset {
    BreakpointPreset { id, name, description, breakpoints, cols, container: None }
}

/// Every preset, in menu order. The first entry is the fallback.
pub static BREAKPOINT_PRESETS: [BreakpointPreset; 7] = [
    preset(
        "default",
        "Default",
        "Balanced breakpoints for desktop dashboards",
        Breakpoints::new(1200, 996, 768, 480, 0),
        Columns::new(12, 10, 6, 6, 4),
    ),
    preset(
        "tailwind",
        "Tailwind",
        "Matches the Tailwind CSS screen sizes",
        Breakpoints::new(1024, 768, 640, 480, 0),
        Columns::new(12, 8, 4, 6, 4),
    ),
    preset(
        "material",
        "Material",
        "Material Design layout grid breakpoints",
        Breakpoints::new(1280, 960, 600, 480, 0),
        Columns::new(12, 8, 4, 6, 4),
    ),
    preset(
        "compact",
        "Compact",
        "Switches to smaller layouts earlier",
        Breakpoints::new(1024, 768, 480, 480, 0),
        Columns::new(12, 8, 4, 6, 4),
    ),
    preset(
        "wide",
        "Wide",
        "More columns for large monitors",
        Breakpoints::new(1440, 1200, 768, 480, 0),
        Columns::new(16, 12, 6, 6, 4),
    ),
    preset(
        "mobile-first",
        "Mobile First",
        "Low thresholds tuned for phones and tablets",
        Breakpoints::new(992, 576, 320, 480, 0),
        Columns::new(12, 6, 2, 6, 4),
    ),
    BreakpointPreset {
        id: "experimental",
        name: "Experimental",
        description: "Adaptive container between 1280px and 1680px",
        breakpoints: Breakpoints::new(1200, 996, 768, 480, 0),
        cols: Columns::new(12, 10, 6, 6, 4),
        container: Some(ContainerConfig { min_width: 1280, max_width: 1680, adaptive: true }),
    },
];

/// Id of the fallback preset.
pub const DEFAULT_PRESET_ID: &str = "default";

/// Look up a preset, falling back to the first registry entry.
pub fn get_breakpoint_preset(id: &str) -> &'static BreakpointPreset {
    find_preset(id).unwrap_or(&BREAKPOINT_PRESETS[0])
}

/// Strict preset lookup.
pub fn find_preset(id: &str) -> Result<&'static BreakpointPreset, DashError> {
    BREAKPOINT_PRESETS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| DashError::unknown_preset(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_for_width() {
        let bp = &GRID_CONFIG.breakpoints;
        assert_eq!(breakpoint_for_width(1300, bp), Breakpoint::Lg);
        assert_eq!(breakpoint_for_width(1200, bp), Breakpoint::Lg);
        assert_eq!(breakpoint_for_width(1100, bp), Breakpoint::Md);
        assert_eq!(breakpoint_for_width(800, bp), Breakpoint::Sm);
        assert_eq!(breakpoint_for_width(500, bp), Breakpoint::Xs);
        assert_eq!(breakpoint_for_width(10, bp), Breakpoint::Xxs);
    }

    #[test]
    fn test_unknown_preset_falls_back_to_default() {
        assert_eq!(get_breakpoint_preset("nope").id, DEFAULT_PRESET_ID);
        assert_eq!(get_breakpoint_preset("wide").cols.lg, 16);
        assert!(matches!(find_preset("nope"), Err(DashError::UnknownPreset { .. })));
    }

    #[test]
    fn test_preset_ids_are_unique() {
        let mut ids: Vec<_> = BREAKPOINT_PRESETS.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), BREAKPOINT_PRESETS.len());
    }

    #[test]
    fn test_container_sizing() {
        let adaptive = get_breakpoint_preset("experimental").container_sizing();
        assert_eq!(adaptive.resolve(1000), 1280);
        assert_eq!(adaptive.resolve(1500), 1500);
        assert_eq!(adaptive.resolve(2400), 1680);

        let fixed = get_breakpoint_preset("tailwind").container_sizing();
        assert_eq!(fixed, ContainerSizing::Fixed { max_width: FIXED_CONTAINER_WIDTH });
        assert_eq!(fixed.resolve(2400), 1280);
        assert_eq!(fixed.resolve(900), 900);
    }

    #[test]
    fn test_columns_for_width() {
        let material = get_breakpoint_preset("material");
        assert_eq!(material.columns_for(1300), 12);
        assert_eq!(material.columns_for(1000), 8);
        assert_eq!(material.columns_for(700), 4);
    }
}

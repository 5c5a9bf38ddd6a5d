//! Data models for the Dashgrid layout engine.
//!
//! - `layout` - Breakpoint, LayoutItem, Layout, LayoutSet
//! - `breakpoint` - Grid constants, breakpoint tables and presets

pub mod breakpoint;
pub mod layout;

pub use breakpoint::{
    breakpoint_for_width, find_preset, get_breakpoint_preset, BreakpointPreset, BreakpointTable,
    Breakpoints, Columns, ContainerConfig, ContainerSizing, GridConfig, BREAKPOINT_PRESETS,
    DEFAULT_PRESET_ID, FIXED_CONTAINER_WIDTH, GRID_CONFIG,
};
pub use layout::{
    first_collision, layout_bottom, validate_layout, Breakpoint, Layout, LayoutItem, LayoutSet,
    ResizeHandle,
};

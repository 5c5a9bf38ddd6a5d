//! Layout constants shared by the dashboard components.

/// Viewport thresholds in pixels.
pub mod sizes {
    /// Below this width the dashboard is in mobile mode and grids are inert.
    pub const MOBILE_BREAKPOINT: u32 = 768;
    /// Below this width the navigation sidebar overlays the content.
    pub const OVERLAY_BREAKPOINT: u32 = 1560;
    /// Width of the overlay navigation sidebar.
    pub const OVERLAY_SIDEBAR_WIDTH: u32 = 280;
    /// At or above this width the header shows ten primary items.
    pub const HEADER_WIDE: u32 = 1680;
    /// At or above this width the header shows eight primary items.
    pub const HEADER_MEDIUM: u32 = 1440;
}

/// Delays for deferred actions.
pub mod timing {
    use std::time::Duration;

    /// Grace period before an overlay sidebar closes after pointer-leave.
    pub const HOVER_CLOSE_DELAY: Duration = Duration::from_millis(300);
    /// Debounce for content-growth remeasure nudges.
    pub const REMEASURE_DELAY: Duration = Duration::from_millis(100);
}

/// Column totals used by the workspace split.
pub mod columns {
    /// Columns shared by the sidebar and activities panes.
    pub const WORKSPACE_TOTAL: u32 = 12;
    /// Default activities width.
    pub const ACTIVITIES_DEFAULT: u32 = 8;
    /// Narrowest activities width.
    pub const ACTIVITIES_MIN: u32 = 4;
    /// Widest activities width.
    pub const ACTIVITIES_MAX: u32 = 10;
}

/// Whether a viewport width puts the dashboard in mobile mode.
pub fn is_mobile(viewport_width: u32) -> bool {
    viewport_width < sizes::MOBILE_BREAKPOINT
}

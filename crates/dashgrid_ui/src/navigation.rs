//! Navigation selection state.
//!
//! The header, hover and sidebar navigation surfaces all read one
//! [`NavigationSelection`]. A selection is either a main-content path or a
//! utility-icon path, never both: dispatching either kind replaces the whole
//! value.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use dashgrid_core::DashError;

use crate::layout::sizes::{HEADER_MEDIUM, HEADER_WIDE, OVERLAY_BREAKPOINT, OVERLAY_SIDEBAR_WIDTH};
use crate::layout::timing::HOVER_CLOSE_DELAY;
use crate::timer::DelayedAction;

/// A main-navigation path, at most three levels deep.
pub type NavPath = SmallVec<[String; 3]>;

/// Name of the pseudo section that holds overflowing header items.
pub const MORE_SECTION: &str = "More";
/// Id of the icon that opens the overflow menu.
pub const MORE_ICON: &str = "more";

// ========== Navigation Mode ==========

/// Which surface presents the main navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    #[default]
    Horizontal,
    Hover,
    Sidebar,
}

impl NavigationMode {
    pub const ALL: [NavigationMode; 3] = [Self::Horizontal, Self::Hover, Self::Sidebar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Hover => "hover",
            Self::Sidebar => "sidebar",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavigationMode {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DashError::config(format!("Unknown navigation mode '{s}' (expected horizontal, hover or sidebar)")))
    }
}

// ========== Events ==========

/// A navigation request as emitted by any surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NavigationEvent {
    Main {
        path: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    Icon {
        /// Sub-item path below the icon; empty selects the default.
        path: Vec<String>,
        source: String,
    },
}

impl NavigationEvent {
    /// Build a main event from up to three levels. Empty levels are dropped.
    pub fn from_main(main: &str, sub: Option<&str>, third: Option<&str>, source: Option<&str>) -> Self {
        let path = [Some(main), sub, third].into_iter().flatten().filter(|s| !s.is_empty()).map(str::to_string).collect();
        Self::Main { path, source: source.map(str::to_string) }
    }

    /// Build an icon event.
    pub fn from_icon(icon: &str, sub: Option<&str>) -> Self {
        Self::Icon { path: sub.map(str::to_string).into_iter().collect(), source: icon.to_string() }
    }

    /// `(main, sub, third)` for a main event; empty main otherwise.
    pub fn to_main_triple(&self) -> (String, Option<String>, Option<String>) {
        match self {
            Self::Main { path, .. } => {
                (path.first().cloned().unwrap_or_default(), path.get(1).cloned(), path.get(2).cloned())
            }
            Self::Icon { .. } => (String::new(), None, None),
        }
    }

    /// `(icon, sub)` for an icon event; empty icon otherwise.
    pub fn to_icon_pair(&self) -> (String, Option<String>) {
        match self {
            Self::Icon { path, source } => (source.clone(), path.first().cloned()),
            Self::Main { .. } => (String::new(), None),
        }
    }
}

// ========== Selection ==========

/// What is currently selected. The two domains are exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NavigationSelection {
    #[default]
    None,
    Main {
        path: NavPath,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    Icon {
        icon: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sub: Option<String>,
    },
}

impl NavigationSelection {
    /// The active main path, empty when an icon is selected.
    pub fn main_path(&self) -> &[String] {
        match self {
            Self::Main { path, .. } => path,
            _ => &[],
        }
    }

    /// The active icon path, empty when main navigation is selected.
    pub fn icon_path(&self) -> SmallVec<[&str; 2]> {
        match self {
            Self::Icon { icon, sub } => std::iter::once(icon.as_str()).chain(sub.as_deref()).collect(),
            _ => SmallVec::new(),
        }
    }

    /// The selection as the event that would produce it.
    pub fn to_event(&self) -> Option<NavigationEvent> {
        match self {
            Self::None => None,
            Self::Main { path, source } => Some(NavigationEvent::Main { path: path.to_vec(), source: source.clone() }),
            Self::Icon { icon, sub } => Some(NavigationEvent::from_icon(icon, sub.as_deref())),
        }
    }
}

// ========== Tree ==========

/// One entry of the main navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
    /// Child selected when this item is chosen without a deeper path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_child: Option<String>,
    /// Opens outside the dashboard.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

impl NavItem {
    pub fn leaf(name: &str) -> Self {
        Self { name: name.to_string(), children: Vec::new(), default_child: None, external: false }
    }

    pub fn external(name: &str) -> Self {
        Self { external: true, ..Self::leaf(name) }
    }

    /// A section whose first child is the default.
    pub fn section(name: &str, children: Vec<NavItem>) -> Self {
        let default_child = children.first().map(|c| c.name.clone());
        Self { name: name.to_string(), children, default_child, external: false }
    }

    pub fn child(&self, name: &str) -> Option<&NavItem> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// A utility icon on the right of the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<NavItem>,
}

impl IconItem {
    fn new(id: &str, name: &str, sub_items: Vec<NavItem>) -> Self {
        Self { id: id.to_string(), name: name.to_string(), sub_items }
    }
}

/// Number of main items shown in the header at a viewport width.
pub fn visible_count(viewport_width: u32) -> usize {
    if viewport_width >= HEADER_WIDE {
        10
    } else if viewport_width >= HEADER_MEDIUM {
        8
    } else {
        6
    }
}

/// The configured navigation structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTree {
    pub items: Vec<NavItem>,
    pub icons: Vec<IconItem>,
}

impl Default for NavigationTree {
    fn default() -> Self {
        let items = vec![
            NavItem::leaf("Dashboard"),
            NavItem::section(
                "Planning",
                vec![
                    NavItem::leaf("Clients"),
                    NavItem::section(
                        "Models",
                        ["Portfolios", "Glide", "Scenarios", "Vesting", "Retirement Spending", "Annuities"]
                            .map(NavItem::leaf)
                            .into(),
                    ),
                    NavItem::leaf("Assumptions"),
                ],
            ),
            NavItem::section("ChubbyIntel", ["Dashboard", "Client Overview", "Opportunities"].map(NavItem::leaf).into()),
            NavItem::section("ChubbyFlows", ["Tasks", "Workflows"].map(NavItem::leaf).into()),
            NavItem::section(
                "ChubbyPay",
                ["Plans", "Subscriptions", "Invoices", "Transactions", "Accounts"].map(NavItem::leaf).into(),
            ),
            NavItem::section("Risk", ["Summary", "Questionnaires", "Categories"].map(NavItem::leaf).into()),
            NavItem::leaf("Templates"),
            NavItem::leaf("Client Settings"),
            NavItem::leaf("Integrations"),
            NavItem::external("Admin"),
            NavItem::external("Help"),
        ];

        let icons = vec![
            IconItem::new(MORE_ICON, "More", Vec::new()),
            IconItem::new(
                "sso",
                "SSO to Partner",
                ["Goldman Sachs", "Morgan Stanley", "Charles Schwab", "Fidelity", "TD Ameritrade", "E*TRADE"]
                    .map(NavItem::leaf)
                    .into(),
            ),
            IconItem::new("vault", "Vault", Vec::new()),
            IconItem::new("notifications", "Notifications", ["Notifications", "Notification Settings"].map(NavItem::leaf).into()),
            IconItem::new(
                "settings",
                "Settings",
                vec![
                    NavItem::leaf("Account"),
                    NavItem::leaf("Security"),
                    NavItem::leaf("Teams"),
                    NavItem::leaf("Billing"),
                    NavItem::external("Updates"),
                    NavItem::leaf("Sign Out"),
                ],
            ),
        ];

        Self { items, icons }
    }
}

impl NavigationTree {
    pub fn item(&self, name: &str) -> Option<&NavItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn icon(&self, id: &str) -> Option<&IconItem> {
        self.icons.iter().find(|icon| icon.id == id)
    }

    /// Header items and overflow items at a viewport width.
    pub fn split_at_width(&self, viewport_width: u32) -> (&[NavItem], &[NavItem]) {
        self.items.split_at(visible_count(viewport_width).min(self.items.len()))
    }

    /// Validate a main path and fill unspecified levels with default children.
    ///
    /// A path under [`MORE_SECTION`] names an overflowing top-level item as
    /// its second level.
    pub fn resolve_main(&self, path: &[String]) -> Result<NavPath, DashError> {
        let Some(first) = path.first() else {
            return Err(DashError::navigation("Main navigation needs at least one level"));
        };
        if path.len() > 3 {
            return Err(DashError::navigation(format!("Navigation path '{}' is deeper than three levels", path.join(" / "))));
        }

        let mut resolved = NavPath::new();
        resolved.push(first.clone());

        let mut node = if first == MORE_SECTION {
            let Some(name) = path.get(1) else {
                return Err(DashError::navigation("The More section needs an item"));
            };
            let item = self.item(name).ok_or_else(|| unknown(path))?;
            resolved.push(name.clone());
            item
        } else {
            self.item(first).ok_or_else(|| unknown(path))?
        };

        for name in path.iter().skip(resolved.len()) {
            node = node.child(name).ok_or_else(|| unknown(path))?;
            resolved.push(name.clone());
        }

        while resolved.len() < 3 {
            let Some(default) = node.default_child.as_deref() else {
                break;
            };
            let Some(child) = node.child(default) else {
                break;
            };
            resolved.push(child.name.clone());
            node = child;
        }
        Ok(resolved)
    }

    /// Validate an icon path, defaulting to the icon's first sub-item.
    pub fn resolve_icon(&self, id: &str, sub: Option<&str>) -> Result<Option<String>, DashError> {
        let icon = self.icon(id).ok_or_else(|| DashError::navigation(format!("Unknown navigation icon '{id}'")))?;
        match sub {
            Some(sub) if icon.sub_items.iter().any(|item| item.name == sub) => Ok(Some(sub.to_string())),
            Some(sub) => Err(DashError::navigation(format!("Icon '{id}' has no item '{sub}'"))),
            None => Ok(icon.sub_items.first().map(|item| item.name.clone())),
        }
    }
}

fn unknown(path: &[String]) -> DashError {
    DashError::navigation(format!("Unknown navigation path '{}'", path.join(" / ")))
}

// ========== Navigator ==========

/// Owns the selection and applies navigation events to it.
#[derive(Debug, Clone)]
pub struct Navigator {
    tree: NavigationTree,
    selection: NavigationSelection,
    viewport_width: u32,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(NavigationTree::default())
    }
}

impl Navigator {
    /// Start with the Planning section selected.
    pub fn new(tree: NavigationTree) -> Self {
        let path: NavPath = tree.resolve_main(&["Planning".to_string()]).unwrap_or_default();
        let selection =
            if path.is_empty() { NavigationSelection::None } else { NavigationSelection::Main { path, source: None } };
        Self { tree, selection, viewport_width: 1280 }
    }

    pub fn tree(&self) -> &NavigationTree {
        &self.tree
    }

    pub fn selection(&self) -> &NavigationSelection {
        &self.selection
    }

    pub fn set_viewport_width(&mut self, viewport_width: u32) {
        self.viewport_width = viewport_width;
    }

    /// Items currently in the header.
    pub fn primary_items(&self) -> &[NavItem] {
        self.tree.split_at_width(self.viewport_width).0
    }

    /// Items currently in the More menu.
    pub fn overflow_items(&self) -> &[NavItem] {
        self.tree.split_at_width(self.viewport_width).1
    }

    /// Apply an event. The selection is unchanged if the event is invalid.
    pub fn dispatch(&mut self, event: NavigationEvent) -> Result<&NavigationSelection, DashError> {
        let selection = match event {
            NavigationEvent::Icon { path, source } if source == MORE_ICON => {
                let item = match path.first() {
                    Some(name) => name.clone(),
                    None => self
                        .overflow_items()
                        .first()
                        .map(|item| item.name.clone())
                        .ok_or_else(|| DashError::navigation("Nothing overflows into the More menu"))?,
                };
                let path = self.tree.resolve_main(&[MORE_SECTION.to_string(), item])?;
                NavigationSelection::Main { path, source: Some(MORE_ICON.to_string()) }
            }
            NavigationEvent::Icon { path, source } => {
                let sub = self.tree.resolve_icon(&source, path.first().map(String::as_str))?;
                NavigationSelection::Icon { icon: source, sub }
            }
            NavigationEvent::Main { path, source } => {
                NavigationSelection::Main { path: self.tree.resolve_main(&path)?, source }
            }
        };

        tracing::debug!(?selection, "Navigation changed");
        self.selection = selection;
        Ok(&self.selection)
    }
}

// ========== Overlay Sidebar ==========

/// Visibility of the sidebar navigation on narrow viewports.
///
/// Below the overlay breakpoint the sidebar floats over the content, starts
/// hidden, opens on hover and closes a short while after the pointer leaves.
#[derive(Debug, Clone)]
pub struct OverlaySidebar {
    overlay: bool,
    visible: bool,
    close: DelayedAction,
}

impl OverlaySidebar {
    pub fn new(viewport_width: u32) -> Self {
        let mut sidebar = Self { overlay: false, visible: true, close: DelayedAction::new(HOVER_CLOSE_DELAY) };
        sidebar.set_viewport_width(viewport_width);
        sidebar
    }

    /// Recompute overlay mode. Visibility resets to the mode's default.
    pub fn set_viewport_width(&mut self, viewport_width: u32) {
        self.overlay = viewport_width < OVERLAY_BREAKPOINT;
        self.visible = !self.overlay;
    }

    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sidebar width in pixels.
    pub fn width(&self) -> u32 {
        OVERLAY_SIDEBAR_WIDTH
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Pointer entered the trigger or the sidebar.
    pub fn open_overlay(&mut self) {
        self.close.cancel();
        if self.overlay {
            self.visible = true;
        }
    }

    /// Pointer left; close after the grace period.
    pub fn close_overlay(&mut self, now: Instant) {
        if self.overlay {
            self.close.schedule(now);
        }
    }

    /// Pointer re-entered before the close fired.
    pub fn clear_close_timeout(&mut self) {
        self.close.cancel();
    }

    /// Apply a pending close. Returns whether the sidebar was hidden.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.close.poll(now) {
            self.visible = false;
            return true;
        }
        false
    }
}

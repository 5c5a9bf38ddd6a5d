//! Core types and services for the Dashgrid layout engine.
//!
//! - **error**: Error handling
//! - **models**: Layout items, breakpoints and presets
//! - **services**: Storage, versioned keys, tagged blobs, reset registry
//! - **state**: Shared service container
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use error::{DashError, ErrorInfo};
pub use models::{
    get_breakpoint_preset, Breakpoint, BreakpointPreset, Layout, LayoutItem, LayoutSet,
    ResizeHandle, GRID_CONFIG,
};
pub use services::{
    KeyValueStore, LayoutRegistry, LocalStorage, MemoryStorage, Registration, ResetFamily,
    StorageKeys,
};
pub use state::DashState;

//! Display-side components.
//!
//! Rendering proper lives outside this crate; what lives here is the state
//! each display widget maintains and the event-loop tasks that keep that
//! state current. Frontends observe the state through `watch` channels and
//! draw it however they like.

pub mod status_panel;

pub use status_panel::{elapsed_time_display_string, PanelLabels, StatusPanel};

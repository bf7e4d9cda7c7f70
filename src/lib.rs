//! # Rust Scope Core Library
//!
//! This crate is the core library for the `rust_scope` application: the data
//! and display layer of a microscopy control and visualization tool. It
//! wraps hardware-delivered frames into immutable image values, indexes them
//! by their position within a multi-dimensional acquisition, and keeps
//! display-side status text current through an event bus. Organizing the
//! project as a library lets the same core serve the CLI demo (`main.rs`)
//! and future frontends.
//!
//! ## Crate Structure
//!
//! - **`data`**: The image data model. [`data::Image`] wraps a raw pixel
//!   buffer plus [`data::Coords`] and [`data::Metadata`]; `data::tagged`
//!   converts to and from the legacy tagged-image representation; and
//!   [`data::ImageStore`] collects images keyed by their coords.
//! - **`events`**: The display event bus ([`events::DisplayEvent`],
//!   [`events::EventBus`]) connecting the acquisition side to display
//!   components.
//! - **`display`**: Display-side components, currently the
//!   [`display::StatusPanel`] that renders pixel/FPS/countdown/status text.
//! - **`config`**: Strongly-typed application configuration loaded from TOML
//!   files and the environment. See [`config::ScopeConfig`].
//! - **`tracing_setup`**: Structured logging initialization.
//! - **`error`**: The custom [`error::ScopeError`] enum for centralized
//!   error handling across the application.

pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod events;
pub mod tracing_setup;

pub use error::{AppResult, ScopeError};

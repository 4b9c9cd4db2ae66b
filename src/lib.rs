//! Filter-and-aggregate engine for real-estate listing tables.
//!
//! The binary wraps this library in an egui dashboard; everything with
//! actual logic lives here so it can be tested without a window.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod state;

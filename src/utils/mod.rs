//! Utility Module
//!
//! - [`time`]: frame clock and step clamping
//! - [`poll`]: single-shot polling of futures from the frame loop

pub mod poll;
pub mod time;

pub use poll::poll_once;
pub use time::{Timer, clamp_dt};

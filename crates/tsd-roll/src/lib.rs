//! Sliding-window (x, y) sample generation for time-series tables.

pub mod engine;
pub mod error;
pub mod summary;

pub use engine::{Channels, WindowPair, resolve_channels, roll};
pub use error::{Result, RollError};
pub use summary::{EntitySamples, RollSummary};

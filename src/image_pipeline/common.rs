//! Common utilities module
//!
//! Error type and cancellation shared across the render pipeline.

pub mod cancellation;
pub mod error;

pub use cancellation::CancellationToken;
pub use error::{RenderError, Result};

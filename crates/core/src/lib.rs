//! # Stride Core
//!
//! Domain types, traits, and error definitions for the Stride agent
//! framework. This crate defines the contracts the other crates implement
//! against: the driver boundary (ask a model for text or tool calls) and
//! the tool boundary (a named, schema-described capability).
//!
//! All crates depend inward on core; implementations are swappable and
//! easy to stub in tests.

pub mod driver;
pub mod error;
pub mod message;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use driver::{Driver, DriverInput, DriverResponse, ToolChoice, Usage};
pub use error::{DriverError, Error, Result, ToolError};
pub use message::{Message, Role, ToolCall};
pub use tool::{ParamSpec, ParamType, Tool, ToolSchema};

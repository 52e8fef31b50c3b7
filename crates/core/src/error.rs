//! Error types for the Stride domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! (driver, tool) has its own enum; agent-level failures live on the
//! top-level `Error`.

use thiserror::Error;

/// The top-level error type for all Stride operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Driver errors ---
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The model requested a tool that is not in the agent's catalog.
    /// Always fatal — a contract violation, not a transient fault.
    #[error("Tool call does not match any registered tool: {name}")]
    ToolMismatch { name: String },

    /// No result was produced within the iteration budget.
    #[error("Maximum number of iterations reached ({limit})")]
    MaxIterationsExceeded { limit: u32 },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Model not supported by this driver: {0}")]
    ModelNotSupported(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(String),
}

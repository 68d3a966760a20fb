//! Typed error taxonomy for the traversal engine.
//!
//! Only [`Error::ConnectionExhausted`] (and host readiness, checked before the
//! run starts) may abort a whole run. Every other variant is caught at the
//! smallest enclosing scope — leaf, category, or entry — and converted into a
//! recorded outcome. An empty discovery is not an error at all; it is logged
//! and the category is treated as leaf-only.

use thiserror::Error;

/// Errors surfaced by the traversal engine.
#[derive(Debug, Error)]
pub enum Error {
    /// All candidate CDP endpoints failed across every sweep.
    #[error("all CDP endpoints exhausted after {attempts} connection attempts")]
    ConnectionExhausted { attempts: usize },

    /// A top-level entry's disclosure panel never became visible.
    #[error("disclosure panel for entry '{entry}' never became visible")]
    LocatorTimeout { entry: String },

    /// Activating a leaf item raised a hard error.
    #[error("leaf activation failed: {0}")]
    Execution(String),

    /// The artifact could not be persisted. The leaf still counts as visited.
    #[error("artifact capture failed: {0}")]
    Capture(String),

    /// A page or element operation failed at the transport level.
    #[error("page operation failed: {0}")]
    Page(String),

    /// DevTools protocol error from the underlying browser connection.
    #[error("devtools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// The host application window is not ready for interaction.
    #[error("host application window is not ready")]
    HostNotReady,

    /// The host application could not be switched to online mode.
    #[error("host application did not reach online mode")]
    ModeSwitch,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/*
[INPUT]:  Error sources (configuration, state machine, backends, RPC targets, storage)
[OUTPUT]: Structured error kinds with classification helpers
[POS]:    Error handling layer - unified error type for the entire crate
[UPDATE]: When adding new error sources or error kinds
*/

use thiserror::Error;

/// Main error type for walletmux
#[derive(Error, Debug)]
pub enum WalletError {
    /// Malformed or missing required configuration
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Adapter or plugin namespace does not match the configured chain
    #[error("Incompatible namespace: {0}")]
    IncompatibleNamespace(String),

    /// Adapter or plugin name collision
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// Operation attempted in a state that forbids it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation issued before the required initialization
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Reference to something that was never registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation requires an active connection
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// The connected adapter is not supported by a plugin.
    ///
    /// Swallowed by the hub during plugin activation and deactivation.
    #[error("Adapter not supported by plugin: {0}")]
    UnsupportedAdapter(String),

    /// Adapter did not declare the capability needed for the operation
    #[error("Adapter {adapter} does not support {capability}")]
    UnsupportedOperation { adapter: String, capability: String },

    /// JSON-RPC error object returned by a backend or RPC target
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    /// Request reached the end of a pipeline without being answered
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Storage collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Opaque backend connector failure
    #[error("Connector error: {0}")]
    Connector(String),

    /// Plugin failure other than an unsupported adapter
    #[error("Plugin error: {0}")]
    Plugin(String),
}

impl WalletError {
    /// Check if this is the reserved plugin error that the hub swallows
    pub fn is_unsupported_adapter(&self) -> bool {
        matches!(self, WalletError::UnsupportedAdapter(_))
    }

    /// Check if the error was caused by the current connection state
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            WalletError::InvalidState(_) | WalletError::NotReady(_) | WalletError::NotConnected(_)
        )
    }

    /// JSON-RPC error code, if the error carries one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            WalletError::Rpc { code, .. } => Some(*code),
            WalletError::MethodNotFound(_) => Some(-32601),
            WalletError::InvalidParams(_) => Some(-32602),
            _ => None,
        }
    }

    pub(crate) fn unsupported(adapter: &str, capability: impl std::fmt::Display) -> Self {
        WalletError::UnsupportedOperation {
            adapter: adapter.to_string(),
            capability: capability.to_string(),
        }
    }
}

/// Result type alias for walletmux operations
pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_adapter_is_checked_by_kind() {
        assert!(WalletError::UnsupportedAdapter("auth".into()).is_unsupported_adapter());
        assert!(!WalletError::Plugin("boom".into()).is_unsupported_adapter());
    }

    #[test]
    fn test_state_errors() {
        assert!(WalletError::InvalidState("connecting".into()).is_state_error());
        assert!(WalletError::NotConnected("x".into()).is_state_error());
        assert!(!WalletError::NotFound("x".into()).is_state_error());
    }

    #[test]
    fn test_rpc_code() {
        let err = WalletError::Rpc {
            code: 4902,
            message: "Unrecognized chain".into(),
        };
        assert_eq!(err.rpc_code(), Some(4902));
        assert_eq!(WalletError::MethodNotFound("foo".into()).rpc_code(), Some(-32601));
        assert_eq!(WalletError::Storage("x".into()).rpc_code(), None);
    }
}

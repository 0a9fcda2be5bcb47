use thiserror::Error;

/// Unified error type for the vela workspace.
///
/// Transport and decode failures are informational: connectors report them on
/// their error stream and keep running. Configuration and bind failures are
/// the only fatal kinds, surfaced at startup.
#[derive(Debug, Error)]
pub enum VelaError {
    /// Invalid configuration detected before the pipeline starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to dial or maintain a transport connection.
    #[error("{connector} transport: {msg}")]
    Transport {
        /// Connector tag that hit the failure.
        connector: &'static str,
        /// Human-readable failure description.
        msg: String,
    },

    /// A vendor payload could not be decoded into a [`crate::Trade`].
    #[error("{connector} decode: {msg}")]
    Decode {
        /// Connector tag that received the payload.
        connector: &'static str,
        /// What was wrong with the payload.
        msg: String,
    },

    /// A required credential environment variable is not set.
    #[error("{connector}: {var} not set")]
    MissingCredential {
        /// Connector tag requiring the credential.
        connector: &'static str,
        /// Name of the missing environment variable.
        var: &'static str,
    },

    /// A subscription request arrived without a symbol.
    #[error("symbol required")]
    SymbolRequired,

    /// A subscriber asked for a window size this instance does not serve.
    #[error("requested interval {requested_ms}ms not supported; engine runs {engine_ms}ms windows")]
    IntervalMismatch {
        /// Interval the subscriber asked for, in milliseconds.
        requested_ms: i64,
        /// Interval this engine instance aggregates at, in milliseconds.
        engine_ms: i64,
    },
}

impl VelaError {
    /// Helper: build a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Helper: build a `Transport` error for a connector tag.
    pub fn transport(connector: &'static str, msg: impl Into<String>) -> Self {
        Self::Transport {
            connector,
            msg: msg.into(),
        }
    }

    /// Helper: build a `Decode` error for a connector tag.
    pub fn decode(connector: &'static str, msg: impl Into<String>) -> Self {
        Self::Decode {
            connector,
            msg: msg.into(),
        }
    }

    /// Helper: build a `MissingCredential` error.
    #[must_use]
    pub const fn missing_credential(connector: &'static str, var: &'static str) -> Self {
        Self::MissingCredential { connector, var }
    }
}

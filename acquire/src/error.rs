use std::time::Duration;

use thiserror::Error;

/// Outcomes a DRM session may report back to the engine.
///
/// Only [`NotProvisioned`](SessionError::NotProvisioned) and
/// [`Denied`](SessionError::Denied) participate in the recovery logic;
/// anything else a session implementation needs to surface goes through
/// [`Failed`](SessionError::Failed) and is treated as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("device is not provisioned")]
    NotProvisioned,
    #[error("request denied by server")]
    Denied,
    #[error("session failure: {0}")]
    Failed(String),
}

/// Errors from a single [`TransportJob`](crate::TransportJob).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Io(String),
    #[error("no terminal state within {0:?}")]
    TimedOut(Duration),
    #[error("transfer worker dropped without a result")]
    Canceled,
}

/// Errors from unwrapping a framed license response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("enveloped response body is not valid UTF-8")]
    NotText,
    #[error("unsupported envelope version, expected 1.x")]
    UnsupportedVersion,
    #[error("could not locate drm message in enveloped response")]
    MissingTerminator,
}

/// Terminal outcomes of a license or provisioning transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    // ── Transport ─────────────────────────────────────────────────────
    #[error("no response from server: {0}")]
    NoResponse(TransportError),

    // ── Protocol ──────────────────────────────────────────────────────
    #[error("malformed server response: {0}")]
    MalformedResponse(EnvelopeError),

    // ── Device state ──────────────────────────────────────────────────
    #[error("server denied the provisioning request")]
    ProvisionDenied,
    #[error("server rejected the key request")]
    KeyDenied,
    #[error("provisioning retries exhausted after {0} attempts")]
    RetryExhausted(u32),

    // ── Session ───────────────────────────────────────────────────────
    #[error("drm session failure: {0}")]
    Session(SessionError),
}

impl From<EnvelopeError> for AcquireError {
    fn from(e: EnvelopeError) -> Self {
        Self::MalformedResponse(e)
    }
}

/// Type alias for results that may return an [`AcquireError`].
pub type AcquireResult<T> = std::result::Result<T, AcquireError>;

use crate::constants::{DEFAULT_MAX_PROVISION_ATTEMPTS, DEFAULT_MAX_RESTARTS};
use crate::transport::PollPolicy;

/**
    Key challenge obtained from a DRM session.

    The request bytes are opaque to the engine; only the session and the
    license server interpret them. Sessions may attach a server URL hint,
    but key requests are always posted to the caller-supplied license
    server URL — the hint is carried for the caller's benefit only.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    pub data: Vec<u8>,
    pub default_url: Option<String>,
}

impl KeyRequest {
    pub fn new(data: Vec<u8>) -> Self {
        KeyRequest {
            data,
            default_url: None,
        }
    }
}

/**
    Signed provisioning payload obtained from a DRM session.

    Unlike key requests, the server-suggested default URL is authoritative:
    the engine posts there and never substitutes its own endpoint.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub data: Vec<u8>,
    pub default_url: String,
}

impl ProvisionRequest {
    pub fn new(data: Vec<u8>, default_url: impl Into<String>) -> Self {
        ProvisionRequest {
            data,
            default_url: default_url.into(),
        }
    }
}

/**
    Successful outcome of a license transaction.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /**
        The session accepted the key response; keys are installed.
    */
    Granted,
    /**
        The server rejected the key request. Reported as a success by
        default because the legacy contract expects the caller's event
        path to handle server-side denial asynchronously; see
        [`AcquireConfig::denial_is_error`].
    */
    Denied,
}

/**
    Tunables for a license transaction.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireConfig {
    /**
        Poll cadence and response deadline for each POST.
    */
    pub poll: PollPolicy,
    /**
        Whole-transaction restarts allowed after a key response reports
        the device unprovisioned. Exceeding it fails with
        `RetryExhausted` instead of looping on a server that perpetually
        reports staleness.
    */
    pub max_restarts: u32,
    /**
        Provisioning recoveries allowed while obtaining a single key
        request from the session.
    */
    pub max_provision_attempts: u32,
    /**
        When true, a denied key response fails the transaction with
        `KeyDenied` instead of the legacy informational
        [`Acquisition::Denied`] success.
    */
    pub denial_is_error: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        AcquireConfig {
            poll: PollPolicy::default(),
            max_restarts: DEFAULT_MAX_RESTARTS,
            max_provision_attempts: DEFAULT_MAX_PROVISION_ATTEMPTS,
            denial_is_error: false,
        }
    }
}

use std::time::Duration;

/// User-Agent sent on every key and provisioning POST.
pub const USER_AGENT: &str = "Widevine CDM v1.0";

/// Query parameter carrying the signed provisioning payload.
pub const SIGNED_REQUEST_PARAM: &str = "signedRequest";

/// Tag opening a framed license response body.
pub const ENVELOPE_TAG: &str = "GLS/";

/// The only envelope major version this engine accepts.
pub const ENVELOPE_TAG_V1: &str = "GLS/1.";

/// Blank line separating envelope headers from the license payload.
pub const ENVELOPE_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Cadence at which an in-flight POST is polled for completion.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wall-clock ceiling after which an in-flight POST is abandoned.
pub const DEFAULT_RESPONSE_DEADLINE: Duration = Duration::from_millis(5000);

/// Whole-transaction restarts allowed after a stale key response.
pub const DEFAULT_MAX_RESTARTS: u32 = 3;

/// Provisioning recoveries allowed while obtaining a single key request.
pub const DEFAULT_MAX_PROVISION_ATTEMPTS: u32 = 3;

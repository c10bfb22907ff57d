use crate::error::SessionError;
use crate::types::{KeyRequest, ProvisionRequest};

/// Capability interface over a local DRM session.
///
/// The engine drives exactly four operations: building key and
/// provisioning requests, and consuming the matching server responses.
/// Everything else a platform session can do (challenge construction,
/// key storage, crypto) stays behind this trait.
///
/// Error contract per call:
/// - `key_request`: may report [`SessionError::NotProvisioned`]; the engine
///   recovers by provisioning and retrying.
/// - `provide_key_response`: may report `NotProvisioned` (the response
///   invalidated the certificate — the whole transaction restarts) or
///   [`SessionError::Denied`].
/// - `provision_request`: the recovery primitive; it cannot itself report
///   `NotProvisioned`. Any error here is fatal.
/// - `provide_provision_response`: may report `Denied`, which is terminal
///   for the provisioning attempt.
///
/// [`SessionError::Failed`] is fatal from every call.
pub trait DrmSession {
    /// Build a key challenge for the given content identifier.
    fn key_request(&mut self, content_id: &[u8]) -> Result<KeyRequest, SessionError>;

    /// Consume a license server response (envelope already stripped).
    fn provide_key_response(&mut self, payload: &[u8]) -> Result<(), SessionError>;

    /// Build a signed provisioning request.
    fn provision_request(&mut self) -> Result<ProvisionRequest, SessionError>;

    /// Consume a provisioning server response.
    fn provide_provision_response(&mut self, payload: &[u8]) -> Result<(), SessionError>;
}

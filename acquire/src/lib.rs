//! Client-side DRM license/provisioning transaction engine.
//!
//! Sits between an opaque local DRM session (anything implementing
//! [`DrmSession`]) and a remote license/provisioning server reachable
//! over HTTP, and drives the nested retry state machine that acquires
//! decryption licenses, re-provisioning the device transparently when
//! the session reports it is not yet provisioned.
//!
//! Typical usage:
//! ```ignore
//! let transport = HttpTransport::new();
//! let requester = KeyRequester::new(&transport, "https://license.example/rights");
//!
//! // session: any DrmSession implementation (platform CDM, test fake, ...)
//! match requester.acquire(&mut session, content_id).await? {
//!     Acquisition::Granted => { /* keys installed, start playback */ }
//!     Acquisition::Denied => { /* legacy informational denial */ }
//! }
//! ```

mod constants;
pub mod envelope;
mod error;
mod license;
mod provision;
mod session;
mod transport;
mod types;

#[cfg(test)]
mod testing;

pub use self::constants::{
    DEFAULT_MAX_PROVISION_ATTEMPTS, DEFAULT_MAX_RESTARTS, DEFAULT_POLL_INTERVAL,
    DEFAULT_RESPONSE_DEADLINE, USER_AGENT,
};
pub use self::error::{AcquireError, AcquireResult, EnvelopeError, SessionError, TransportError};
pub use self::license::KeyRequester;
pub use self::provision::ProvisionRequester;
pub use self::session::DrmSession;
pub use self::transport::{
    HttpTransport, JobState, PollPolicy, PostRequest, Transport, TransportJob, wait_for_body,
};
pub use self::types::{AcquireConfig, Acquisition, KeyRequest, ProvisionRequest};

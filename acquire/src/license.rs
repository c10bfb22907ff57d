use tracing::{error, info};

use crate::envelope;
use crate::error::{AcquireError, AcquireResult, SessionError};
use crate::provision::ProvisionRequester;
use crate::session::DrmSession;
use crate::transport::{PostRequest, Transport, wait_for_body};
use crate::types::{AcquireConfig, Acquisition, KeyRequest};

/// Steps of a single license attempt, in order.
enum Step {
    RequestKey,
    Post(KeyRequest),
    Unwrap(Vec<u8>),
    Provide(Vec<u8>),
}

/// How a single attempt ended.
enum Attempt {
    Complete(Acquisition),
    /// The key response reported the device unprovisioned after a key
    /// request had already been built; the request may now be stale, so
    /// the whole transaction runs again from the top.
    Restart,
}

/// Runs license transactions against one license server.
///
/// `acquire` drives the full key exchange for a content identifier:
/// build a challenge, post it, unwrap the response envelope, feed the
/// payload back to the session, recovering transparently from
/// "not provisioned" at either end of the exchange, within the
/// configured retry bounds.
pub struct KeyRequester<'t, T: Transport + ?Sized> {
    transport: &'t T,
    server_url: String,
    headers: Vec<(String, String)>,
    config: AcquireConfig,
}

impl<'t, T: Transport + ?Sized> KeyRequester<'t, T> {
    pub fn new(transport: &'t T, server_url: impl Into<String>) -> Self {
        KeyRequester {
            transport,
            server_url: server_url.into(),
            headers: Vec::new(),
            config: AcquireConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AcquireConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an extra header to every key POST.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Acquire a license for `content_id` into `session`.
    ///
    /// Steps within one attempt are strictly sequential; no two POSTs are
    /// ever in flight at once for the same transaction.
    pub async fn acquire<S: DrmSession + ?Sized>(
        &self,
        session: &mut S,
        content_id: &[u8],
    ) -> AcquireResult<Acquisition> {
        let mut restarts = 0u32;
        loop {
            match self.attempt(session, content_id).await? {
                Attempt::Complete(outcome) => return Ok(outcome),
                Attempt::Restart => {
                    restarts += 1;
                    if restarts > self.config.max_restarts {
                        return Err(AcquireError::RetryExhausted(restarts));
                    }
                }
            }
        }
    }

    /// One pass through the attempt steps.
    async fn attempt<S: DrmSession + ?Sized>(
        &self,
        session: &mut S,
        content_id: &[u8],
    ) -> AcquireResult<Attempt> {
        let mut step = Step::RequestKey;
        loop {
            step = match step {
                Step::RequestKey => Step::Post(self.request_key(session, content_id).await?),
                Step::Post(request) => {
                    let mut post = PostRequest::key(&self.server_url, request.data);
                    for (name, value) in &self.headers {
                        post = post.header(name, value);
                    }
                    let job = self.transport.post(post);
                    let body = wait_for_body(job, self.config.poll).await.map_err(|e| {
                        error!("no response from license server: {e}");
                        AcquireError::NoResponse(e)
                    })?;
                    Step::Unwrap(body)
                }
                Step::Unwrap(body) => {
                    let payload = envelope::unwrap(&body, true).inspect_err(|e| {
                        error!("invalid server response: {e}");
                    })?;
                    Step::Provide(payload.to_vec())
                }
                Step::Provide(payload) => {
                    return match session.provide_key_response(&payload) {
                        Ok(()) => Ok(Attempt::Complete(Acquisition::Granted)),
                        Err(SessionError::NotProvisioned) => {
                            info!("key response invalidated the certificate, reprovisioning");
                            self.provisioner().run(session).await?;
                            Ok(Attempt::Restart)
                        }
                        Err(SessionError::Denied) if self.config.denial_is_error => {
                            Err(AcquireError::KeyDenied)
                        }
                        Err(SessionError::Denied) => {
                            // Legacy contract: denial of key delivery is
                            // informational; the caller's event path owns it.
                            error!("server rejected the key request");
                            Ok(Attempt::Complete(Acquisition::Denied))
                        }
                        Err(e) => Err(AcquireError::Session(e)),
                    };
                }
            };
        }
    }

    /// Obtain a key request, provisioning the device as needed (bounded).
    async fn request_key<S: DrmSession + ?Sized>(
        &self,
        session: &mut S,
        content_id: &[u8],
    ) -> AcquireResult<KeyRequest> {
        let mut attempts = 0u32;
        loop {
            match session.key_request(content_id) {
                Ok(request) => return Ok(request),
                Err(SessionError::NotProvisioned) => {
                    attempts += 1;
                    if attempts > self.config.max_provision_attempts {
                        return Err(AcquireError::RetryExhausted(attempts));
                    }
                    info!("invalid certificate, reprovisioning");
                    self.provisioner().run(session).await?;
                }
                Err(e) => return Err(AcquireError::Session(e)),
            }
        }
    }

    fn provisioner(&self) -> ProvisionRequester<'t, T> {
        ProvisionRequester::new(self.transport).with_policy(self.config.poll)
    }
}

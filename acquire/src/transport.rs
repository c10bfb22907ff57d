use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_DEADLINE, SIGNED_REQUEST_PARAM, USER_AGENT,
};
use crate::error::TransportError;

/**
    One wire-ready HTTP POST.

    The two constructors encode the header sets of the license protocol;
    extra caller headers can be appended on top of either.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub url: String,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl PostRequest {
    /**
        Key challenge POST: raw request bytes to the caller-supplied
        license server URL.
    */
    pub fn key(url: impl Into<String>, challenge: Vec<u8>) -> Self {
        PostRequest {
            url: url.into(),
            body: challenge,
            headers: vec![
                ("User-Agent".into(), USER_AGENT.into()),
                ("Connection".into(), "close".into()),
            ],
        }
    }

    /**
        Provisioning POST: empty body, signed payload carried as the
        `signedRequest` query parameter of the server-suggested URL.

        The payload text is appended verbatim (no percent-encoding); the
        separator respects a query string already present in the default
        URL.
    */
    pub fn provisioning(default_url: &str, signed_request: &[u8]) -> Self {
        let payload = String::from_utf8_lossy(signed_request);
        let separator = if default_url.contains('?') { '&' } else { '?' };
        PostRequest {
            url: format!("{default_url}{separator}{SIGNED_REQUEST_PARAM}={payload}"),
            body: Vec::new(),
            headers: vec![
                ("Accept".into(), "*/*".into()),
                ("User-Agent".into(), USER_AGENT.into()),
                ("Content-Type".into(), "application/json".into()),
            ],
        }
    }

    /**
        Append an extra header.
    */
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Non-blocking view of an in-flight POST.
#[derive(Debug)]
pub enum JobState {
    Pending,
    Body(Vec<u8>),
    Failed(TransportError),
}

/// One in-flight HTTP POST, owned by the transaction that created it.
///
/// Exactly one network request is issued per job and a job is never
/// retried internally; retry is the caller's responsibility. The worker
/// reports through a one-shot channel, so a terminal [`JobState`] is
/// yielded once and polling stops there.
#[derive(Debug)]
pub struct TransportJob {
    rx: oneshot::Receiver<Result<Vec<u8>, TransportError>>,
    started: Instant,
    worker: Option<JoinHandle<()>>,
}

impl TransportJob {
    /// Wrap the receiving half of a worker's result channel.
    pub fn from_receiver(rx: oneshot::Receiver<Result<Vec<u8>, TransportError>>) -> Self {
        TransportJob {
            rx,
            started: Instant::now(),
            worker: None,
        }
    }

    /// Attach the worker task handle so the job can be aborted.
    pub fn with_worker(mut self, handle: JoinHandle<()>) -> Self {
        self.worker = Some(handle);
        self
    }

    /// Build an already-completed job.
    pub fn ready(result: Result<Vec<u8>, TransportError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self::from_receiver(rx)
    }

    /// Poll for completion without blocking. Safe to call repeatedly
    /// while the job is pending.
    pub fn poll(&mut self) -> JobState {
        match self.rx.try_recv() {
            Ok(Ok(body)) => JobState::Body(body),
            Ok(Err(e)) => JobState::Failed(e),
            Err(TryRecvError::Empty) => JobState::Pending,
            Err(TryRecvError::Closed) => JobState::Failed(TransportError::Canceled),
        }
    }

    /// Wall-clock time since the POST was issued.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Abort the worker task. The network request may already have
    /// reached the server; its result is discarded either way.
    pub fn abort(self) {
        if let Some(worker) = self.worker {
            worker.abort();
        }
    }
}

/**
    Poll cadence and response deadline for [`wait_for_body`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_RESPONSE_DEADLINE,
        }
    }
}

/// Poll a job at the policy's cadence until a body arrives, the job
/// fails, or the deadline elapses.
///
/// A job that reaches the deadline without a terminal state is aborted
/// and reported as [`TransportError::TimedOut`]; nothing it produces
/// afterwards is shared back into transaction state.
pub async fn wait_for_body(
    mut job: TransportJob,
    policy: PollPolicy,
) -> Result<Vec<u8>, TransportError> {
    loop {
        match job.poll() {
            JobState::Body(body) => {
                debug!("response length={}", body.len());
                return Ok(body);
            }
            JobState::Failed(e) => return Err(e),
            JobState::Pending => {}
        }
        if job.elapsed() >= policy.deadline {
            job.abort();
            return Err(TransportError::TimedOut(policy.deadline));
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Issues a POST and exposes the in-flight request as a pollable job.
pub trait Transport: Send + Sync {
    fn post(&self, request: PostRequest) -> TransportJob;
}

/// Production transport backed by a shared reqwest client.
///
/// Each POST runs on its own spawned task; must be used from within a
/// tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: PostRequest) -> TransportJob {
        debug!("posting {} bytes to {}", request.body.len(), request.url);
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        let worker = tokio::spawn(async move {
            let _ = tx.send(execute(client, request).await);
        });
        TransportJob::from_receiver(rx).with_worker(worker)
    }
}

async fn execute(client: reqwest::Client, request: PostRequest) -> Result<Vec<u8>, TransportError> {
    let mut builder = client.post(&request.url).body(request.body);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;

    // A body is only accepted on exactly 200, not on any 2xx.
    let status = response.status().as_u16();
    if status != 200 {
        return Err(TransportError::Status(status));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(body.to_vec())
}

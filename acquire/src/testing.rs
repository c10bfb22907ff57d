//! Scripted session and transport doubles shared by the transaction tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::{SessionError, TransportError};
use crate::session::DrmSession;
use crate::transport::{PostRequest, Transport, TransportJob};
use crate::types::{KeyRequest, ProvisionRequest};

/// Session double driven by per-call expectation queues.
///
/// Each trait call pops the next scripted result for that operation and
/// panics if the test under-scripted it. Delivered payloads are recorded
/// for assertions.
#[derive(Default)]
pub struct MockSession {
    key_requests: VecDeque<Result<KeyRequest, SessionError>>,
    key_responses: VecDeque<Result<(), SessionError>>,
    provision_requests: VecDeque<Result<ProvisionRequest, SessionError>>,
    provision_responses: VecDeque<Result<(), SessionError>>,

    pub content_ids: Vec<Vec<u8>>,
    pub key_payloads: Vec<Vec<u8>>,
    pub provision_payloads: Vec<Vec<u8>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_key_request(&mut self, result: Result<KeyRequest, SessionError>) {
        self.key_requests.push_back(result);
    }

    pub fn expect_provide_key_response(&mut self, result: Result<(), SessionError>) {
        self.key_responses.push_back(result);
    }

    pub fn expect_provision_request(&mut self, result: Result<ProvisionRequest, SessionError>) {
        self.provision_requests.push_back(result);
    }

    pub fn expect_provide_provision_response(&mut self, result: Result<(), SessionError>) {
        self.provision_responses.push_back(result);
    }
}

impl DrmSession for MockSession {
    fn key_request(&mut self, content_id: &[u8]) -> Result<KeyRequest, SessionError> {
        self.content_ids.push(content_id.to_vec());
        self.key_requests.pop_front().expect("unexpected key_request")
    }

    fn provide_key_response(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        self.key_payloads.push(payload.to_vec());
        self.key_responses
            .pop_front()
            .expect("unexpected provide_key_response")
    }

    fn provision_request(&mut self) -> Result<ProvisionRequest, SessionError> {
        self.provision_requests
            .pop_front()
            .expect("unexpected provision_request")
    }

    fn provide_provision_response(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        self.provision_payloads.push(payload.to_vec());
        self.provision_responses
            .pop_front()
            .expect("unexpected provide_provision_response")
    }
}

/// What the mock transport should do with the next POST.
pub enum Reply {
    Body(Vec<u8>),
    Fail(TransportError),
    /// Never resolve — the job stays pending until the caller's deadline.
    Stall,
}

/// Transport double that answers POSTs from a script and records every
/// request it was handed.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Reply>>,
    posts: Mutex<Vec<PostRequest>>,
    // Senders kept alive so stalled jobs poll as pending, not canceled.
    stalled: Mutex<Vec<oneshot::Sender<Result<Vec<u8>, TransportError>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn posts(&self) -> Vec<PostRequest> {
        self.posts.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn post(&self, request: PostRequest) -> TransportJob {
        self.posts.lock().unwrap().push(request);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected POST");
        match reply {
            Reply::Body(body) => TransportJob::ready(Ok(body)),
            Reply::Fail(e) => TransportJob::ready(Err(e)),
            Reply::Stall => {
                let (tx, rx) = oneshot::channel();
                self.stalled.lock().unwrap().push(tx);
                TransportJob::from_receiver(rx)
            }
        }
    }
}

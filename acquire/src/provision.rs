use tracing::{error, info};

use crate::error::{AcquireError, AcquireResult, SessionError};
use crate::session::DrmSession;
use crate::transport::{PollPolicy, PostRequest, Transport, wait_for_body};

/// Runs one provisioning transaction: obtains a signed provisioning
/// request from the session, posts it to the server-suggested URL, and
/// feeds the response back.
///
/// This is the recovery primitive behind "device not provisioned"
/// conditions — it never recurses into itself, and none of its failure
/// modes are retried here. The caller decides whether a failed attempt
/// ends the surrounding transaction.
pub struct ProvisionRequester<'t, T: Transport + ?Sized> {
    transport: &'t T,
    policy: PollPolicy,
}

impl<'t, T: Transport + ?Sized> ProvisionRequester<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        ProvisionRequester {
            transport,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute the provisioning round trip.
    pub async fn run<S: DrmSession + ?Sized>(&self, session: &mut S) -> AcquireResult<()> {
        let request = session.provision_request().map_err(AcquireError::Session)?;
        info!(
            "attempting to provision from server '{}'",
            request.default_url
        );

        let post = PostRequest::provisioning(&request.default_url, &request.data);
        let job = self.transport.post(post);
        let body = wait_for_body(job, self.policy).await.map_err(|e| {
            error!("no response from provisioning server: {e}");
            AcquireError::NoResponse(e)
        })?;

        // Provisioning responses carry no GLS envelope.
        match session.provide_provision_response(&body) {
            Ok(()) => Ok(()),
            Err(SessionError::Denied) => {
                error!("server denied the provisioning request");
                Err(AcquireError::ProvisionDenied)
            }
            Err(e) => Err(AcquireError::Session(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::{MockSession, MockTransport, Reply};
    use crate::types::ProvisionRequest;

    fn provisionable_session() -> MockSession {
        let mut session = MockSession::new();
        session.expect_provision_request(Ok(ProvisionRequest::new(
            b"signed-blob".to_vec(),
            "https://prov.example/certs",
        )));
        session
    }

    #[tokio::test]
    async fn test_run_posts_signed_request_and_feeds_back_body() {
        let transport = MockTransport::new();
        transport.reply(Reply::Body(b"cert-data".to_vec()));

        let mut session = provisionable_session();
        session.expect_provide_provision_response(Ok(()));

        ProvisionRequester::new(&transport)
            .run(&mut session)
            .await
            .unwrap();

        let posts = transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].url,
            "https://prov.example/certs?signedRequest=signed-blob"
        );
        assert!(posts[0].body.is_empty());
        assert_eq!(session.provision_payloads, vec![b"cert-data".to_vec()]);
    }

    #[tokio::test]
    async fn test_denied_provisioning_is_terminal() {
        let transport = MockTransport::new();
        transport.reply(Reply::Body(b"cert-data".to_vec()));

        let mut session = provisionable_session();
        session.expect_provide_provision_response(Err(SessionError::Denied));

        let result = ProvisionRequester::new(&transport).run(&mut session).await;
        assert_eq!(result, Err(AcquireError::ProvisionDenied));
        // Terminal for this attempt: no second POST.
        assert_eq!(transport.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_reads_as_no_response() {
        let transport = MockTransport::new();
        transport.reply(Reply::Fail(TransportError::Status(500)));

        let mut session = provisionable_session();

        let result = ProvisionRequester::new(&transport).run(&mut session).await;
        assert_eq!(
            result,
            Err(AcquireError::NoResponse(TransportError::Status(500)))
        );
        assert!(session.provision_payloads.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_server_times_out() {
        let transport = MockTransport::new();
        transport.reply(Reply::Stall);

        let mut session = provisionable_session();

        let result = ProvisionRequester::new(&transport).run(&mut session).await;
        let policy = PollPolicy::default();
        assert_eq!(
            result,
            Err(AcquireError::NoResponse(TransportError::TimedOut(
                policy.deadline
            )))
        );
        assert_eq!(transport.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_session_failure_is_fatal() {
        let transport = MockTransport::new();
        let mut session = MockSession::new();
        session.expect_provision_request(Err(SessionError::Failed("hal broke".into())));

        let result = ProvisionRequester::new(&transport).run(&mut session).await;
        assert_eq!(
            result,
            Err(AcquireError::Session(SessionError::Failed(
                "hal broke".into()
            )))
        );
        assert!(transport.posts().is_empty());
    }
}

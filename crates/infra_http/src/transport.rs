//! Timeout-bounded, retrying payer transport

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::exchange::{ExchangeFailure, PayerExchange, PayerReply, PayerRequest};
use crate::retry::RetryPolicy;

/// Successful payer reply with the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub reply: PayerReply,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Applies the per-attempt timeout and retry policy to a `PayerExchange`
///
/// Retries are sequential and back off before each retry. Connection
/// failures, timeouts and 5xx replies are retried; 4xx replies and
/// malformed requests fail immediately.
#[derive(Clone)]
pub struct HttpTransport {
    exchange: Arc<dyn PayerExchange>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(exchange: Arc<dyn PayerExchange>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            exchange,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same exchange and timeout with another retry policy
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            exchange: Arc::clone(&self.exchange),
            policy,
            timeout: self.timeout,
        }
    }

    pub async fn execute(&self, request: &PayerRequest) -> Result<Delivery, TransportError> {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.delay(attempt - 1);
                debug!(provider = %request.provider_id, attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            let outcome = match tokio::time::timeout(self.timeout, self.exchange.send(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExchangeFailure::Timeout),
            };

            match outcome {
                Ok(reply) if reply.is_success() => {
                    debug!(
                        provider = %request.provider_id,
                        method = %request.method,
                        status = reply.status,
                        attempt,
                        "Payer call succeeded"
                    );
                    return Ok(Delivery {
                        reply,
                        attempts: attempt,
                        elapsed: started.elapsed(),
                    });
                }
                Ok(reply) if reply.is_client_error() => {
                    warn!(
                        provider = %request.provider_id,
                        status = reply.status,
                        attempt,
                        "Payer rejected request"
                    );
                    return Err(TransportError::rejected(reply.status, &reply.body));
                }
                Ok(reply) if reply.is_server_error() => {
                    last_failure = format!("payer answered with status {}", reply.status);
                }
                Ok(reply) => {
                    warn!(
                        provider = %request.provider_id,
                        status = reply.status,
                        attempt,
                        "Payer answered with unexpected status"
                    );
                    return Err(TransportError::UnexpectedStatus { status: reply.status });
                }
                Err(ExchangeFailure::Invalid(message)) => {
                    return Err(TransportError::InvalidRequest(message));
                }
                Err(failure) => {
                    last_failure = failure.to_string();
                }
            }

            warn!(
                provider = %request.provider_id,
                attempt,
                max_attempts,
                error = %last_failure,
                "Transient payer failure"
            );
        }

        Err(TransportError::Exhausted {
            attempts: max_attempts,
            message: last_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_kernel::ProviderId;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::exchange::HttpMethod;
    use crate::retry::Backoff;

    struct Script {
        replies: Mutex<VecDeque<Result<PayerReply, ExchangeFailure>>>,
        calls: AtomicU32,
        stall: Option<Duration>,
    }

    impl Script {
        fn new(replies: Vec<Result<PayerReply, ExchangeFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicU32::new(0),
                stall: None,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PayerExchange for Script {
        async fn send(&self, _request: &PayerRequest) -> Result<PayerReply, ExchangeFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(PayerReply::new(200, "{}")))
        }
    }

    fn request() -> PayerRequest {
        PayerRequest {
            provider_id: ProviderId::new("aetna").unwrap(),
            method: HttpMethod::Post,
            url: "http://payer.test/claims".to_string(),
            headers: Vec::new(),
            body: Some("{}".to_string()),
        }
    }

    fn transport(script: Arc<Script>, attempts: u32) -> HttpTransport {
        HttpTransport::new(
            script,
            RetryPolicy::new(attempts, Backoff::Fixed(Duration::from_millis(1))),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let script = Script::new(vec![
            Ok(PayerReply::new(503, "busy")),
            Ok(PayerReply::new(503, "busy")),
            Ok(PayerReply::new(200, "ok")),
        ]);
        let delivery = transport(script.clone(), 3).execute(&request()).await.unwrap();
        assert_eq!(delivery.attempts, 3);
        assert_eq!(delivery.reply.body, "ok");
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test]
    async fn test_persistent_503_exhausts() {
        let script = Script::new(vec![Ok(PayerReply::new(503, "busy")); 3]);
        let err = transport(script.clone(), 3).execute(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Exhausted { attempts: 3, .. }));
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let script = Script::new(vec![Ok(PayerReply::new(422, "bad member id"))]);
        let err = transport(script.clone(), 3).execute(&request()).await.unwrap_err();
        assert_eq!(err, TransportError::rejected(422, "bad member id"));
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn test_informational_and_redirect_replies_are_not_retried() {
        for status in [102u16, 302, 304] {
            let script = Script::new(vec![Ok(PayerReply::new(status, "")), Ok(PayerReply::new(200, "ok"))]);
            let err = transport(script.clone(), 3).execute(&request()).await.unwrap_err();
            assert_eq!(err, TransportError::UnexpectedStatus { status });
            assert_eq!(script.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_connect_errors_are_retried() {
        let script = Script::new(vec![
            Err(ExchangeFailure::Connect("refused".to_string())),
            Ok(PayerReply::new(201, "created")),
        ]);
        let delivery = transport(script.clone(), 3).execute(&request()).await.unwrap();
        assert_eq!(delivery.attempts, 2);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fast() {
        let script = Script::new(vec![Err(ExchangeFailure::Invalid("header".to_string()))]);
        let err = transport(script.clone(), 3).execute(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_transient() {
        let script = Arc::new(Script {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            stall: Some(Duration::from_millis(500)),
        });
        let transport = HttpTransport::new(
            script.clone(),
            RetryPolicy::new(2, Backoff::Fixed(Duration::ZERO)),
            Duration::from_millis(20),
        );
        let err = transport.execute(&request()).await.unwrap_err();
        match err {
            TransportError::Exhausted { attempts, message } => {
                assert_eq!(attempts, 2);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let script = Script::new(vec![Ok(PayerReply::new(500, "down"))]);
        let once = transport(script.clone(), 3).with_policy(RetryPolicy::single_attempt());
        let err = once.execute(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Exhausted { attempts: 1, .. }));
        assert_eq!(script.calls(), 1);
    }
}

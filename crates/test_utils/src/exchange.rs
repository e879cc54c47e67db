//! Scripted payer exchange
//!
//! Stands in for `ReqwestExchange` so service and gateway tests can run
//! without a network. Replies are served in script order; once the script
//! runs out the fallback (if any) answers every further call. Every request
//! is recorded for inspection.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use infra_http::{ExchangeFailure, PayerExchange, PayerReply, PayerRequest};

type Step = Result<PayerReply, ExchangeFailure>;

#[derive(Default)]
pub struct ScriptedExchange {
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Option<Step>>,
    latency: Mutex<Option<Duration>>,
    requests: Mutex<Vec<PayerRequest>>,
    calls: AtomicUsize,
}

impl ScriptedExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Exchange answering every call with the same reply
    pub fn always(status: u16, body: impl Into<String>) -> Arc<Self> {
        let exchange = Self::new();
        exchange.set_fallback(Ok(PayerReply::new(status, body)));
        exchange
    }

    /// Exchange answering every call with a JSON body and status 200
    pub fn always_json(body: Value) -> Arc<Self> {
        Self::always(200, body.to_string())
    }

    pub fn reply(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(Ok(PayerReply::new(status, body)))
    }

    pub fn reply_json(&self, body: Value) -> &Self {
        self.reply(200, body.to_string())
    }

    pub fn fail(&self, failure: ExchangeFailure) -> &Self {
        self.push(Err(failure))
    }

    /// Answer used once the script is exhausted
    pub fn set_fallback(&self, step: Step) -> &Self {
        *self.fallback.lock().unwrap() = Some(step);
        self
    }

    /// Delay applied before every reply
    pub fn set_latency(&self, latency: Duration) -> &Self {
        *self.latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PayerRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the most recent request
    pub fn last_body(&self) -> Option<String> {
        self.requests.lock().unwrap().last().and_then(|r| r.body.clone())
    }

    fn push(&self, step: Step) -> &Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    fn next_step(&self) -> Step {
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return step;
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ExchangeFailure::Connect("script exhausted".to_string())))
    }
}

#[async_trait]
impl PayerExchange for ScriptedExchange {
    async fn send(&self, request: &PayerRequest) -> Result<PayerReply, ExchangeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let step = self.next_step();
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        step
    }
}

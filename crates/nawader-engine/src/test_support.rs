use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};

use crate::transport::ModelTransport;

/// In-memory transport that replays queued responses and records every call.
/// Clones share state so a test can keep a handle after boxing one into a gateway.
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    inner: Arc<ScriptedInner>,
}

struct ScriptedInner {
    configured: bool,
    responses: Mutex<VecDeque<std::result::Result<Value, String>>>,
    requests: Mutex<Vec<(String, Value)>>,
    probes: Mutex<Vec<String>>,
    probe_error: Mutex<Option<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::build(true)
    }

    pub(crate) fn unconfigured() -> Self {
        Self::build(false)
    }

    fn build(configured: bool) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                configured,
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                probes: Mutex::new(Vec::new()),
                probe_error: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn boxed(&self) -> Box<dyn ModelTransport> {
        Box::new(self.clone())
    }

    pub(crate) fn push_text(&self, text: &str) -> &Self {
        self.push_response(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        }))
    }

    pub(crate) fn push_response(&self, response: Value) -> &Self {
        self.inner
            .responses
            .lock()
            .unwrap()
            .push_back(Ok(response));
        self
    }

    pub(crate) fn push_error(&self, message: &str) -> &Self {
        self.inner
            .responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn fail_probe(&self, message: &str) {
        *self.inner.probe_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn requests(&self) -> Vec<(String, Value)> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    pub(crate) fn probes(&self) -> Vec<String> {
        self.inner.probes.lock().unwrap().clone()
    }
}

impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.inner.configured
    }

    fn probe(&self, model: &str) -> Result<()> {
        self.inner.probes.lock().unwrap().push(model.to_string());
        match self.inner.probe_error.lock().unwrap().clone() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    fn generate_content(&self, model: &str, payload: &Value) -> Result<Value> {
        self.inner
            .requests
            .lock()
            .unwrap()
            .push((model.to_string(), payload.clone()));
        match self.inner.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted response queued"),
        }
    }
}

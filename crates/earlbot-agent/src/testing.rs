//! Test doubles shared by the skill and bot tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use earlbot_core::error::{ServiceError, ToolError};
use earlbot_providers::traits::{CompletionRequest, CompletionService};

use crate::tools::{Tool, ToolRegistry};

/// A completion service that replays canned responses and records requests.
pub struct MockService {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
    /// Returned once the script runs out.
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockService {
    pub fn new(responses: Vec<Result<String, ServiceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Successful responses, in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Answers every request with the same text.
    pub fn repeating(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Ok("(no more responses)".into()),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// A tool returning a fixed result and counting invocations.
pub struct StubTool {
    name: &'static str,
    result: Result<String, ToolError>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn ok(name: &'static str, output: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Ok(output.to_string()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Err(ToolError::Failed(reason.to_string())),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "stub tool for tests"
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        self.result.clone()
    }
}

/// Registry holding the given stubs, in order.
pub fn registry_of(tools: &[Arc<StubTool>]) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(Arc::clone(tool) as Arc<dyn Tool>).unwrap();
    }
    Arc::new(registry)
}

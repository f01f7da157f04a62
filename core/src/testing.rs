//! Canned transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, String>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(self, body: &str) -> Self {
        self.status(200, body)
    }

    pub(crate) fn status(self, status: u16, body: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn unreachable(self) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err("connection refused".to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request);
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(msg)) => Err(ApiError::Transport(msg)),
            None => Err(ApiError::Transport("no scripted response left".to_string())),
        }
    }
}

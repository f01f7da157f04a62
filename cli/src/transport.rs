//! Blocking `Transport` backed by ureq.

use todo_client::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tracing::debug;
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// 4xx/5xx come back as responses so the core interprets the status.
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = req.method.as_str(), path = %req.path, "http request");
        let headers = req.headers.as_slice();
        let result = match req.method {
            HttpMethod::Get => with_headers(self.agent.get(&req.path), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&req.path), headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(&req.path), headers), req.body.as_deref()),
            HttpMethod::Put => send(with_headers(self.agent.put(&req.path), headers), req.body.as_deref()),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status, "http response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

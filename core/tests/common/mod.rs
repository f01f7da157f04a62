//! Shared harness: a live mock server and a ureq-backed transport.

use todo_client::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};

/// Executes requests with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let auth = req.header("authorization").unwrap_or_default().to_string();
        let body = req.body.clone().unwrap_or_default();
        let result = match req.method {
            HttpMethod::Get => self.agent.get(&req.path).header("authorization", &auth).call(),
            HttpMethod::Delete => self.agent.delete(&req.path).header("authorization", &auth).call(),
            HttpMethod::Post => self
                .agent
                .post(&req.path)
                .header("authorization", &auth)
                .content_type("application/json")
                .send(body.as_bytes()),
            HttpMethod::Put => self
                .agent
                .put(&req.path)
                .header("authorization", &auth)
                .content_type("application/json")
                .send(body.as_bytes()),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Start the mock server on a random port and return its API base URL.
pub fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

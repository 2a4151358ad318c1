//! Executes `HttpRequest`s.
//!
//! A transport performs exactly one round-trip per call and reports every
//! received response as data, whatever its status. Only failures to get a
//! response at all are errors here.

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Closures act as transports, which keeps test doubles to a few lines.
impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// Status-code-as-error is disabled so 4xx/5xx responses come back as
/// `HttpResponse` values. Timeouts are ureq's defaults.
#[derive(Debug, Clone)]
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

    /// Uses a caller-configured agent. It should have
    /// `http_status_as_error(false)`, otherwise error statuses surface as
    /// transport failures instead of status errors.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let mut response = match (request.method, &request.body) {
            (HttpMethod::Get, None) => decorate(self.agent.get(url), request).call(),
            (HttpMethod::Get, Some(body)) => {
                decorate(self.agent.get(url).force_send_body(), request).send(body.as_bytes())
            }
            (HttpMethod::Delete, None) => decorate(self.agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(body)) => {
                decorate(self.agent.delete(url).force_send_body(), request).send(body.as_bytes())
            }
            (HttpMethod::Post, Some(body)) => decorate(self.agent.post(url), request).send(body.as_bytes()),
            (HttpMethod::Post, None) => decorate(self.agent.post(url), request).send_empty(),
        }?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse { status, body })
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    builder
}

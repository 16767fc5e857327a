//! HTTP transport seam under the request gateway.
//!
//! The gateway builds fully-formed requests and only needs a status code and a body
//! back. `ReqwestTransport` talks to the network; `StubTransport` replays scripted
//! replies for tests and offline prototyping.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;

/// No response was obtained (DNS, connect, TLS, reset, body read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one request. Implementations must not retry.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response could be obtained.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError(err.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

//
// ─── STUB ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum StubReply {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug)]
struct StubRoute {
    method: Method,
    path: String,
    reply: StubReply,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct StubState {
    routes: Vec<StubRoute>,
    requests: Vec<HttpRequest>,
}

/// Scripted in-memory transport.
///
/// Routes match on method and URL suffix; the most recently registered match wins.
/// Requests without a matching route fail as transport errors, so a stub with no
/// routes behaves like an unreachable backend. Every request is recorded.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `method path` with `status` and a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, StubReply::Respond(json_response(status, &body)), None)
    }

    /// Answer `method path` once, then fall through to earlier routes.
    pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, StubReply::Respond(json_response(status, &body)), Some(1))
    }

    /// Fail `method path` with a transport error.
    pub fn fail(&self, method: Method, path: &str, reason: &str) -> &Self {
        self.push(method, path, StubReply::Fail(reason.to_string()), None)
    }

    /// Requests seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    fn push(
        &self,
        method: Method,
        path: &str,
        reply: StubReply,
        remaining: Option<usize>,
    ) -> &Self {
        self.lock().routes.push(StubRoute {
            method,
            path: path.to_string(),
            reply,
            remaining,
        });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let matched = state
            .routes
            .iter()
            .rposition(|route| route.method == request.method && request.url.ends_with(&route.path));
        let Some(index) = matched else {
            return Err(TransportError(format!(
                "no route for {} {}",
                request.method, request.url
            )));
        };

        let reply = state.routes[index].reply.clone();
        if let Some(remaining) = state.routes[index].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                state.routes.remove(index);
            }
        }

        match reply {
            StubReply::Respond(response) => Ok(response),
            StubReply::Fail(reason) => Err(TransportError(reason)),
        }
    }
}

//! Turning a test case request into a wire request and sending it.

use std::fmt;
use std::sync::Arc;

use specport_core::{Header, Method, Request};
use ureq::typestate::WithBody;

use crate::error::ReplayError;

/// A request ready to send: path normalised, body and content type settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<Header>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
            .map(Header::value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        HttpResponse {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type Handler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Where requests go.
#[derive(Clone)]
pub enum Target {
    /// Real HTTP against a base URL such as `http://localhost:3000`. The
    /// agent is shared by every request, so connections are pooled.
    BaseUrl { url: String, agent: ureq::Agent },
    /// An in-process handler; no network involved.
    Handler(Arc<Handler>),
}

impl Target {
    pub fn base_url(url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Target::BaseUrl {
            url: url.into(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Target::Handler(Arc::new(f))
    }

    pub fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ReplayError> {
        match self {
            Target::Handler(f) => Ok(f(req)),
            Target::BaseUrl { url, agent } => execute_http(agent, url, req),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::BaseUrl { url, .. } => f.debug_struct("BaseUrl").field("url", url).finish(),
            Target::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// `#` never reaches the server as part of a URL, so it is percent-encoded.
pub fn normalize_path(path: &str) -> String {
    let encoded = path.replace('#', "%23");
    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{}", encoded)
    }
}

/// Build the wire request for a test case.
///
/// The body is attached only for methods that carry one, and then a JSON
/// content type is assumed unless the test supplied its own.
pub fn build_request(req: &Request) -> HttpRequest {
    let mut headers = req.headers.clone();
    let body = req.body.clone().filter(|_| req.method.sends_body());
    if body.is_some()
        && !headers
            .iter()
            .any(|h| h.name().eq_ignore_ascii_case("content-type"))
    {
        headers.push(Header::new("Content-Type", "application/json"));
    }
    HttpRequest {
        method: req.method,
        path: normalize_path(&req.path),
        headers,
        body,
    }
}

// ── HTTP transport ───────────────────────────────────────────────────

fn execute_http(
    agent: &ureq::Agent,
    base: &str,
    req: &HttpRequest,
) -> Result<HttpResponse, ReplayError> {
    let url = format!("{}{}", base.trim_end_matches('/'), req.path);
    let body = req.body.as_deref();

    let result = match req.method {
        Method::Get => with_headers(agent.get(&url), &req.headers).call(),
        Method::Head => with_headers(agent.head(&url), &req.headers).call(),
        Method::Post => send(with_headers(agent.post(&url), &req.headers), body),
        Method::Put => send(with_headers(agent.put(&url), &req.headers), body),
        Method::Patch => send(with_headers(agent.patch(&url), &req.headers), body),
        Method::Delete => match body {
            Some(_) => send(
                with_headers(agent.delete(&url).force_send_body(), &req.headers),
                body,
            ),
            None => with_headers(agent.delete(&url), &req.headers).call(),
        },
        Method::Options => match body {
            Some(_) => send(
                with_headers(agent.options(&url).force_send_body(), &req.headers),
                body,
            ),
            None => with_headers(agent.options(&url), &req.headers).call(),
        },
    };

    let response = result.map_err(|e| transport_error(req, e))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_owned(), value.to_owned()))
        })
        .collect();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| transport_error(req, e))?;

    tracing::debug!(method = %req.method, path = %req.path, status, "response");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn with_headers<B>(mut rb: ureq::RequestBuilder<B>, headers: &[Header]) -> ureq::RequestBuilder<B> {
    for h in headers {
        rb = rb.header(h.name(), h.value());
    }
    rb
}

fn send(
    rb: ureq::RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(b) => rb.send(b),
        None => rb.send_empty(),
    }
}

fn transport_error(req: &HttpRequest, err: ureq::Error) -> ReplayError {
    ReplayError::Transport {
        method: req.method.to_string(),
        path: req.path.clone(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str, body: Option<&str>) -> Request {
        Request {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: body.map(str::to_owned),
        }
    }

    #[test]
    fn paths_get_leading_slash_and_encoded_hash() {
        assert_eq!(normalize_path("items?select=a#b"), "/items?select=a%23b");
        assert_eq!(normalize_path("/items"), "/items");
    }

    #[test]
    fn get_and_head_never_send_a_body() {
        for m in [Method::Get, Method::Head] {
            let r = build_request(&request(m, "/x", Some("{}")));
            assert_eq!(r.body, None);
            assert!(r.headers.is_empty());
        }
    }

    #[test]
    fn body_defaults_json_content_type() {
        let r = build_request(&request(Method::Post, "/x", Some(r#"{"a":1}"#)));
        assert_eq!(r.header("content-type"), Some("application/json"));
        assert_eq!(r.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let mut req = request(Method::Post, "/x", Some("a,b"));
        req.headers.push(Header::new("content-type", "text/csv"));
        let r = build_request(&req);
        assert_eq!(r.headers, vec![Header::new("content-type", "text/csv")]);
    }

    #[test]
    fn repeated_headers_keep_order() {
        let mut req = request(Method::Get, "/x", None);
        req.headers.push(Header::new("Prefer", "a"));
        req.headers.push(Header::new("Prefer", "b"));
        let r = build_request(&req);
        assert_eq!(r.headers, req.headers);
    }

    #[test]
    fn handler_target_receives_built_request() {
        let target = Target::handler(|req: &HttpRequest| {
            HttpResponse::new(200).with_body(format!("{} {}", req.method, req.path))
        });
        let req = build_request(&request(Method::Delete, "items", None));
        let resp = target.execute(&req).unwrap();
        assert_eq!(resp.body, "DELETE /items");
    }

    #[test]
    fn base_url_debug_shows_only_the_url() {
        let target = Target::base_url("http://127.0.0.1:3000");
        assert_eq!(
            format!("{:?}", target),
            "BaseUrl { url: \"http://127.0.0.1:3000\" }"
        );
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let resp = HttpResponse::new(200).with_header("Content-Range", "0-1/*");
        assert_eq!(resp.header("content-range"), Some("0-1/*"));
        assert_eq!(resp.header("Location"), None);
    }
}

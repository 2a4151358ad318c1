//! Version-agnostic base client for the REST API.
//!
//! # Design
//! `TembaClient` owns an immutable configuration (root URL, token, debug
//! flag) and a `Transport`. Resource-specific clients supply an endpoint
//! name and already-built parameters or bodies; this type turns them into
//! HTTP round-trips and normalizes the outcome. Every call builds its own
//! request and accumulates its own results, so a client can be shared
//! across threads whenever its transport can.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{Error, RequestError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::serialize::{query_pairs, Data};
use crate::transport::{Transport, UreqTransport};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    /// Cursor URL of the following page, if there is one.
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct TembaClient<T = UreqTransport> {
    root_url: String,
    token: String,
    debug: bool,
    transport: T,
}

impl TembaClient<UreqTransport> {
    /// Client for `host` over HTTPS with debug output off.
    pub fn new(host: &str, token: &str) -> Self {
        Self::from_config(ClientConfig::new(host, token))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> TembaClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            root_url: config.root_url(),
            token: config.token,
            debug: config.debug,
            transport,
        }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}.json", self.root_url)
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), format!("Token {}", self.token)),
        ]
    }

    /// GETs a single object, failing unless exactly one result comes back.
    pub fn get_single(&self, endpoint: &str, params: &Data) -> Result<serde_json::Value> {
        let url = self.endpoint_url(endpoint);
        let page = self.fetch_page(&url, Some(params))?;
        single_result(page.results)
    }

    /// GETs every result of a list endpoint, following `next` cursors until
    /// the last page. A failure on any page fails the whole call.
    pub fn get_all(&self, endpoint: &str, params: &Data) -> Result<Vec<serde_json::Value>> {
        let mut results = Vec::new();
        for page in self.pages(endpoint, params) {
            results.extend(page?.results);
        }
        Ok(results)
    }

    /// Lazily walks the pages of a list endpoint. `params` are sent with the
    /// first request only; cursor URLs already carry the filters.
    pub fn pages<'a>(&'a self, endpoint: &str, params: &'a Data) -> Pages<'a, T> {
        Pages {
            client: self,
            url: Some(self.endpoint_url(endpoint)),
            params: Some(params),
        }
    }

    /// POSTs a body to an endpoint that answers with a single object.
    /// `None` means the server returned an empty body.
    pub fn post_single(&self, endpoint: &str, body: &Data) -> Result<Option<serde_json::Value>> {
        let url = self.endpoint_url(endpoint);
        self.request(HttpMethod::Post, &url, Some(body), None)
    }

    /// DELETEs at an endpoint. Any response body is ignored.
    pub fn delete(&self, endpoint: &str, params: &Data) -> Result<()> {
        let url = self.endpoint_url(endpoint);
        self.request(HttpMethod::Delete, &url, None, Some(params))?;
        Ok(())
    }

    pub fn get_single_as<D: DeserializeOwned>(&self, endpoint: &str, params: &Data) -> Result<D> {
        Ok(serde_json::from_value(self.get_single(endpoint, params)?)?)
    }

    pub fn get_all_as<D: DeserializeOwned>(&self, endpoint: &str, params: &Data) -> Result<Vec<D>> {
        self.get_all(endpoint, params)?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }

    pub fn post_single_as<D: DeserializeOwned>(&self, endpoint: &str, body: &Data) -> Result<D> {
        let url = self.endpoint_url(endpoint);
        let value = self.post_single(endpoint, body)?.ok_or(Error::EmptyBody { url })?;
        Ok(serde_json::from_value(value)?)
    }

    /// Performs one round-trip and parses the JSON response.
    ///
    /// Returns `Ok(None)` for an empty response body. Empty `body` or
    /// `params` mappings are not sent.
    pub fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Data>,
        params: Option<&Data>,
    ) -> Result<Option<serde_json::Value>> {
        let request = self.build_request(method, url, body, params)?;

        if self.debug {
            let payload = params.filter(|p| !p.is_empty()).or(body.filter(|b| !b.is_empty()));
            let payload = serde_json::to_string(&payload)?;
            tracing::debug!(target: "temba_core::request", %method, url = %url, %payload, "sending request");
        }

        let response = self
            .transport
            .execute(&request)
            .map_err(|source| RequestError::Transport { source })?;

        if self.debug {
            tracing::debug!(
                target: "temba_core::request",
                status = response.status,
                body = %response.body,
                "received response"
            );
        }

        check_status(&response, url)?;

        if response.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&response.body)?))
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Data>,
        params: Option<&Data>,
    ) -> Result<HttpRequest> {
        let body = match body.filter(|b| !b.is_empty()) {
            Some(body) => Some(serde_json::to_string(body)?),
            None => None,
        };
        let query = params.map(query_pairs).unwrap_or_default();
        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers: self.headers(),
            query,
            body,
        })
    }

    fn fetch_page(&self, url: &str, params: Option<&Data>) -> Result<Page> {
        let value = self
            .request(HttpMethod::Get, url, None, params)?
            .ok_or_else(|| Error::EmptyBody { url: url.to_string() })?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Iterator over the pages of a list endpoint, yielded in cursor order.
///
/// Stops after the first error.
pub struct Pages<'a, T> {
    client: &'a TembaClient<T>,
    url: Option<String>,
    params: Option<&'a Data>,
}

impl<T: Transport> Iterator for Pages<'_, T> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let url = self.url.take()?;
        let page = self.client.fetch_page(&url, self.params.take());
        if let Ok(page) = &page {
            self.url = page.next_url().map(str::to_string);
        }
        Some(page)
    }
}

fn check_status(response: &HttpResponse, url: &str) -> Result<(), RequestError> {
    if !response.is_error() {
        return Ok(());
    }
    Err(RequestError::Status {
        status: response.status,
        url: url.to_string(),
        body: response.body.clone(),
    })
}

fn single_result(mut results: Vec<serde_json::Value>) -> Result<serde_json::Value> {
    match results.len() {
        0 => Err(RequestError::NoObjects.into()),
        1 => Ok(results.remove(0)),
        n => Err(RequestError::MultipleObjects(n).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::serialize::{build_body, build_params};
    use crate::types::Contact;
    use crate::value::Args;

    /// Replays canned responses and records every request it receives.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<(u16, &str)>) -> Self {
            let responses = responses
                .into_iter()
                .map(|(status, body)| HttpResponse { status, body: body.to_string() })
                .collect();
            Self { responses: RefCell::new(responses), requests: RefCell::default() }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for &Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(request.clone());
            self.responses.borrow_mut().pop_front().ok_or_else(|| "script exhausted".into())
        }
    }

    fn client(transport: &Scripted) -> TembaClient<&Scripted> {
        TembaClient::with_transport(ClientConfig::new("example.com", "abc123"), transport)
    }

    fn no_params() -> Data {
        Data::new()
    }

    #[test]
    fn endpoint_url_appends_json_suffix() {
        let scripted = Scripted::default();
        assert_eq!(client(&scripted).endpoint_url("contacts"), "https://example.com/api/v1/contacts.json");
    }

    #[test]
    fn every_request_carries_auth_and_json_headers() {
        let scripted = Scripted::new(vec![(204, "")]);
        client(&scripted).delete("contacts", &no_params()).unwrap();
        let req = &scripted.requests()[0];
        assert_eq!(req.header("Authorization"), Some("Token abc123"));
        assert_eq!(req.header("Content-type"), Some("application/json"));
        assert_eq!(req.header("Accept"), Some("application/json"));
    }

    #[test]
    fn get_single_returns_sole_result() {
        let scripted = Scripted::new(vec![(200, r#"{"results":[{"uuid":"c-1"}],"next":null}"#)]);
        let params = build_params(&Args::new().arg("uuid", "c-1")).unwrap();
        let result = client(&scripted).get_single("contacts", &params).unwrap();
        assert_eq!(result, json!({"uuid": "c-1"}));
        assert_eq!(scripted.requests()[0].query, vec![("uuid".to_string(), "c-1".to_string())]);
    }

    #[test]
    fn get_single_with_no_results_fails() {
        let scripted = Scripted::new(vec![(200, r#"{"results":[],"next":null}"#)]);
        let err = client(&scripted).get_single("contacts", &no_params()).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::NoObjects)));
    }

    #[test]
    fn get_single_with_two_results_reports_count() {
        let scripted = Scripted::new(vec![(200, r#"{"results":[{"id":1},{"id":2}],"next":null}"#)]);
        let err = client(&scripted).get_single("messages", &no_params()).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::MultipleObjects(2))));
    }

    #[test]
    fn get_all_follows_next_without_resending_params() {
        let scripted = Scripted::new(vec![
            (200, r#"{"results":[{"id":1},{"id":2}],"next":"https://example.com/api/v1/messages.json?page=2"}"#),
            (200, r#"{"results":[{"id":3}],"next":"https://example.com/api/v1/messages.json?page=3"}"#),
            (200, r#"{"results":[{"id":4}],"next":null}"#),
        ]);
        let params = build_params(&Args::new().arg("status", vec!["Q", "S"])).unwrap();
        let results = client(&scripted).get_all("messages", &params).unwrap();
        assert_eq!(results, vec![json!({"id":1}), json!({"id":2}), json!({"id":3}), json!({"id":4})]);

        let requests = scripted.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://example.com/api/v1/messages.json");
        assert_eq!(requests[0].query, vec![("status".to_string(), "Q,S".to_string())]);
        assert_eq!(requests[1].url, "https://example.com/api/v1/messages.json?page=2");
        assert!(requests[1].query.is_empty());
        assert!(requests[2].query.is_empty());
    }

    #[test]
    fn empty_next_string_ends_pagination() {
        let scripted = Scripted::new(vec![(200, r#"{"results":[{"id":1}],"next":""}"#)]);
        let results = client(&scripted).get_all("messages", &no_params()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(scripted.requests().len(), 1);
    }

    #[test]
    fn failed_later_page_fails_whole_call() {
        let scripted = Scripted::new(vec![
            (200, r#"{"results":[{"id":1}],"next":"https://example.com/api/v1/messages.json?page=2"}"#),
            (500, "boom"),
        ]);
        let err = client(&scripted).get_all("messages", &no_params()).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::Status { status: 500, .. })));
    }

    #[test]
    fn pages_yield_one_item_per_request() {
        let scripted = Scripted::new(vec![
            (200, r#"{"results":[{"id":1}],"next":"https://example.com/api/v1/runs.json?page=2"}"#),
            (200, r#"{"results":[],"next":null}"#),
        ]);
        let client = client(&scripted);
        let params = no_params();
        let pages: Vec<Page> = client.pages("runs", &params).collect::<Result<_>>().unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].results.is_empty());
    }

    #[test]
    fn not_found_is_a_request_error() {
        let scripted = Scripted::new(vec![(404, r#"{"detail":"Not found"}"#)]);
        let err = client(&scripted).get_single("contacts", &no_params()).unwrap_err();
        match err {
            Error::Request(RequestError::Status { status, url, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(url, "https://example.com/api/v1/contacts.json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_a_request_error() {
        let transport = |_: &HttpRequest| -> Result<HttpResponse, TransportError> { Err("connection refused".into()) };
        let client = TembaClient::with_transport(ClientConfig::new("example.com", "abc123"), transport);
        let err = client.delete("contacts", &no_params()).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::Transport { .. })));
    }

    #[test]
    fn post_single_sends_structured_body() {
        let scripted = Scripted::new(vec![(201, r#"{"id":99,"text":"Hi"}"#)]);
        let body = build_body(&Args::new().arg("urns", vec!["tel:+250788000001"]).arg("text", "Hi")).unwrap();
        let result = client(&scripted).post_single("broadcasts", &body).unwrap();
        assert_eq!(result, Some(json!({"id": 99, "text": "Hi"})));

        let req = &scripted.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.query.is_empty());
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"urns": ["tel:+250788000001"], "text": "Hi"}));
    }

    #[test]
    fn empty_response_is_distinct_from_json_null() {
        let scripted = Scripted::new(vec![(200, ""), (200, "null")]);
        let client = client(&scripted);
        let url = client.endpoint_url("contacts");
        assert_eq!(client.request(HttpMethod::Get, &url, None, None).unwrap(), None);
        assert_eq!(client.request(HttpMethod::Get, &url, None, None).unwrap(), Some(serde_json::Value::Null));
    }

    #[test]
    fn empty_body_mapping_is_not_sent() {
        let scripted = Scripted::new(vec![(200, "{}")]);
        client(&scripted).post_single("contacts", &Data::new()).unwrap();
        assert_eq!(scripted.requests()[0].body, None);
    }

    #[test]
    fn delete_ignores_response_body() {
        let scripted = Scripted::new(vec![(200, r#"{"deleted":3}"#), (204, "")]);
        let client = client(&scripted);
        let params = build_params(&Args::new().arg("uuid", "c-1")).unwrap();
        assert!(client.delete("contacts", &params).is_ok());
        assert!(client.delete("contacts", &params).is_ok());
        assert_eq!(scripted.requests()[0].method, HttpMethod::Delete);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let scripted = Scripted::new(vec![(200, "<html>")]);
        let err = client(&scripted).get_all("contacts", &no_params()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn typed_fetch_decodes_domain_objects() {
        let scripted = Scripted::new(vec![(
            200,
            r#"{"results":[{"uuid":"c-1","name":"Ann"},{"uuid":"c-2","name":null}],"next":null}"#,
        )]);
        let contacts: Vec<Contact> = client(&scripted).get_all_as("contacts", &no_params()).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name.as_deref(), Some("Ann"));
        assert!(contacts[1].name.is_none());
    }

    #[test]
    fn typed_post_with_empty_response_fails() {
        let scripted = Scripted::new(vec![(200, "")]);
        let body = build_body(&Args::new().arg("name", "Ann")).unwrap();
        let err = client(&scripted).post_single_as::<Contact>("contacts", &body).unwrap_err();
        assert!(matches!(err, Error::EmptyBody { .. }));
    }

    #[test]
    #[tracing_test::traced_test]
    fn debug_flag_logs_request_and_response() {
        let scripted = Scripted::new(vec![(201, r#"{"id":99}"#)]);
        let client = TembaClient::with_transport(ClientConfig::new("example.com", "abc123").debug(true), &scripted);
        let body = build_body(&Args::new().arg("text", "Hi")).unwrap();
        client.post_single("broadcasts", &body).unwrap();

        assert!(logs_contain("temba_core::request"));
        assert!(logs_contain("sending request"));
        assert!(logs_contain("method=POST"));
        assert!(logs_contain("url=https://example.com/api/v1/broadcasts.json"));
        assert!(logs_contain(r#"payload={"text":"Hi"}"#));
        assert!(logs_contain("received response"));
        assert!(logs_contain("status=201"));
        assert!(logs_contain(r#"body={"id":99}"#));
    }

    #[test]
    #[tracing_test::traced_test]
    fn debug_log_prefers_params_over_body() {
        let scripted = Scripted::new(vec![(204, "")]);
        let client = TembaClient::with_transport(ClientConfig::new("example.com", "abc123").debug(true), &scripted);
        let params = build_params(&Args::new().arg("uuid", vec!["c-1", "c-2"])).unwrap();
        client.delete("contacts", &params).unwrap();

        assert!(logs_contain("method=DELETE"));
        assert!(logs_contain(r#"payload={"uuid":"c-1,c-2"}"#));
    }

    #[test]
    #[tracing_test::traced_test]
    fn nothing_is_logged_without_debug_flag() {
        let scripted = Scripted::new(vec![(201, r#"{"id":99}"#)]);
        let body = build_body(&Args::new().arg("text", "Hi")).unwrap();
        client(&scripted).post_single("broadcasts", &body).unwrap();

        assert!(!logs_contain("sending request"));
        assert!(!logs_contain("received response"));
    }

    #[test]
    fn debug_flag_does_not_change_results() {
        let scripted = Scripted::new(vec![(200, r#"{"results":[{"id":1}],"next":null}"#)]);
        let client = TembaClient::with_transport(ClientConfig::new("example.com", "abc123").debug(true), &scripted);
        assert!(client.debug());
        assert_eq!(client.get_all("messages", &no_params()).unwrap(), vec![json!({"id": 1})]);
    }
}

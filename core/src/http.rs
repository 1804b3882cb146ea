//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `FleetClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network; a
//! `Transport` (see `crate::transport`) performs the actual round-trip. This
//! keeps request shaping and response interpretation deterministic and
//! testable against scripted responses.
//!
//! All fields use owned types so values can be recorded and replayed.

use std::fmt;

pub const CONTENT_TYPE: &str = "content-type";
pub const ACCEPT: &str = "accept";
pub const AUTHORIZATION: &str = "authorization";

pub const APPLICATION_JSON: &str = "application/json";
pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";
pub const HAL_JSON: &str = "application/hal+json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL including the query string. Header names are
/// stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Replace (or add) a header, keeping the position of an existing one.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.headers.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name, value.to_string())),
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for `application/json` and any `+json` media type such as
    /// `application/hal+json`.
    pub fn has_json_body(&self) -> bool {
        self.header(CONTENT_TYPE)
            .map(|ct| {
                let media = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                media == APPLICATION_JSON || media.ends_with("+json")
            })
            .unwrap_or(false)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(content_type: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: String::new(),
        }
    }

    #[test]
    fn json_media_types_are_recognized() {
        assert!(response_with("application/json").has_json_body());
        assert!(response_with("application/json;charset=UTF-8").has_json_body());
        assert!(response_with("application/hal+json").has_json_body());
        assert!(!response_with("text/plain").has_json_body());
        assert!(!HttpResponse { status: 204, headers: Vec::new(), body: String::new() }.has_json_body());
    }

    #[test]
    fn set_header_replaces_in_place() {
        let mut req = HttpRequest {
            method: HttpMethod::Patch,
            path: "http://localhost/admins/1".to_string(),
            headers: vec![
                (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
                (ACCEPT.to_string(), HAL_JSON.to_string()),
            ],
            body: None,
        };
        req.set_header("Content-Type", MERGE_PATCH_JSON);
        assert_eq!(req.headers[0], (CONTENT_TYPE.to_string(), MERGE_PATCH_JSON.to_string()));
        assert_eq!(req.headers.len(), 2);
    }
}

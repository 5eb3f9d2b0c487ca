//! Incoming HTTP request type.

use std::net::SocketAddr;

use crate::method::Method;

/// An incoming HTTP request.
///
/// The server builds one per request from hyper's request parts; tests and
/// embedders build one with [`Request::new`].
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    /// A request with no headers and no body. `path` must already be
    /// percent-decoded.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
            remote_addr: None,
        }
    }

    /// Builds a request from hyper's parts. The path is percent-decoded; a
    /// path that does not decode to UTF-8 is kept as received. HTTP/2
    /// requests get a `host` header from the URI authority.
    pub(crate) fn from_parts(
        parts: &http::request::Parts,
        body: Vec<u8>,
        remote_addr: SocketAddr,
    ) -> Self {
        let raw = parts.uri.path();
        let path = urlencoding::decode(raw)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| raw.to_owned());

        let mut headers: Vec<(String, String)> = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        if !parts.headers.contains_key(http::header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                headers.push(("host".to_owned(), authority.as_str().to_owned()));
            }
        }

        Self {
            method: parts.method.as_str().to_owned(),
            path,
            headers,
            body,
            remote_addr: Some(remote_addr),
        }
    }

    /// Appends a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The raw method string as received.
    pub fn method(&self) -> &str { &self.method }
    /// The decoded request path, without the query string.
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    /// The peer address, when the request came through the server.
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// The method, if it is one sprig routes on.
    pub fn known_method(&self) -> Option<Method> {
        Method::parse(&self.method)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Host` header with any port removed.
    ///
    /// `example.com:8080` → `example.com`, `[::1]:3000` → `::1`.
    pub fn host(&self) -> Option<&str> {
        let host = self.header("host")?;
        if let Some(rest) = host.strip_prefix('[') {
            return rest.split_once(']').map(|(addr, _)| addr);
        }
        match host.rsplit_once(':') {
            Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => Some(name),
            _ => Some(host),
        }
    }

    /// Looks up a cookie by name across every `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_strips_port() {
        let host = |h: &str| Request::new("GET", "/").with_header("Host", h).host().map(str::to_owned);
        assert_eq!(host("example.com:8080").as_deref(), Some("example.com"));
        assert_eq!(host("example.com").as_deref(), Some("example.com"));
        assert_eq!(host("[::1]:3000").as_deref(), Some("::1"));
        assert_eq!(Request::new("GET", "/").host(), None);
    }

    #[test]
    fn cookies_across_headers() {
        let req = Request::new("GET", "/")
            .with_header("cookie", "a=1; SID=abc")
            .with_header("Cookie", "b=\"2\"");
        assert_eq!(req.cookie("SID"), Some("abc"));
        assert_eq!(req.cookie("a"), Some("1"));
        assert_eq!(req.cookie("b"), Some("2"));
        assert_eq!(req.cookie("c"), None);
    }

    #[test]
    fn from_parts_decodes_path_and_fills_host() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com:8080/files/a%20b.txt?x=1")
            .header("cookie", "SID=1")
            .body(())
            .unwrap()
            .into_parts();
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        let req = Request::from_parts(&parts, b"hi".to_vec(), peer);

        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/files/a b.txt");
        assert_eq!(req.host(), Some("example.com"));
        assert_eq!(req.cookie("SID"), Some("1"));
        assert_eq!(req.body(), b"hi");
        assert_eq!(req.remote_addr(), Some(peer));
    }

    #[test]
    fn known_method() {
        assert_eq!(Request::new("PUT", "/").known_method(), Some(Method::Put));
        assert_eq!(Request::new("BREW", "/").known_method(), None);
    }
}

use crate::{Error, Result};
use bytes::Bytes;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, Method, Uri};

/// An immutable description of the request to be signed.
///
/// Built from the caller's outgoing request just before transmission and
/// consumed once. The signer never mutates it; the derived headers come back
/// in a [`SignatureResult`](crate::SignatureResult) for the caller to merge.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as present in the request line.
    pub path: String,
    /// HTTP query parameters, percent-decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Request payload. Empty for bodyless requests.
    pub body: Bytes,
}

impl SigningRequest {
    /// Build a signing request from `http::request::Parts` and its body.
    pub fn build(parts: &http::request::Parts, body: impl Into<Bytes>) -> Result<Self> {
        Self::from_uri(parts.method.clone(), &parts.uri, parts.headers.clone(), body)
    }

    /// Build a signing request from raw components.
    pub fn from_uri(
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Result<Self> {
        let paq = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method,
            scheme: uri.scheme().cloned().unwrap_or(Scheme::HTTP),
            authority: uri
                .authority()
                .cloned()
                .ok_or_else(|| {
                    Error::request_invalid("request without authority is invalid for signing")
                })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers,
            body: body.into(),
        })
    }

    /// Host for the `host` header, with the scheme's default port dropped.
    pub(crate) fn host(&self) -> &str {
        let is_default_port = match (self.scheme.as_str(), self.authority.port_u16()) {
            ("http", Some(80)) => true,
            ("https", Some(443)) => true,
            (_, None) => true,
            _ => false,
        };

        if is_default_port {
            self.authority.host()
        } else {
            self.authority.as_str()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(uri: &str) -> SigningRequest {
        SigningRequest::from_uri(
            Method::GET,
            &uri.parse::<Uri>().expect("uri must be valid"),
            HeaderMap::new(),
            "",
        )
        .expect("must build")
    }

    #[test]
    fn test_host_drops_default_port() {
        assert_eq!(request_for("https://myapi.tacos:443/health").host(), "myapi.tacos");
        assert_eq!(request_for("http://myapi.tacos:80/health").host(), "myapi.tacos");
        assert_eq!(request_for("http://myapi.tacos:8080/health").host(), "myapi.tacos:8080");
        assert_eq!(request_for("https://myapi.tacos/health").host(), "myapi.tacos");
    }

    #[test]
    fn test_query_decoded() {
        let req = request_for("https://myapi.tacos/health?param=a%20b&other=x%2By&empty");
        assert_eq!(
            req.query,
            vec![
                ("param".to_string(), "a b".to_string()),
                ("other".to_string(), "x+y".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_no_authority_rejected() {
        let uri = Uri::from_static("/health");
        let res = SigningRequest::from_uri(Method::GET, &uri, HeaderMap::new(), "");
        assert!(res.is_err());
    }
}

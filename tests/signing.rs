//! Public-contract tests for the SigV4 signer.
//!
//! The known vector here is the one the upstream health-check probes verify
//! against: a GET to an API Gateway style endpoint signed at a fixed
//! timestamp with throwaway credentials.

use http::{HeaderMap, Method, Uri};
use pretty_assertions::assert_eq;
use probe_sigv4::time::parse_rfc3339;
use probe_sigv4::{sign, Credential, ErrorKind, SigningContext, SigningRequest};

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const ACCESS_KEY_ID: &str = "FFFFFFFFFFFFFFFFFFFF";
const SECRET_ACCESS_KEY: &str = "fakesecretaccesskeythatsnotgoodforaccess";

fn health_check_request(uri: &str) -> SigningRequest {
    let mut headers = HeaderMap::new();
    headers.insert("user-agent", "test-ua".parse().unwrap());
    headers.insert("accept", "*/*".parse().unwrap());
    headers.insert(
        "accept-encoding",
        "gzip;q=1.0,deflate;q=0.6,identity;q=0.3".parse().unwrap(),
    );

    SigningRequest::from_uri(
        Method::GET,
        &uri.parse::<Uri>().expect("uri must be valid"),
        headers,
        "",
    )
    .expect("must build")
}

fn fixed_context() -> SigningContext {
    SigningContext::new("execute-api", "us-east-2")
        .with_time(parse_rfc3339("2015-07-06T16:48:57Z").expect("must parse"))
}

#[test]
fn test_known_vector() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);

    let result = sign(&req, &cred, &fixed_context()).expect("must sign");

    assert_eq!(result.x_amz_date, "20150706T164857Z");
    assert_eq!(result.x_amz_content_sha256, EMPTY_SHA256);
    assert_eq!(
        result.authorization.to_str().unwrap(),
        "AWS4-HMAC-SHA256 \
         Credential=FFFFFFFFFFFFFFFFFFFF/20150706/us-east-2/execute-api/aws4_request, \
         SignedHeaders=accept-encoding;host;x-amz-content-sha256;x-amz-date, \
         Signature=430e7b7fbb191322aa16d864743a8df23ed1fb22d93762451d6ecf8a058bde90"
    );
}

#[test]
fn test_explicit_default_port_signs_identically() {
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);

    let bare = health_check_request("https://myapi.tacos/health?queryParam=true");
    let with_port = health_check_request("https://myapi.tacos:443/health?queryParam=true");

    let l = sign(&bare, &cred, &fixed_context()).expect("must sign");
    let r = sign(&with_port, &cred, &fixed_context()).expect("must sign");
    assert_eq!(l.authorization, r.authorization);
}

#[test]
fn test_determinism() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);
    let ctx = fixed_context();

    let l = sign(&req, &cred, &ctx).expect("must sign");
    let r = sign(&req, &cred, &ctx).expect("must sign");

    assert_eq!(l.x_amz_date, r.x_amz_date);
    assert_eq!(l.x_amz_content_sha256, r.x_amz_content_sha256);
    assert_eq!(l.authorization, r.authorization);
    assert_eq!(l.canonical_query, r.canonical_query);
}

#[test]
fn test_header_order_independence() {
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);
    let uri: Uri = "https://myapi.tacos/health?queryParam=true".parse().unwrap();

    let mut forward = HeaderMap::new();
    forward.insert("x-custom-a", "1".parse().unwrap());
    forward.insert("x-custom-b", "2".parse().unwrap());
    forward.insert("accept-encoding", "identity".parse().unwrap());

    let mut reverse = HeaderMap::new();
    reverse.insert("accept-encoding", "identity".parse().unwrap());
    reverse.insert("x-custom-b", "2".parse().unwrap());
    reverse.insert("x-custom-a", "1".parse().unwrap());

    let l = sign(
        &SigningRequest::from_uri(Method::GET, &uri, forward, "").unwrap(),
        &cred,
        &fixed_context(),
    )
    .expect("must sign");
    let r = sign(
        &SigningRequest::from_uri(Method::GET, &uri, reverse, "").unwrap(),
        &cred,
        &fixed_context(),
    )
    .expect("must sign");

    assert_eq!(l.authorization, r.authorization);
}

#[test]
fn test_body_participates_in_payload_hash() {
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);
    let uri: Uri = "https://myapi.tacos/health".parse().unwrap();

    let empty = SigningRequest::from_uri(Method::PUT, &uri, HeaderMap::new(), "").unwrap();
    let body =
        SigningRequest::from_uri(Method::PUT, &uri, HeaderMap::new(), "Hello,World!").unwrap();

    let l = sign(&empty, &cred, &fixed_context()).expect("must sign");
    let r = sign(&body, &cred, &fixed_context()).expect("must sign");

    assert_eq!(l.x_amz_content_sha256, EMPTY_SHA256);
    assert_eq!(
        r.x_amz_content_sha256,
        "8f4ec1811c6c4261c97a7423b3a56d69f0f160074f39745af20bb5fcf65ccf78"
    );
    assert_ne!(l.authorization, r.authorization);
}

#[test]
fn test_session_token_signed() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");
    let cred =
        Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY).with_session_token("fakesessiontoken");

    let result = sign(&req, &cred, &fixed_context()).expect("must sign");

    let token = result
        .x_amz_security_token
        .as_ref()
        .expect("token must be present");
    assert_eq!(token.to_str().unwrap(), "fakesessiontoken");
    assert_eq!(
        result.authorization.to_str().unwrap(),
        "AWS4-HMAC-SHA256 \
         Credential=FFFFFFFFFFFFFFFFFFFF/20150706/us-east-2/execute-api/aws4_request, \
         SignedHeaders=accept-encoding;host;x-amz-content-sha256;x-amz-date;x-amz-security-token, \
         Signature=1ca2790350df14981ea4f44709f0897259b8a857c4ffd5860ef6537d0c2f7a9b"
    );

    // Dropping the token must change the signature.
    let without = sign(
        &req,
        &Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY),
        &fixed_context(),
    )
    .expect("must sign");
    assert!(without.x_amz_security_token.is_none());
    assert_ne!(without.authorization, result.authorization);
}

#[test]
fn test_session_token_applied_to_request() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");
    let cred =
        Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY).with_session_token("fakesessiontoken");
    let result = sign(&req, &cred, &fixed_context()).expect("must sign");

    let mut headers = HeaderMap::new();
    result.apply(&mut headers);

    assert_eq!(headers["x-amz-security-token"], "fakesessiontoken");
    assert_eq!(headers["x-amz-date"], "20150706T164857Z");
    assert!(headers.contains_key(http::header::AUTHORIZATION));
}

#[test]
fn test_missing_credentials() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");

    for cred in [
        Credential::new("", SECRET_ACCESS_KEY),
        Credential::new(ACCESS_KEY_ID, ""),
        Credential::default(),
    ] {
        let err = sign(&req, &cred, &fixed_context()).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::MissingCredentials);
    }
}

#[test]
fn test_unresolved_region_or_service() {
    let req = health_check_request("https://myapi.tacos/health?queryParam=true");
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);

    for ctx in [
        SigningContext::new("", "us-east-2"),
        SigningContext::new("execute-api", ""),
    ] {
        let err = sign(&req, &cred, &ctx).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}

#[test]
fn test_query_encoding_round_trip() {
    let cred = Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY);

    // The same query under two equivalent raw encodings: %20 vs + for the
    // space, and a reserved '+' carried as %2B.
    let bare = |uri: &str| {
        SigningRequest::from_uri(
            Method::GET,
            &uri.parse::<Uri>().unwrap(),
            HeaderMap::new(),
            "",
        )
        .unwrap()
    };
    let percent = bare("https://myapi.tacos/health?param=a%20b&other=x%2By&empty");
    let plus = bare("https://myapi.tacos/health?param=a+b&other=x%2By&empty");

    let l = sign(&percent, &cred, &fixed_context()).expect("must sign");
    let r = sign(&plus, &cred, &fixed_context()).expect("must sign");

    assert_eq!(l.canonical_query, "empty=&other=x%2By&param=a%20b");
    assert_eq!(l.canonical_query, r.canonical_query);
    assert_eq!(l.authorization, r.authorization);
    assert!(l
        .authorization
        .to_str()
        .unwrap()
        .ends_with("Signature=d4422382d071c615195a71b2a7f1b6921b0c193e838d9fe4f9cbc103da764eb9"));
}

use crate::constants::{
    AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, UNSIGNABLE_HEADERS, X_AMZ_CONTENT_SHA_256,
    X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use crate::time::{format_date, format_iso8601};
use crate::{Credential, Error, Result, SigningContext, SigningRequest};
use http::header::HeaderName;
use http::{header, HeaderMap, HeaderValue};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt::Write;

/// The derived header values that make a request verifiable by an
/// AWS-compatible service.
///
/// Produced by [`sign`]; the signer itself never sends anything. Merge the
/// headers into the outgoing request with [`SignatureResult::apply`] before
/// transmission.
#[derive(Debug, Clone)]
pub struct SignatureResult {
    /// Value for the `x-amz-date` header.
    pub x_amz_date: HeaderValue,
    /// Value for the `x-amz-content-sha256` header.
    pub x_amz_content_sha256: HeaderValue,
    /// Value for the `Authorization` header.
    pub authorization: HeaderValue,
    /// Value for the `x-amz-security-token` header, present when the
    /// credential carries a session token.
    pub x_amz_security_token: Option<HeaderValue>,
    /// The canonical query string that was signed. Requests must be sent
    /// with exactly this encoding for server-side verification to derive
    /// the same signature.
    pub canonical_query: String,
}

impl SignatureResult {
    /// Merge the derived headers into an outgoing request's header map,
    /// overwriting any pre-existing same-named headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(HeaderName::from_static(X_AMZ_DATE), self.x_amz_date.clone());
        headers.insert(
            HeaderName::from_static(X_AMZ_CONTENT_SHA_256),
            self.x_amz_content_sha256.clone(),
        );
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        if let Some(token) = &self.x_amz_security_token {
            headers.insert(HeaderName::from_static(X_AMZ_SECURITY_TOKEN), token.clone());
        }
    }
}

/// Compute AWS Signature Version 4 headers for a single HTTP request.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// This is a pure function of its inputs: identical (request, credential,
/// context) triples always produce an identical [`SignatureResult`]. It
/// performs no I/O and never mutates the caller's request.
pub fn sign(
    req: &SigningRequest,
    cred: &Credential,
    ctx: &SigningContext,
) -> Result<SignatureResult> {
    if !cred.is_valid() {
        return Err(Error::missing_credentials(
            "access key id and secret access key must be non-empty",
        ));
    }
    if ctx.service.is_empty() || ctx.region.is_empty() {
        return Err(Error::config_invalid(
            "service and region must be resolved before signing",
        ));
    }

    let date = format_iso8601(ctx.time);
    let payload_hash = hex_sha256(&req.body);

    // canonicalize context
    let headers = canonical_headers(req, cred, &date, &payload_hash)?;
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_query = canonical_query_string(&req.query);

    // build canonical request and string to sign.
    let creq = canonical_request_string(
        req,
        &headers,
        &signed_headers,
        &canonical_query,
        &payload_hash,
    )?;
    debug!("calculated canonical request:\n{creq}");
    let encoded_req = hex_sha256(creq.as_bytes());

    // Scope: "20220313/<region>/<service>/aws4_request"
    let scope = format!(
        "{}/{}/{}/aws4_request",
        format_date(ctx.time),
        ctx.region,
        ctx.service
    );
    debug!("calculated scope: {scope}");

    // StringToSign:
    //
    // AWS4-HMAC-SHA256
    // 20220313T072004Z
    // 20220313/<region>/<service>/aws4_request
    // <hashed_canonical_request>
    let string_to_sign = {
        let mut f = String::new();
        writeln!(f, "AWS4-HMAC-SHA256")?;
        writeln!(f, "{date}")?;
        writeln!(f, "{scope}")?;
        write!(f, "{encoded_req}")?;
        f
    };
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key = generate_signing_key(&cred.secret_access_key, ctx);
    let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

    let mut authorization = HeaderValue::from_str(&format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        cred.access_key_id, scope, signed_headers, signature
    ))?;
    authorization.set_sensitive(true);

    let x_amz_security_token = match &cred.session_token {
        Some(token) => {
            let mut value = HeaderValue::from_str(token)?;
            // Set token value sensitive to avoid leaking.
            value.set_sensitive(true);
            Some(value)
        }
        None => None,
    };

    Ok(SignatureResult {
        x_amz_date: HeaderValue::from_str(&date)?,
        x_amz_content_sha256: HeaderValue::from_str(&payload_hash)?,
        authorization,
        x_amz_security_token,
        canonical_query,
    })
}

/// Collect the headers participating in the signature, lowercased, value
/// normalized, sorted by name.
///
/// Headers on the unsignable list are skipped. `host` is derived from the
/// authority when the request does not carry one, and the derived
/// `x-amz-date`, `x-amz-content-sha256` and `x-amz-security-token` values
/// take precedence over any same-named input headers.
fn canonical_headers(
    req: &SigningRequest,
    cred: &Credential,
    date: &str,
    payload_hash: &str,
) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();

    for name in req.headers.keys() {
        if UNSIGNABLE_HEADERS.contains(&name.as_str()) {
            continue;
        }

        // Repeated headers collapse into one comma-joined value.
        let value = req
            .headers
            .get_all(name)
            .iter()
            .map(|v| Ok(normalize_header_value(v.to_str()?)))
            .collect::<Result<Vec<_>>>()?
            .join(",");
        out.insert(name.as_str().to_string(), value);
    }

    if !out.contains_key(header::HOST.as_str()) {
        out.insert(header::HOST.as_str().to_string(), req.host().to_string());
    }

    out.insert(X_AMZ_DATE.to_string(), date.to_string());
    out.insert(X_AMZ_CONTENT_SHA_256.to_string(), payload_hash.to_string());
    if let Some(token) = &cred.session_token {
        out.insert(X_AMZ_SECURITY_TOKEN.to_string(), normalize_header_value(token));
    }

    Ok(out)
}

/// Trim leading/trailing whitespace and collapse internal runs to single
/// spaces, per step 4 of the canonical request rules.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Encode and sort query pairs into the canonical query string.
fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();

    // Sort by param name, then by value for duplicate names.
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_request_string(
    req: &SigningRequest,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    canonical_query: &str,
    payload_hash: &str,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", req.method)?;
    // Insert encoded path
    let path = percent_decode_str(&req.path)
        .decode_utf8()
        .map_err(|e| Error::request_invalid(format!("failed to decode path: {e}")))?;
    writeln!(f, "{}", utf8_percent_encode(&path, &AWS_URI_ENCODE_SET))?;
    // Insert query
    writeln!(f, "{canonical_query}")?;
    // Insert signed headers
    for (name, value) in headers.iter() {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{signed_headers}")?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

fn generate_signing_key(secret: &str, ctx: &SigningContext) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(ctx.time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), ctx.region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), ctx.service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

//! Outbound header computation.
//!
//! A pure function from (inbound headers, verified claims, forwarded
//! context) to the header map sent upstream. Precedence is explicit:
//! hop-by-hop headers never cross the gateway, and the trusted identity
//! pair is written last so verified values always win over anything the
//! caller supplied.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::core::auth::IdentityClaims;

/// Trusted header carrying the verified token subject.
pub const TRUSTED_SUBJECT_HEADER: &str = "x-user-id";
/// Trusted header carrying the verified token role.
pub const TRUSTED_ROLE_HEADER: &str = "x-user-role";

const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";
const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Hop-by-hop headers (plus `host`, which the client adapter resets from the
/// upstream authority) that must not be copied to the outbound request.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Original host and scheme of the inbound request, propagated downstream.
#[derive(Debug, Clone)]
pub struct ForwardedContext {
    pub host: Option<String>,
    pub proto: String,
}

impl ForwardedContext {
    /// Derive the forwarded context from inbound headers. Protocol defaults
    /// to plain HTTP when the caller carries no forwarded-proto indication.
    pub fn from_inbound(headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let proto = headers
            .get(FORWARDED_PROTO_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string();
        Self { host, proto }
    }
}

/// Compute the outbound header map.
///
/// All inbound headers are copied except the hop-by-hop set and the trusted
/// identity pair. When claims are present the trusted pair is set from the
/// verified subject and role; when absent, any caller-supplied values are
/// simply dropped, so unauthenticated callers can never smuggle identity
/// downstream.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    claims: Option<&IdentityClaims>,
    forwarded: &ForwardedContext,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 4);

    for (name, value) in inbound {
        if is_hop_by_hop(name) || is_trusted(name) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    if let Some(claims) = claims {
        // Verification already guaranteed these are legal header values.
        if let Ok(subject) = HeaderValue::from_str(&claims.subject) {
            outbound.insert(HeaderName::from_static(TRUSTED_SUBJECT_HEADER), subject);
        }
        if let Ok(role) = HeaderValue::from_str(&claims.role) {
            outbound.insert(HeaderName::from_static(TRUSTED_ROLE_HEADER), role);
        }
    }

    if let Some(host) = forwarded.host.as_deref() {
        if let Ok(host_value) = HeaderValue::from_str(host) {
            outbound.insert(HeaderName::from_static(FORWARDED_HOST_HEADER), host_value);
        }
    }
    if let Ok(proto_value) = HeaderValue::from_str(&forwarded.proto) {
        outbound.insert(HeaderName::from_static(FORWARDED_PROTO_HEADER), proto_value);
    }

    outbound
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn is_trusted(name: &HeaderName) -> bool {
    name.as_str() == TRUSTED_SUBJECT_HEADER || name.as_str() == TRUSTED_ROLE_HEADER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> IdentityClaims {
        IdentityClaims {
            subject: "alice".to_string(),
            role: "admin".to_string(),
            issued_at: None,
            expires_at: 2_000_000_000,
        }
    }

    fn plain_forwarded() -> ForwardedContext {
        ForwardedContext {
            host: Some("gateway.example.com".to_string()),
            proto: "http".to_string(),
        }
    }

    #[test]
    fn verified_identity_overwrites_caller_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-user-id", HeaderValue::from_static("mallory"));
        inbound.insert("x-user-role", HeaderValue::from_static("superadmin"));

        let outbound = build_outbound_headers(&inbound, Some(&claims()), &plain_forwarded());

        assert_eq!(outbound.get("x-user-id").unwrap(), "alice");
        assert_eq!(outbound.get("x-user-role").unwrap(), "admin");
    }

    #[test]
    fn caller_identity_headers_dropped_without_claims() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-user-id", HeaderValue::from_static("mallory"));

        let outbound = build_outbound_headers(&inbound, None, &plain_forwarded());

        assert!(outbound.get("x-user-id").is_none());
        assert!(outbound.get("x-user-role").is_none());
    }

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut inbound = HeaderMap::new();
        inbound.insert("connection", HeaderValue::from_static("keep-alive"));
        inbound.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        inbound.insert("host", HeaderValue::from_static("gateway.example.com"));
        inbound.insert("accept", HeaderValue::from_static("application/json"));

        let outbound = build_outbound_headers(&inbound, None, &plain_forwarded());

        assert!(outbound.get("connection").is_none());
        assert!(outbound.get("transfer-encoding").is_none());
        assert!(outbound.get("host").is_none());
        assert_eq!(outbound.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn forwarded_context_always_set() {
        let outbound = build_outbound_headers(&HeaderMap::new(), None, &plain_forwarded());

        assert_eq!(
            outbound.get("x-forwarded-host").unwrap(),
            "gateway.example.com"
        );
        assert_eq!(outbound.get("x-forwarded-proto").unwrap(), "http");
    }

    #[test]
    fn forwarded_proto_defaults_to_http() {
        let ctx = ForwardedContext::from_inbound(&HeaderMap::new());
        assert_eq!(ctx.proto, "http");
        assert!(ctx.host.is_none());
    }

    #[test]
    fn forwarded_proto_passes_through_when_present() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        inbound.insert("host", HeaderValue::from_static("edge.example.com"));

        let ctx = ForwardedContext::from_inbound(&inbound);
        assert_eq!(ctx.proto, "https");
        assert_eq!(ctx.host.as_deref(), Some("edge.example.com"));
    }
}

//! Token and client address extraction from request metadata.

use std::net::{IpAddr, SocketAddr};

use axum::http::{
    HeaderMap, Uri,
    header::{AUTHORIZATION, COOKIE},
};

/// Query parameter carrying a token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Cookie carrying a token.
pub const TOKEN_COOKIE: &str = "jwt-token";

/// Headers consulted for the client address, in order.
pub const CLIENT_IP_HEADERS: [&str; 5] = [
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "cf-connecting-ip",
    "true-client-ip",
];

/// Extract a token from, in priority order: the `Authorization: Bearer`
/// header, the `token` query parameter, the `jwt-token` cookie.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    extract_bearer_token(headers)
        .or_else(|| extract_token_from_query(uri))
        .or_else(|| extract_token_from_cookie(headers))
}

/// Token from the `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn extract_token_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == TOKEN_QUERY_PARAM && !value.trim().is_empty())
        .map(|(_, value)| {
            tracing::debug!("Token extracted from query parameter");
            value.trim().to_string()
        })
}

fn extract_token_from_cookie(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(cookies) = header.to_str() else {
            continue;
        };
        for cookie in cookies.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=')
                && name.trim() == TOKEN_COOKIE
            {
                let value = value.trim();
                if !value.is_empty() {
                    tracing::debug!(cookie_name = TOKEN_COOKIE, "Token extracted from cookie");
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Resolve the caller's address.
///
/// The first public address found in the proxy headers wins; private and
/// loopback IPv4 values are skipped there. Otherwise the peer address is
/// used. IPv4-mapped IPv6 addresses are reported in IPv4 form. Returns
/// `"unknown"` when nothing resolves.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in CLIENT_IP_HEADERS {
        for value in headers.get_all(name) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            if let Some(ip) = value
                .split(',')
                .filter_map(parse_ip)
                .find(|ip| is_public(*ip))
            {
                return ip.to_string();
            }
        }
    }

    peer.map(|addr| addr.ip().to_canonical().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("::ffff:").unwrap_or(raw);
    if raw.is_empty() || raw.eq_ignore_ascii_case("unknown") {
        return None;
    }
    raw.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private() || v4.is_loopback() || v4.is_unspecified() || v4.is_link_local())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    }
}

//! Browser-emulating header set and cookie helpers.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, PRAGMA,
    REFERER, USER_AGENT,
};

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";

/// Headers a desktop Chrome would send on a top-level navigation.
///
/// `Accept-Encoding` is left to reqwest so that it can decode the body.
pub fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let ua = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(USER_AGENT, ua);
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    let fetch_hints: [(&'static str, &'static str); 8] = [
        ("sec-ch-ua", r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""Windows""#),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
    ];
    for (name, value) in fetch_hints {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

/// Copy of `headers` with `Referer` set. Invalid URLs leave the map untouched.
pub fn with_referer(headers: &HeaderMap, referer: &str) -> HeaderMap {
    let mut headers = headers.clone();
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    headers
}

/// Copy of `headers` with `Cookie` set.
pub fn with_cookie(headers: &HeaderMap, cookie: &str) -> HeaderMap {
    let mut headers = headers.clone();
    if let Ok(value) = HeaderValue::from_str(cookie) {
        headers.insert(COOKIE, value);
    }
    headers
}

/// `name=value` part of a `Set-Cookie` value, without attributes.
pub fn cookie_pair(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?.trim();
    match pair.split_once('=') {
        Some((name, _)) if !name.trim().is_empty() => Some(pair),
        _ => None,
    }
}

/// Join the cookie pairs of several `Set-Cookie` values with `; `.
pub fn join_cookies<'a, I>(set_cookies: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let pairs: Vec<&str> = set_cookies
        .into_iter()
        .filter_map(|c| cookie_pair(c))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

//! Cookie string parsing (`name=value; name2=value2`).

use anyhow::{Result, bail};

use crate::Cookies;

/// Parse a browser-style cookie string. CR/LF are removed, items split on `;`, each item
/// split at its first `=`. Pairs with an empty name or value are dropped. Fails when no
/// pair survives.
pub fn parse_cookie_string(raw: &str) -> Result<Cookies> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let mut cookies = Cookies::new();
    for item in cleaned.split(';') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            cookies.insert(key.to_string(), value.to_string());
        }
    }
    if cookies.is_empty() {
        bail!("could not parse any name=value pair from cookie string");
    }
    Ok(cookies)
}

/// Render cookies as a single `Cookie` header value. None when there are no cookies.
pub fn cookie_header(cookies: &Cookies) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

//! Query text normalization.

use crate::error::{QueryError, QueryResult};

/// Literal marker some copied queries carry in front of the real expression.
pub const SERVICE_DATA_PREFIX: &str = "服务数据 |";

/// Field prefixes whose value is re-wrapped in double quotes.
const QUOTED_FIELDS: [&str; 2] = ["domain:", "app:"];

/// A search query: the text as typed plus its cleaned form sent to the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    raw: String,
    cleaned: String,
}

impl Query {
    /// Clean `raw`. Fails when nothing is left after cleaning.
    pub fn new(raw: impl Into<String>) -> QueryResult<Self> {
        let raw = raw.into();
        let cleaned = clean_query(&raw);
        if cleaned.is_empty() {
            return Err(QueryError::invalid("empty query"));
        }
        Ok(Self { raw, cleaned })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }
}

/// Clean a query string. Applies [`clean_pass`] until the text stops changing, so the
/// result is a fixed point: `clean_query(clean_query(s)) == clean_query(s)`.
pub fn clean_query(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One pass of the cleaning rules, in order:
/// trim + one pair of enclosing quotes, service-data prefix, unbalanced trailing `)`,
/// then `domain:` / `app:` value quoting.
pub fn clean_pass(text: &str) -> String {
    let mut s = strip_enclosing_quotes(text.trim());

    if let Some(rest) = s.strip_prefix(SERVICE_DATA_PREFIX) {
        s = rest.trim_start();
    }

    let s = strip_unbalanced_parens(s);

    for field in QUOTED_FIELDS {
        if let Some(rest) = s.strip_prefix(field) {
            return quote_field(field, rest);
        }
    }
    s.to_string()
}

fn strip_enclosing_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Drop trailing `)` while closing parens outnumber opening ones.
fn strip_unbalanced_parens(s: &str) -> &str {
    let mut s = s;
    let open = s.matches('(').count();
    let mut close = s.matches(')').count();
    while close > open && s.ends_with(')') {
        s = &s[..s.len() - 1];
        close -= 1;
    }
    s
}

fn quote_field(field: &str, value: &str) -> String {
    let value = value.trim().trim_matches('"').trim();
    format!("{field}\"{value}\"")
}

//! Search query extraction and tokenization
//!
//! The visitor's own search (`?q=rust "platform team"`) is echoed back as a
//! set of literal phrases. Quoted sequences stay together, everything else
//! splits on whitespace.

use url::Url;

/// Split a free-form query into literal phrases.
///
/// `keyword1 "exact phrase" keyword2` → `["keyword1", "exact phrase", "keyword2"]`.
/// An unterminated quote is treated as an ordinary token separator.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = query;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '"' {
            let body = &rest[1..];
            if let Some(close) = body.find('"') {
                let phrase = body[..close].trim();
                if !phrase.is_empty() {
                    tokens.push(phrase.to_string());
                }
                rest = &body[close + 1..];
            } else {
                rest = body;
            }
            continue;
        }

        let end = rest
            .find(|ch: char| ch.is_whitespace() || ch == '"')
            .unwrap_or(rest.len());
        tokens.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    tokens
}

/// Read `param` from the page URL and tokenize it.
///
/// Unparseable URLs and missing parameters both yield no phrases.
pub fn search_terms_from_url(page_url: &str, param: &str) -> Vec<String> {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = page_url, error = %e, "search query: unparseable page url");
            return Vec::new();
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| tokenize_query(&value))
        .unwrap_or_default()
}

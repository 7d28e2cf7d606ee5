//! URL normalization and link-line parsing
//!
//! Every URL stored in the bookmark set goes through [`canonical`] so that
//! lookups by URL compare like with like.

use url::Url;

/// Scheme assumed when a URL is written without one
const DEFAULT_SCHEME: &str = "gemini";

/// Default port for the schemes we know about
fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "gemini" => Some(1965),
        "gopher" => Some(70),
        "finger" => Some(79),
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Check for an explicit scheme, without mistaking `host:port` for one
fn has_scheme(s: &str) -> bool {
    let Some(pos) = s.find(':') else {
        return false;
    };
    let scheme = &s[..pos];
    let rest = &s[pos + 1..];
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return false;
    }
    rest.starts_with("//") || !(scheme.contains('.') || rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Normalize a URL for storage and comparison
///
/// - empty input stays empty (folders have no URL)
/// - a missing scheme defaults to `gemini://`
/// - scheme and host are lower-cased
/// - the scheme's default port is dropped
/// - an empty path becomes `/`
///
/// Input the URL parser rejects is returned trimmed but otherwise untouched.
pub fn canonical(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let full = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, trimmed)
    };

    let Ok(mut parsed) = Url::parse(&full) else {
        return trimmed.to_string();
    };

    // Opaque hosts of non-special schemes keep their case in the parser
    if let Some(host) = parsed.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            // Cannot fail for a host the parser already accepted
            let _ = parsed.set_host(Some(&lower));
        }
    }

    if parsed.port().is_some() && parsed.port() == default_port(parsed.scheme()) {
        // Only fails for URLs without a host, which have no port either
        let _ = parsed.set_port(None);
    }

    if parsed.has_host() && parsed.path().is_empty() && parsed.query().is_none() {
        parsed.set_path("/");
    }

    parsed.to_string()
}

/// The `scheme://authority` prefix of a URL
///
/// URLs without an authority yield everything up to and including the
/// scheme's colon.
pub fn root(url: &str) -> &str {
    if let Some(pos) = url.find("://") {
        let authority_start = pos + 3;
        let end = url[authority_start..]
            .find(['/', '?', '#'])
            .map(|i| authority_start + i)
            .unwrap_or(url.len());
        return &url[..end];
    }
    match url.find(':') {
        Some(pos) => &url[..=pos],
        None => url,
    }
}

/// Resolve `reference` against the document it was found in
pub fn absolute(base: &str, reference: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Host name of a URL, if it has one
pub fn host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Case-insensitive comparison without allocating
pub fn eq_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// A `=> url [label]` line of a Gemini document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLine<'a> {
    pub url: &'a str,
    /// Empty when the line has no label
    pub label: &'a str,
}

/// Parse one line of a Gemini document as a link line
pub fn parse_link_line(line: &str) -> Option<LinkLine<'_>> {
    let rest = line.trim_end().strip_prefix("=>")?.trim_start();
    if rest.is_empty() {
        return None;
    }
    let (url, label) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim_start()),
        None => (rest, ""),
    };
    Some(LinkLine { url, label })
}

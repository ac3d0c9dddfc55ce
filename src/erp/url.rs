//! Server URL clean-up
//!
//! Users paste whatever is in their browser bar: `erp.example.com/web#action=12`,
//! `https://erp.example.com/odoo/`, and so on. The RPC endpoints hang off the
//! bare origin, so strip the web client paths and make sure there is a scheme.

use url::Url;

const WEB_CLIENT_PATHS: [&str; 2] = ["/web", "/odoo"];

/// Reduce a pasted URL to the server base.
///
/// Keeps scheme, host, port and any path ahead of the web client routes.
/// Query strings and fragments are always dropped.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let Ok(url) = Url::parse(&with_scheme) else {
        return with_scheme.trim_end_matches('/').to_string();
    };

    let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        base.push_str(&format!(":{}", port));
    }

    let path = url.path();
    let path = match web_client_path(path) {
        Some(idx) => &path[..idx],
        None => path,
    };
    base.push_str(path.trim_end_matches('/'));
    base
}

/// Offset of the first `/web` or `/odoo` path segment.
fn web_client_path(path: &str) -> Option<usize> {
    WEB_CLIENT_PATHS
        .iter()
        .filter_map(|prefix| {
            path.match_indices(prefix)
                .find(|&(idx, _)| {
                    matches!(path[idx + prefix.len()..].chars().next(), None | Some('/'))
                })
                .map(|(idx, _)| idx)
        })
        .min()
}

/// Plain-HTTP variant of an `https://` URL, if it is one.
pub fn http_fallback(url: &str) -> Option<String> {
    url.strip_prefix("https://")
        .map(|rest| format!("http://{}", rest))
}

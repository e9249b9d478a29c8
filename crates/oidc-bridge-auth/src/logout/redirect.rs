//! Post-logout redirect URI validation.
//!
//! A candidate is allowed when some allow-list entry has the same scheme,
//! host and port, and the candidate path equals the entry path or extends it
//! by whole segments. No substring or pattern matching.
//!
//! Both sides go through [`url::Url`], so dot segments are resolved before
//! comparison. Ports compare as written: `https://a.example:443` and
//! `https://a.example` are different origins here, and two URIs without a
//! port are the only portless match.

use url::Url;

/// Checks requested post-logout redirect URIs against allow-lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostLogoutRedirectValidator;

impl PostLogoutRedirectValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if `candidate` matches any entry of `allow_list`.
    ///
    /// Unparseable URIs, on either side, never match.
    #[must_use]
    pub fn is_allowed<S: AsRef<str>>(&self, candidate: &str, allow_list: &[S]) -> bool {
        let Some(candidate) = parse_absolute(candidate) else {
            return false;
        };

        allow_list
            .iter()
            .filter_map(|entry| parse_absolute(entry.as_ref()))
            .any(|entry| matches_entry(&candidate, &entry))
    }
}

/// A parsed URI plus the port exactly as its authority spelled it.
struct Target {
    url: Url,
    port: Option<u16>,
}

fn parse_absolute(uri: &str) -> Option<Target> {
    let uri = uri.trim();
    let url = Url::parse(uri).ok()?;
    url.host_str().filter(|h| !h.is_empty())?;
    // `Url` forgets a port equal to the scheme default.
    let port = if has_written_port(uri) {
        url.port_or_known_default()
    } else {
        None
    };
    Some(Target { url, port })
}

/// Whether the authority of `uri` carries a non-empty `:port`.
fn has_written_port(uri: &str) -> bool {
    let Some((_, rest)) = uri.split_once(':') else {
        return false;
    };
    let rest = rest.trim_start_matches(['/', '\\']);
    let authority = rest.split(['/', '\\', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.chars().any(|c| !matches!(c, '\t' | '\n' | '\r')))
}

fn matches_entry(candidate: &Target, entry: &Target) -> bool {
    if candidate.port != entry.port {
        return false;
    }
    let (candidate, entry) = (&candidate.url, &entry.url);

    if !candidate.scheme().eq_ignore_ascii_case(entry.scheme()) {
        return false;
    }

    let hosts_match = match (candidate.host_str(), entry.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };
    if !hosts_match {
        return false;
    }

    let allowed_path = entry.path().trim_end_matches('/');
    if allowed_path.is_empty() {
        return true;
    }

    let path = candidate.path();
    path == allowed_path
        || path
            .strip_prefix(allowed_path)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Appends `state` to `uri` as a query parameter.
///
/// Returns `uri` unchanged if it cannot be parsed.
#[must_use]
pub fn append_state(uri: &str, state: &str) -> String {
    match Url::parse(uri) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("state", state);
            url.into()
        }
        Err(_) => uri.to_string(),
    }
}

//! Root-domain resolution for record URLs.
//!
//! Two records belong to the same protocol when their hosts share a registrable
//! domain according to the Public Suffix List, so `app.aave.com` and
//! `mirror.aave.com` both resolve to `aave.com` and `news.bbc.co.uk` resolves to
//! `bbc.co.uk` rather than `co.uk`.

use url::Url;

/// Why a URL could not be mapped to a root domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The string is not an absolute URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The URL parsed but has no registrable domain (IP host, bare suffix, no host).
    #[error("no registrable domain in '{url}'")]
    UnresolvableDomain { url: String },
}

/// Scheme and registrable domain of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
    /// URL scheme without the trailing colon, e.g. `https`.
    pub scheme: String,
    /// Registrable domain, lower-cased, e.g. `aave.com`.
    pub root_domain: String,
}

impl ResolvedDomain {
    /// `scheme://root_domain`, with no port, path, or query.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.root_domain)
    }
}

/// Resolve a URL string to its scheme and root domain.
pub fn resolve(raw: &str) -> Result<ResolvedDomain, ResolveError> {
    let url = Url::parse(raw).map_err(|e| ResolveError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    let unresolvable = || ResolveError::UnresolvableDomain {
        url: raw.to_string(),
    };

    // `domain()` is None for IP hosts and host-less URLs.
    let host = url.domain().ok_or_else(unresolvable)?;
    let host = host.strip_suffix('.').unwrap_or(host);

    let root = psl::domain_str(host).ok_or_else(unresolvable)?;

    Ok(ResolvedDomain {
        scheme: url.scheme().to_string(),
        root_domain: root.to_ascii_lowercase(),
    })
}

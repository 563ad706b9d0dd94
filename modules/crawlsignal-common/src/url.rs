use url::Url;

/// Canonicalize a URL: parse, strip the fragment, lowercase the host. Applied
/// on enqueue so the visited set and host buckets key on a stable form.
/// Idempotent: `canonicalize(canonicalize(u)) == canonicalize(u)`.
pub fn canonicalize_url(input: &str) -> Option<String> {
    let mut url = Url::parse(input).ok()?;
    url.set_fragment(None);
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        let _ = url.set_host(Some(&lowered));
    }
    Some(url.to_string())
}

pub fn registrable_domain(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    let host = url.host_str()?;
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() <= 2 {
        Some(host.to_string())
    } else {
        Some(parts[parts.len() - 2..].join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment() {
        let a = canonicalize_url("https://example.com/path#section").unwrap();
        assert_eq!(a, "https://example.com/path");
    }

    #[test]
    fn idempotent() {
        let once = canonicalize_url("HTTPS://Example.com/path#frag").unwrap();
        let twice = canonicalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn registrable_domain_strips_subdomain() {
        assert_eq!(registrable_domain("https://www.example.com/a").unwrap(), "example.com");
    }
}

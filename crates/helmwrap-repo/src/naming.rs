//! Registration names for repository URLs
//!
//! Both the referenced-repository path and dependency discovery name
//! repositories through [`registration_name`], so one URL always ends up
//! under one name.

const GITHUB_PAGES: &str = ".github.io";

/// Derive the Helm registration name for a repository URL
///
/// `https://prometheus-community.github.io/helm-charts` becomes
/// `prometheus-community`, `https://charts.bitnami.com/bitnami` becomes
/// `charts-bitnami-com`. OCI references and the empty string yield an
/// empty name, meaning "do not register".
pub fn registration_name(url: &str) -> String {
    if url.is_empty() || url.starts_with("oci://") {
        return String::new();
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    if let Some(idx) = rest.find(GITHUB_PAGES).filter(|&idx| idx > 0) {
        return rest[..idx].to_string();
    }
    if let Some(idx) = rest.find('/').filter(|&idx| idx > 0) {
        return rest[..idx].replace('.', "-");
    }
    rest.replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_pages() {
        assert_eq!(
            registration_name("https://prometheus-community.github.io/helm-charts"),
            "prometheus-community"
        );
        assert_eq!(
            registration_name("https://grafana.github.io/helm-charts"),
            "grafana"
        );
    }

    #[test]
    fn test_host_with_path() {
        assert_eq!(
            registration_name("https://charts.bitnami.com/bitnami"),
            "charts-bitnami-com"
        );
        assert_eq!(
            registration_name("http://localhost:8879/charts"),
            "localhost:8879"
        );
    }

    #[test]
    fn test_bare_host() {
        assert_eq!(registration_name("https://charts.jetstack.io"), "charts-jetstack-io");
        assert_eq!(registration_name("charts.example.com"), "charts-example-com");
    }

    #[test]
    fn test_unregistrable() {
        assert_eq!(registration_name(""), "");
        assert_eq!(registration_name("oci://ghcr.io/org/charts"), "");
        assert_eq!(registration_name("oci://registry-1.docker.io/bitnamicharts"), "");
    }

    #[test]
    fn test_leading_marker_not_used() {
        // A marker at position zero leaves nothing to name the repository after
        assert_eq!(registration_name("https://.github.io"), "-github-io");
        assert_eq!(registration_name("https:///charts"), "/charts");
    }

    #[test]
    fn test_stable() {
        let url = "https://kubernetes.github.io/ingress-nginx";
        let first = registration_name(url);
        for _ in 0..3 {
            assert_eq!(registration_name(url), first);
        }
    }
}

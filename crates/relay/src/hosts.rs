/// A set of host names with optional `*.` subdomain wildcards
///
/// `*.cloudfront.net` matches `d1.cloudfront.net` and `a.b.cloudfront.net`
/// but neither `cloudfront.net` nor `evilcloudfront.net`.
#[derive(Debug, Clone, Default)]
pub struct HostSet {
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl HostSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();

        for pattern in patterns {
            let pattern = normalize(pattern.as_ref());
            match pattern.strip_prefix("*.") {
                Some(domain) => set.suffixes.push(format!(".{domain}")),
                None => set.exact.push(pattern),
            }
        }

        set
    }

    pub fn contains(&self, host: &str) -> bool {
        let host = normalize(host);

        self.exact.iter().any(|exact| *exact == host)
            || self
                .suffixes
                .iter()
                .any(|suffix| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
    }
}

fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

//! Matching of LTO-renamed functions
//!
//! LTO-generated function names take a form:
//!
//! ```text
//! <function_name>.lto_priv.<decimal_number>
//! <function_name>.constprop.<decimal_number>
//! <function_name>.lto_priv.<decimal_number1>.lto_priv.<decimal_number2>
//! ```
//!
//! The number is a global counter for the whole program, so a tiny change in
//! the program renumbers many functions and exact name matching leaves them
//! without a profile. Profiles are therefore also bucketed by their common
//! name, the part before the first marker, and a function is matched against
//! every profile in its bucket. Picking one of several bucket members is up to
//! the caller.

use std::collections::HashMap;

const LTO_MARKERS: [&str; 2] = [".lto_priv.", ".constprop."];

/// Return the common part of an LTO name, or `None` for names without a marker
pub fn lto_common_name(name: &str) -> Option<&str> {
    LTO_MARKERS
        .iter()
        .filter_map(|marker| name.find(marker))
        .min()
        .map(|pos| &name[..pos])
}

/// Common LTO name -> names of the profiles sharing it
#[derive(Debug, Default, Clone)]
pub struct LtoNameMap<'a> {
    buckets: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> LtoNameMap<'a> {
    /// Bucket `names` by common name, preserving their order inside each bucket
    pub fn build<I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut buckets: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        for name in names {
            if let Some(common) = lto_common_name(name) {
                buckets.entry(common).or_default().push(name);
            }
        }
        Self { buckets }
    }

    /// Profile names sharing a bucket with any of `candidates`
    ///
    /// Each bucket contributes once even if several candidates map to it.
    pub fn lookup<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<&'a str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut matches = Vec::new();
        for candidate in candidates {
            let Some(common) = lto_common_name(candidate.as_ref()) else {
                continue;
            };
            if seen.contains(&common) {
                continue;
            }
            seen.push(common);
            if let Some(bucket) = self.buckets.get(common) {
                matches.extend(bucket.iter().copied());
            }
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_name() {
        assert_eq!(lto_common_name("foo.lto_priv.123"), Some("foo"));
        assert_eq!(lto_common_name("foo.lto_priv.1.lto_priv.2"), Some("foo"));
        assert_eq!(lto_common_name("bar.constprop.0"), Some("bar"));
        assert_eq!(lto_common_name("baz.constprop.0.lto_priv.7"), Some("baz"));
        assert_eq!(lto_common_name("plainname"), None);
        assert_eq!(lto_common_name("lto_priv.3"), None);
    }

    #[test]
    fn test_lookup_returns_whole_bucket() {
        let map = LtoNameMap::build(["f.lto_priv.1", "f.lto_priv.2", "g.lto_priv.1", "plain"]);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.lookup(&["f.lto_priv.999"]),
            vec!["f.lto_priv.1", "f.lto_priv.2"]
        );
    }

    #[test]
    fn test_lookup_without_marker_is_empty() {
        let map = LtoNameMap::build(["f.lto_priv.1"]);
        assert!(map.lookup(&["f"]).is_empty());
        assert!(map.lookup(&["h.lto_priv.1"]).is_empty());
    }

    #[test]
    fn test_lookup_deduplicates_buckets() {
        let map = LtoNameMap::build(["f.lto_priv.1", "f.constprop.2"]);
        let found = map.lookup(&["f.lto_priv.5", "f.constprop.9"]);
        assert_eq!(found, vec!["f.lto_priv.1", "f.constprop.2"]);
    }
}

//! Cached result of the latest-release lookup

use chrono::{DateTime, Duration, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

/// How long a lookup result is trusted before asking again
pub const CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCache {
    pub latest: String,
    pub checked_at: DateTime<Utc>,
}

impl VersionCache {
    pub fn new(latest: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            latest: latest.into(),
            checked_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.checked_at) < Duration::hours(CACHE_TTL_HOURS)
    }

    /// The cached version, if it is newer than `current`
    pub fn update_for(&self, current: &str) -> Option<&str> {
        is_newer(&self.latest, current).then_some(self.latest.as_str())
    }
}

/// Whether a lookup is due, given what is cached
pub fn needs_refresh(cache: Option<&VersionCache>, now: DateTime<Utc>) -> bool {
    cache.is_none_or(|c| !c.is_fresh(now))
}

/// Whether `candidate` is a later release than `current`.
///
/// Only major.minor.patch count, so pre-release and build suffixes are ignored.
/// Versions that do not parse are never newer.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (release(candidate), release(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

/// `(major, minor, patch)`, accepting a `v` prefix and missing minor/patch parts
fn release(raw: &str) -> Option<(u64, u64, u64)> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let version = Version::parse(raw).ok().or_else(|| {
        let (core, suffix) = raw.split_at(raw.find(['-', '+']).unwrap_or(raw.len()));
        let missing = 3usize.saturating_sub(core.split('.').count());
        Version::parse(&format!("{core}{}{suffix}", ".0".repeat(missing))).ok()
    })?;
    Some((version.major, version.minor, version.patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(is_newer("1.10.0", "1.9.3"));
        assert!(is_newer("2.0", "1.99.99"));
        assert!(!is_newer("1.4.0", "1.4.0"));
        assert!(!is_newer("1.4.0-beta.1", "1.4.0"));
        assert!(is_newer("v1.4.1", "1.4.0"));
        assert!(!is_newer("1.3.9", "1.4"));
    }

    #[test]
    fn unparseable_versions_are_never_newer() {
        assert!(!is_newer("latest", "1.4.0"));
        assert!(!is_newer("1.x.0", "1.4.0"));
        assert!(!is_newer("2.0.0", ""));
    }

    #[test]
    fn freshness_window() {
        let now = Utc::now();
        let cache = VersionCache::new("1.5.0", now - Duration::hours(23));
        assert!(cache.is_fresh(now));
        assert!(!needs_refresh(Some(&cache), now));

        let stale = VersionCache::new("1.5.0", now - Duration::hours(25));
        assert!(!stale.is_fresh(now));
        assert!(needs_refresh(Some(&stale), now));
        assert!(needs_refresh(None, now));
    }

    #[test]
    fn update_hint_only_when_newer() {
        let cache = VersionCache::new("1.5.0", Utc::now());
        assert_eq!(cache.update_for("1.4.0"), Some("1.5.0"));
        assert_eq!(cache.update_for("1.5.0"), None);
    }

    #[test]
    fn serialized_field_names() {
        let cache = VersionCache::new("1.5.0", Utc::now());
        let v = serde_json::to_value(&cache).unwrap();
        assert!(v.get("checkedAt").is_some());
        assert_eq!(v["latest"], "1.5.0");
    }
}

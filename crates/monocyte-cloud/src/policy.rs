//! Region policy
//!
//! Two independent predicates decide what a sweep looks at and what it flags:
//!
//! - *allowed*: the region is within policy (prefix match)
//! - *ignored*: the region is out of scope for these credentials and must not be
//!   enumerated at all
//!
//! Handlers receive the combined `is_region_handled` predicate, so regions that are
//! disallowed but not ignored are still enumerated and their resources reported.

use std::fmt;
use std::sync::Arc;

/// Region predicate handed to handlers at construction
pub type RegionFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &["eu"];
pub const DEFAULT_IGNORED_REGIONS: &[&str] = &["cn-north-1", "us-gov-west-1"];

#[derive(Clone, PartialEq, Eq)]
pub struct RegionPolicy {
    allowed_prefixes: Vec<String>,
    ignored_regions: Vec<String>,
}

impl RegionPolicy {
    pub fn new<A, I>(allowed_prefixes: A, ignored_regions: I) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            allowed_prefixes: normalize(allowed_prefixes),
            ignored_regions: normalize(ignored_regions),
        }
    }

    pub fn allowed_prefixes(&self) -> &[String] {
        &self.allowed_prefixes
    }

    pub fn ignored_regions(&self) -> &[String] {
        &self.ignored_regions
    }

    /// Case-insensitive prefix match against the approved prefixes
    pub fn is_region_allowed(&self, region: &str) -> bool {
        let region = region.to_lowercase();
        self.allowed_prefixes
            .iter()
            .any(|prefix| region.starts_with(prefix.as_str()))
    }

    pub fn is_region_ignored(&self, region: &str) -> bool {
        let region = region.to_lowercase();
        self.ignored_regions.iter().any(|ignored| *ignored == region)
    }

    /// Whether handlers should enumerate this region
    pub fn is_region_handled(&self, region: &str) -> bool {
        self.is_region_allowed(region) || !self.is_region_ignored(region)
    }

    /// The `is_region_handled` predicate as a shareable callable
    pub fn region_filter(&self) -> RegionFilter {
        let policy = self.clone();
        Arc::new(move |region: &str| policy.is_region_handled(region))
    }
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_PREFIXES, DEFAULT_IGNORED_REGIONS)
    }
}

impl fmt::Debug for RegionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionPolicy")
            .field("allowed_prefixes", &self.allowed_prefixes)
            .field("ignored_regions", &self.ignored_regions)
            .finish()
    }
}

impl fmt::Display for RegionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allowed prefixes [{}], ignored regions [{}]",
            self.allowed_prefixes.join(", "),
            self.ignored_regions.join(", ")
        )
    }
}

fn normalize<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim().to_lowercase();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

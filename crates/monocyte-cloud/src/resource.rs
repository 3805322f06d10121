//! Uniform wrapper around provider-native objects

use chrono::{DateTime, Utc};

/// Region assumed when a provider reports no location at all.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Region sentinel used when the location of a resource could not be resolved.
pub const ERROR_REGION: &str = "__error__";

/// One provider-returned object together with its resolved region.
///
/// `wrapped` is the exact handle the provider returned. It is never copied or
/// rebuilt, so `Handler::delete` acts on the same object that was fetched.
#[derive(Debug, Clone)]
pub struct Resource<T> {
    /// Provider-native object
    pub wrapped: T,

    /// Resolved region, or `ERROR_REGION`
    pub region: String,

    /// Resource type (e.g. "ec2.Instance", "s3.Bucket")
    pub resource_type: String,

    /// Provider identifier; two resources with the same id are duplicates
    pub resource_id: String,

    /// Creation timestamp if the provider reports one
    pub creation_date: Option<DateTime<Utc>>,
}

impl<T> Resource<T> {
    pub fn new(
        wrapped: T,
        region: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            wrapped,
            region: region.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            creation_date: None,
        }
    }

    pub fn with_creation_date(mut self, creation_date: Option<DateTime<Utc>>) -> Self {
        self.creation_date = creation_date;
        self
    }

    /// Whether the region could not be resolved
    pub fn has_unresolved_region(&self) -> bool {
        self.region == ERROR_REGION
    }

    /// Dedup key used by the sweep driver (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.resource_id)
    }
}

/// Normalize a provider location to a concrete region.
///
/// An empty or missing location means the provider's default region.
pub fn resolve_region(location: Option<&str>) -> String {
    match location.map(str::trim) {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some(region) => region.to_string(),
    }
}

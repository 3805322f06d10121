//! S3 bucket handler
//!
//! Bucket listing is account-global, so the region filter does not narrow the
//! enumeration: every bucket is listed and its location resolved one by one.

use crate::api::{S3Api, SdkS3};
use crate::context::AwsContext;
use crate::ec2::to_chrono;
use crate::error::AwsError;
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::types::Bucket;
use monocyte_cloud::{
    DeleteOutcome, ERROR_REGION, Handler, HandlerFactory, RegionFilter, Resource,
    ResourceStream, Result, SweepError, SweepTarget, resolve_region,
};
use std::sync::Arc;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "s3";
pub const RESOURCE_TYPE: &str = "s3.Bucket";

/// Map a raw S3 location constraint to a region name.
///
/// S3 reports buckets in us-east-1 with an empty constraint, and very old
/// eu-west-1 buckets with the legacy value `EU`.
pub fn map_location(location: Option<&str>) -> String {
    match location.map(str::trim) {
        Some("EU") => "eu-west-1".to_string(),
        other => resolve_region(other),
    }
}

pub struct S3Handler {
    api: Arc<dyn S3Api>,
    dry_run: bool,
    delete_enabled: bool,
}

impl S3Handler {
    pub fn new(api: Arc<dyn S3Api>) -> Self {
        Self {
            api,
            dry_run: true,
            delete_enabled: false,
        }
    }

    pub fn with_delete_enabled(mut self, enabled: bool) -> Self {
        self.delete_enabled = enabled;
        self
    }

    pub fn delete_enabled(&self) -> bool {
        self.delete_enabled
    }

    /// Resolve a bucket's region.
    ///
    /// - `Ok(Some(region))`: resolved, or `ERROR_REGION` for a service error
    /// - `Ok(None)`: the lookup failed with HTTP 400; skip this bucket
    /// - `Err`: transport failure, abort the sweep of this handler
    async fn locate(&self, bucket: &str) -> std::result::Result<Option<String>, AwsError> {
        match self.api.bucket_location(bucket).await {
            Ok(location) => Ok(Some(map_location(location.as_deref()))),
            Err(e) if e.is_bad_request() => {
                warn!(bucket, error = %e, "Got an error during get_bucket_location, skipping");
                Ok(None)
            }
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                warn!(bucket, error = %e, "Unable to resolve bucket location");
                Ok(Some(ERROR_REGION.to_string()))
            }
        }
    }
}

#[async_trait]
impl Handler for S3Handler {
    type Item = Bucket;

    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    fn fetch_all_resources(&self) -> ResourceStream<'_, Bucket> {
        Box::pin(stream! {
            let buckets = match self.api.list_buckets().await {
                Ok(buckets) => buckets,
                Err(e) => {
                    yield Err(SweepError::from(e));
                    return;
                }
            };

            for bucket in buckets {
                let Some(name) = bucket.name().map(str::to_string) else {
                    warn!("Bucket without name, skipping");
                    continue;
                };

                let region = match self.locate(&name).await {
                    Ok(Some(region)) => region,
                    Ok(None) => continue,
                    Err(e) => {
                        yield Err(SweepError::from(e));
                        return;
                    }
                };

                let created = bucket.creation_date().and_then(to_chrono);
                yield Ok(Resource::new(bucket, region, RESOURCE_TYPE, name)
                    .with_creation_date(created));
            }
        })
    }

    fn describe(&self, resource: &Resource<Bucket>) -> String {
        format!(
            "s3 bucket found in {}\n\t{}, created {}",
            resource.region,
            resource.resource_id,
            resource
                .creation_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        )
    }

    async fn delete(&self, resource: &Resource<Bucket>) -> Result<DeleteOutcome> {
        let name = resource.resource_id.as_str();

        // S3 has no server-side dry-run check.
        if self.dry_run {
            return Ok(DeleteOutcome::dry_run(format!("would delete bucket {name}")));
        }

        if !self.delete_enabled {
            warn!(bucket = name, "Bucket deletion is disabled, leaving bucket in place");
            return Ok(DeleteOutcome::skipped(
                "bucket deletion is disabled (s3.allow_delete)",
            ));
        }

        if resource.has_unresolved_region() {
            return Ok(DeleteOutcome::skipped("bucket region could not be resolved"));
        }

        match self.api.delete_bucket(&resource.region, name).await {
            Ok(()) => {
                info!(bucket = name, region = %resource.region, "Deleted bucket");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.is_not_found() => {
                info!(bucket = name, "Bucket already gone");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => Err(SweepError::DeletionFailed {
                resource_id: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Builds an `S3Handler` per sweep
pub struct S3HandlerFactory {
    api: Arc<dyn S3Api>,
    delete_enabled: bool,
}

impl S3HandlerFactory {
    pub fn new(api: Arc<dyn S3Api>) -> Self {
        Self {
            api,
            delete_enabled: false,
        }
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self::new(Arc::new(SdkS3::new(ctx.clone())))
    }

    pub fn with_delete_enabled(mut self, enabled: bool) -> Self {
        self.delete_enabled = enabled;
        self
    }
}

#[async_trait]
impl HandlerFactory for S3HandlerFactory {
    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn deletion_enabled(&self) -> bool {
        self.delete_enabled
    }

    async fn build(
        &self,
        _region_filter: RegionFilter,
        dry_run: bool,
    ) -> Result<Box<dyn SweepTarget>> {
        let mut handler =
            S3Handler::new(Arc::clone(&self.api)).with_delete_enabled(self.delete_enabled);
        handler.set_dry_run(dry_run);
        Ok(Box::new(handler))
    }
}

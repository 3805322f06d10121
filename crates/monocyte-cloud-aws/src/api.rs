//! Narrow client seams over the AWS SDK
//!
//! Handlers only talk to AWS through these traits. `SdkEc2` and `SdkS3` are the
//! real implementations; tests substitute in-memory ones.

use crate::context::AwsContext;
use crate::error::{Result, classify_sdk_error};
use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, Instance};
use aws_sdk_s3::operation::list_object_versions::ListObjectVersionsOutput;
use aws_sdk_s3::types::Bucket;
use tracing::debug;

/// Instance states that still count as existing infrastructure
const LIVE_INSTANCE_STATES: &[&str] = &["pending", "running", "stopping", "stopped"];

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Names of every region enabled for the account
    async fn describe_regions(&self) -> Result<Vec<String>>;

    /// All live instances in `region`
    async fn describe_instances(&self, region: &str) -> Result<Vec<Instance>>;

    /// Terminate one instance. With `dry_run` set, AWS answers with a
    /// `DryRunOperation` error when the call would have succeeded.
    async fn terminate_instance(&self, region: &str, instance_id: &str, dry_run: bool)
    -> Result<()>;
}

#[async_trait]
pub trait S3Api: Send + Sync {
    /// Every bucket owned by the account (S3 listing is global)
    async fn list_buckets(&self) -> Result<Vec<Bucket>>;

    /// Raw location constraint of a bucket; `None` or empty means us-east-1
    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>>;

    /// Empty and delete a bucket located in `region`
    async fn delete_bucket(&self, region: &str, bucket: &str) -> Result<()>;
}

/// EC2 via the AWS SDK
pub struct SdkEc2 {
    ctx: AwsContext,
}

impl SdkEc2 {
    pub fn new(ctx: AwsContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Ec2Api for SdkEc2 {
    async fn describe_regions(&self) -> Result<Vec<String>> {
        let output = self
            .ctx
            .ec2_client()
            .describe_regions()
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let regions: Vec<String> = output
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(str::to_string)
            .collect();

        debug!(count = regions.len(), "Resolved EC2 regions");
        Ok(regions)
    }

    async fn describe_instances(&self, region: &str) -> Result<Vec<Instance>> {
        let client = self.ctx.ec2_client_for(region);
        let state_filter = LIVE_INSTANCE_STATES
            .iter()
            .fold(Filter::builder().name("instance-state-name"), |f, s| {
                f.values(*s)
            })
            .build();

        let mut pages = client
            .describe_instances()
            .filters(state_filter)
            .into_paginator()
            .send();

        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            for reservation in page.reservations() {
                instances.extend(reservation.instances().iter().cloned());
            }
        }

        debug!(region, count = instances.len(), "Found EC2 instances");
        Ok(instances)
    }

    async fn terminate_instance(
        &self,
        region: &str,
        instance_id: &str,
        dry_run: bool,
    ) -> Result<()> {
        self.ctx
            .ec2_client_for(region)
            .terminate_instances()
            .instance_ids(instance_id)
            .dry_run(dry_run)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

/// S3 via the AWS SDK
pub struct SdkS3 {
    ctx: AwsContext,
}

impl SdkS3 {
    pub fn new(ctx: AwsContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl S3Api for SdkS3 {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let output = self
            .ctx
            .s3_client()
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let buckets = output.buckets().to_vec();
        debug!(count = buckets.len(), "Found S3 buckets");
        Ok(buckets)
    }

    async fn bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        let output = self
            .ctx
            .s3_client()
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(output
            .location_constraint()
            .map(|c| c.as_str().to_string()))
    }

    /// Remove every object version and delete marker, then the bucket itself.
    ///
    /// Unversioned buckets list their objects with the version id `null`, so
    /// the same loop empties both kinds.
    async fn delete_bucket(&self, region: &str, bucket: &str) -> Result<()> {
        let client = self.ctx.s3_client_for(region);

        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;
        loop {
            let response = client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_marker.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            for (key, version_id) in version_targets(&response) {
                debug!(bucket, key, version = ?version_id, "Deleting object version");
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .set_version_id(version_id)
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error(&e))?;
            }

            if response.is_truncated() != Some(true) {
                break;
            }
            key_marker = response.next_key_marker().map(str::to_string);
            version_marker = response.next_version_id_marker().map(str::to_string);
            if key_marker.is_none() && version_marker.is_none() {
                break;
            }
        }

        client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

/// (key, version id) of every object version and delete marker on one page
fn version_targets(page: &ListObjectVersionsOutput) -> Vec<(String, Option<String>)> {
    let versions = page
        .versions()
        .iter()
        .filter_map(|v| Some((v.key()?.to_string(), v.version_id().map(str::to_string))));
    let markers = page
        .delete_markers()
        .iter()
        .filter_map(|m| Some((m.key()?.to_string(), m.version_id().map(str::to_string))));
    versions.chain(markers).collect()
}

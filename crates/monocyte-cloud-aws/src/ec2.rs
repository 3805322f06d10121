//! EC2 instance handler

use crate::api::{Ec2Api, SdkEc2};
use crate::context::AwsContext;
use crate::error::AwsError;
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_ec2::types::Instance;
use chrono::{DateTime, Utc};
use monocyte_cloud::{
    DeleteOutcome, Handler, HandlerFactory, RegionFilter, Resource, ResourceStream, Result,
    SweepError, SweepTarget,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SERVICE_NAME: &str = "ec2";
pub const RESOURCE_TYPE: &str = "ec2.Instance";

/// Finds EC2 instances in every handled region.
///
/// Real termination is behind a circuit breaker (`with_terminate_enabled`) that is
/// off by default: with dry run disabled and the breaker off, violations are
/// reported but nothing is terminated.
pub struct Ec2Handler {
    api: Arc<dyn Ec2Api>,
    regions: Vec<String>,
    dry_run: bool,
    terminate_enabled: bool,
}

impl Ec2Handler {
    /// Resolve the candidate regions. This is the only AWS call made at
    /// construction time.
    pub async fn new(
        api: Arc<dyn Ec2Api>,
        region_filter: RegionFilter,
    ) -> std::result::Result<Self, AwsError> {
        let regions: Vec<String> = api
            .describe_regions()
            .await?
            .into_iter()
            .filter(|r| region_filter(r))
            .collect();

        debug!(regions = ?regions, "EC2 regions to inspect");

        Ok(Self {
            api,
            regions,
            dry_run: true,
            terminate_enabled: false,
        })
    }

    pub fn with_terminate_enabled(mut self, enabled: bool) -> Self {
        self.terminate_enabled = enabled;
        self
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn terminate_enabled(&self) -> bool {
        self.terminate_enabled
    }
}

#[async_trait]
impl Handler for Ec2Handler {
    type Item = Instance;

    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    fn fetch_all_resources(&self) -> ResourceStream<'_, Instance> {
        Box::pin(stream! {
            for region in &self.regions {
                let instances = match self.api.describe_instances(region).await {
                    Ok(instances) => instances,
                    Err(e) => {
                        yield Err(SweepError::from(e));
                        return;
                    }
                };

                for instance in instances {
                    let Some(id) = instance.instance_id().map(str::to_string) else {
                        warn!(region = %region, "Instance without id, skipping");
                        continue;
                    };
                    let launched = instance.launch_time().and_then(to_chrono);
                    yield Ok(Resource::new(instance, region.clone(), RESOURCE_TYPE, id)
                        .with_creation_date(launched));
                }
            }
        })
    }

    fn describe(&self, resource: &Resource<Instance>) -> String {
        let instance = &resource.wrapped;
        format!(
            "ec2 instance found in {}\n\t{} [{}] - {}, since {}\n\tip {}, key {}",
            resource.region,
            resource.resource_id,
            instance.image_id().unwrap_or("-"),
            instance
                .instance_type()
                .map(|t| t.as_str())
                .unwrap_or("-"),
            resource
                .creation_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            instance
                .public_dns_name()
                .filter(|s| !s.is_empty())
                .unwrap_or("-"),
            instance.key_name().unwrap_or("-"),
        )
    }

    async fn delete(&self, resource: &Resource<Instance>) -> Result<DeleteOutcome> {
        let id = resource.resource_id.as_str();

        if self.dry_run {
            return match self.api.terminate_instance(&resource.region, id, true).await {
                Ok(()) => Ok(DeleteOutcome::dry_run("termination check passed")),
                Err(e) if e.is_dry_run_success() => {
                    info!(instance = id, region = %resource.region, "Termination {}", e);
                    Ok(DeleteOutcome::dry_run(e.to_string()))
                }
                Err(e) => Err(e.into()),
            };
        }

        if !self.terminate_enabled {
            warn!(
                instance = id,
                region = %resource.region,
                "Instance termination is disabled, leaving instance running"
            );
            return Ok(DeleteOutcome::skipped(
                "instance termination is disabled (ec2.allow_terminate)",
            ));
        }

        self.api
            .terminate_instance(&resource.region, id, false)
            .await
            .map_err(|e| SweepError::DeletionFailed {
                resource_id: id.to_string(),
                message: e.to_string(),
            })?;

        info!(instance = id, region = %resource.region, "Terminated instance");
        Ok(DeleteOutcome::Deleted)
    }
}

/// Builds an `Ec2Handler` per sweep
pub struct Ec2HandlerFactory {
    api: Arc<dyn Ec2Api>,
    terminate_enabled: bool,
}

impl Ec2HandlerFactory {
    pub fn new(api: Arc<dyn Ec2Api>) -> Self {
        Self {
            api,
            terminate_enabled: false,
        }
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self::new(Arc::new(SdkEc2::new(ctx.clone())))
    }

    pub fn with_terminate_enabled(mut self, enabled: bool) -> Self {
        self.terminate_enabled = enabled;
        self
    }
}

#[async_trait]
impl HandlerFactory for Ec2HandlerFactory {
    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn deletion_enabled(&self) -> bool {
        self.terminate_enabled
    }

    async fn build(
        &self,
        region_filter: RegionFilter,
        dry_run: bool,
    ) -> Result<Box<dyn SweepTarget>> {
        let mut handler = Ec2Handler::new(Arc::clone(&self.api), region_filter)
            .await
            .map_err(|e| SweepError::HandlerBuild {
                service: SERVICE_NAME,
                message: e.to_string(),
            })?
            .with_terminate_enabled(self.terminate_enabled);
        handler.set_dry_run(dry_run);
        Ok(Box::new(handler))
    }
}

pub(crate) fn to_chrono(dt: &aws_sdk_ec2::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

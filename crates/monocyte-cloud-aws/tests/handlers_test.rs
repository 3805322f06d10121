//! EC2 and S3 handlers against in-memory AWS fakes

use async_trait::async_trait;
use aws_sdk_ec2::types::{Instance, InstanceType};
use aws_sdk_s3::types::Bucket;
use futures_util::TryStreamExt;
use monocyte_cloud::{
    DeleteOutcome, ERROR_REGION, Handler, HandlerRegistry, NoopObserver, RegionPolicy, Resource,
    SweepError, Sweeper, sweep_handler,
};
use monocyte_cloud_aws::{
    AwsError, Ec2Api, Ec2Handler, Ec2HandlerFactory, S3Api, S3Handler, S3HandlerFactory,
    classify_aws_error,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const LAUNCH_SECS: i64 = 1_700_000_000;

// ---------------------------------------------------------------------------
// EC2 fake

#[derive(Clone, Copy, PartialEq, Eq)]
enum DryRunAnswer {
    /// DryRunOperation / 412: the caller is allowed to terminate
    WouldSucceed,
    /// UnauthorizedOperation / 403
    Unauthorized,
}

struct FakeEc2 {
    regions: Vec<String>,
    instances: Mutex<Vec<(String, Instance)>>,
    dry_run_answer: DryRunAnswer,
    failing_region: Option<String>,
    describe_calls: Mutex<Vec<String>>,
    terminate_calls: Mutex<Vec<(String, String, bool)>>,
}

impl FakeEc2 {
    fn new(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            instances: Mutex::new(Vec::new()),
            dry_run_answer: DryRunAnswer::WouldSucceed,
            failing_region: None,
            describe_calls: Mutex::new(Vec::new()),
            terminate_calls: Mutex::new(Vec::new()),
        }
    }

    fn launch(&self, region: &str, id: &str) {
        let instance = Instance::builder()
            .instance_id(id)
            .image_id("ami-0abc")
            .instance_type(InstanceType::T3Micro)
            .key_name("ops")
            .public_dns_name(format!("{id}.compute.amazonaws.com"))
            .launch_time(aws_sdk_ec2::primitives::DateTime::from_secs(LAUNCH_SECS))
            .build();
        self.instances
            .lock()
            .unwrap()
            .push((region.to_string(), instance));
    }

    fn instance_ids(&self) -> Vec<String> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, i)| i.instance_id().map(str::to_string))
            .collect()
    }

    fn terminate_calls(&self) -> Vec<(String, String, bool)> {
        self.terminate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn describe_regions(&self) -> monocyte_cloud_aws::Result<Vec<String>> {
        Ok(self.regions.clone())
    }

    async fn describe_instances(&self, region: &str) -> monocyte_cloud_aws::Result<Vec<Instance>> {
        self.describe_calls.lock().unwrap().push(region.to_string());
        if self.failing_region.as_deref() == Some(region) {
            return Err(classify_aws_error(
                Some(401),
                Some("AuthFailure"),
                Some("AWS was not able to validate the provided access credentials"),
            ));
        }
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == region)
            .map(|(_, i)| i.clone())
            .collect())
    }

    async fn terminate_instance(
        &self,
        region: &str,
        instance_id: &str,
        dry_run: bool,
    ) -> monocyte_cloud_aws::Result<()> {
        self.terminate_calls.lock().unwrap().push((
            region.to_string(),
            instance_id.to_string(),
            dry_run,
        ));
        if dry_run {
            return Err(match self.dry_run_answer {
                DryRunAnswer::WouldSucceed => classify_aws_error(
                    Some(412),
                    Some("DryRunOperation"),
                    Some("Request would have succeeded, but DryRun flag is set."),
                ),
                DryRunAnswer::Unauthorized => classify_aws_error(
                    Some(403),
                    Some("UnauthorizedOperation"),
                    Some("You are not authorized to perform this operation."),
                ),
            });
        }
        self.instances
            .lock()
            .unwrap()
            .retain(|(_, i)| i.instance_id() != Some(instance_id));
        Ok(())
    }
}

async fn ec2_handler(fake: Arc<FakeEc2>) -> Ec2Handler {
    Ec2Handler::new(fake, RegionPolicy::default().region_filter())
        .await
        .unwrap()
}

async fn fetch<H: Handler>(handler: &H) -> Vec<Resource<H::Item>> {
    handler.fetch_all_resources().try_collect().await.unwrap()
}

#[tokio::test]
async fn test_ec2_construction_filters_regions_without_enumerating() {
    let fake = Arc::new(FakeEc2::new(&[
        "eu-west-1",
        "us-east-1",
        "cn-north-1",
        "us-gov-west-1",
    ]));

    let handler = ec2_handler(fake.clone()).await;

    assert_eq!(handler.regions(), ["eu-west-1", "us-east-1"]);
    assert!(handler.dry_run());
    assert!(!handler.terminate_enabled());
    assert!(fake.describe_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ec2_fetch_attaches_region() {
    let fake = Arc::new(FakeEc2::new(&["eu-west-1", "us-east-1"]));
    fake.launch("eu-west-1", "i-eu");
    fake.launch("us-east-1", "i-us");
    let handler = ec2_handler(fake).await;

    let resources = fetch(&handler).await;

    let found: Vec<(String, String)> = resources
        .iter()
        .map(|r| (r.resource_id.clone(), r.region.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("i-eu".to_string(), "eu-west-1".to_string()),
            ("i-us".to_string(), "us-east-1".to_string()),
        ]
    );
    assert!(resources.iter().all(|r| r.resource_type == "ec2.Instance"));
    assert_eq!(
        resources[0].creation_date.map(|d| d.timestamp()),
        Some(LAUNCH_SECS)
    );
}

#[tokio::test]
async fn test_ec2_describe() {
    let fake = Arc::new(FakeEc2::new(&["us-east-1"]));
    fake.launch("us-east-1", "i-123");
    let handler = ec2_handler(fake).await;
    let resources = fetch(&handler).await;

    let text = handler.describe(&resources[0]);

    assert!(text.starts_with("ec2 instance found in us-east-1"));
    assert!(text.contains("i-123 [ami-0abc] - t3.micro, since 2023-11-14T22:13:20"));
    assert!(text.contains("ip i-123.compute.amazonaws.com, key ops"));
}

#[tokio::test]
async fn test_ec2_dry_run_precondition_is_simulated_success() {
    let fake = Arc::new(FakeEc2::new(&["us-east-1"]));
    fake.launch("us-east-1", "i-1");
    let handler = ec2_handler(fake.clone()).await;
    let resources = fetch(&handler).await;

    let outcome = handler.delete(&resources[0]).await.unwrap();

    assert!(matches!(outcome, DeleteOutcome::DryRun { .. }));
    assert_eq!(
        fake.terminate_calls(),
        vec![("us-east-1".to_string(), "i-1".to_string(), true)]
    );
    // Nothing was removed: the same violation is fetched again.
    assert_eq!(fetch(&handler).await.len(), 1);
}

#[tokio::test]
async fn test_ec2_dry_run_unauthorized_propagates() {
    let mut fake = FakeEc2::new(&["us-east-1"]);
    fake.dry_run_answer = DryRunAnswer::Unauthorized;
    let fake = Arc::new(fake);
    fake.launch("us-east-1", "i-1");
    let handler = ec2_handler(fake).await;
    let resources = fetch(&handler).await;

    let err = handler.delete(&resources[0]).await.unwrap_err();

    assert!(matches!(err, SweepError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_ec2_circuit_breaker_keeps_instance() {
    let fake = Arc::new(FakeEc2::new(&["us-east-1"]));
    fake.launch("us-east-1", "i-1");
    let mut handler = ec2_handler(fake.clone()).await;
    handler.set_dry_run(false);
    let resources = fetch(&handler).await;

    let outcome = handler.delete(&resources[0]).await.unwrap();

    assert!(matches!(outcome, DeleteOutcome::Skipped { .. }));
    assert!(fake.terminate_calls().is_empty());
    assert_eq!(fake.instance_ids(), vec!["i-1".to_string()]);
}

#[tokio::test]
async fn test_ec2_real_termination_when_enabled() {
    let fake = Arc::new(FakeEc2::new(&["eu-west-1", "us-east-1"]));
    fake.launch("us-east-1", "i-doomed");
    fake.launch("eu-west-1", "i-safe");
    let mut handler = ec2_handler(fake.clone())
        .await
        .with_terminate_enabled(true);
    handler.set_dry_run(false);
    let policy = RegionPolicy::default();

    let report = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].outcome.is_deleted());

    let again = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert!(again.violations.is_empty());
    assert_eq!(fake.instance_ids(), vec!["i-safe".to_string()]);
}

#[tokio::test]
async fn test_ec2_region_failure_aborts_handler() {
    let mut fake = FakeEc2::new(&["eu-west-1", "us-east-1", "us-west-2"]);
    fake.failing_region = Some("us-east-1".to_string());
    let fake = Arc::new(fake);
    fake.launch("us-west-2", "i-unreached");
    let handler = ec2_handler(fake.clone()).await;

    let report = sweep_handler(&handler, &RegionPolicy::default(), &mut NoopObserver).await;

    assert!(!report.is_success());
    assert!(report.error.as_deref().unwrap().contains("AuthFailure"));
    assert!(
        !fake
            .describe_calls
            .lock()
            .unwrap()
            .contains(&"us-west-2".to_string())
    );
}

// ---------------------------------------------------------------------------
// S3 fake

#[derive(Clone)]
enum LocationAnswer {
    Constraint(Option<String>),
    Status(u16),
    Transport,
}

struct FakeS3 {
    buckets: Mutex<Vec<Bucket>>,
    locations: Mutex<HashMap<String, LocationAnswer>>,
    deleted: Mutex<Vec<(String, String)>>,
}

impl FakeS3 {
    fn new() -> Self {
        Self {
            buckets: Mutex::new(Vec::new()),
            locations: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn create(&self, name: &str, answer: LocationAnswer) {
        let bucket = Bucket::builder()
            .name(name)
            .creation_date(aws_sdk_s3::primitives::DateTime::from_secs(LAUNCH_SECS))
            .build();
        self.buckets.lock().unwrap().push(bucket);
        self.locations
            .lock()
            .unwrap()
            .insert(name.to_string(), answer);
    }

    fn create_in(&self, name: &str, constraint: Option<&str>) {
        self.create(
            name,
            LocationAnswer::Constraint(constraint.map(str::to_string)),
        );
    }

    fn names(&self) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl S3Api for FakeS3 {
    async fn list_buckets(&self) -> monocyte_cloud_aws::Result<Vec<Bucket>> {
        Ok(self.buckets.lock().unwrap().clone())
    }

    async fn bucket_location(&self, bucket: &str) -> monocyte_cloud_aws::Result<Option<String>> {
        let answer = self.locations.lock().unwrap().get(bucket).cloned();
        match answer {
            Some(LocationAnswer::Constraint(c)) => Ok(c),
            Some(LocationAnswer::Status(status)) => {
                Err(classify_aws_error(Some(status), None, Some("location lookup failed")))
            }
            Some(LocationAnswer::Transport) => {
                Err(AwsError::Transport("dispatch failure".to_string()))
            }
            None => Err(classify_aws_error(Some(404), Some("NoSuchBucket"), None)),
        }
    }

    async fn delete_bucket(&self, region: &str, bucket: &str) -> monocyte_cloud_aws::Result<()> {
        self.deleted
            .lock()
            .unwrap()
            .push((region.to_string(), bucket.to_string()));
        self.buckets
            .lock()
            .unwrap()
            .retain(|b| b.name() != Some(bucket));
        Ok(())
    }
}

#[tokio::test]
async fn test_s3_location_mapping() {
    let fake = Arc::new(FakeS3::new());
    fake.create_in("standard", None);
    fake.create_in("legacy-eu", Some("EU"));
    fake.create_in("frankfurt", Some("eu-central-1"));
    let handler = S3Handler::new(fake);

    let regions: Vec<(String, String)> = fetch(&handler)
        .await
        .into_iter()
        .map(|r| (r.resource_id, r.region))
        .collect();

    assert_eq!(
        regions,
        vec![
            ("standard".to_string(), "us-east-1".to_string()),
            ("legacy-eu".to_string(), "eu-west-1".to_string()),
            ("frankfurt".to_string(), "eu-central-1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_s3_bad_request_skips_only_that_bucket() {
    let fake = Arc::new(FakeS3::new());
    fake.create("flaky", LocationAnswer::Status(400));
    fake.create_in("after", Some("us-west-2"));
    let handler = S3Handler::new(fake);

    let resources = fetch(&handler).await;

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].resource_id, "after");
}

#[tokio::test]
async fn test_s3_service_error_yields_sentinel_region() {
    let fake = Arc::new(FakeS3::new());
    fake.create("denied", LocationAnswer::Status(403));
    let handler = S3Handler::new(fake);

    let report = sweep_handler(&handler, &RegionPolicy::default(), &mut NoopObserver).await;

    assert!(report.is_success());
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].region, ERROR_REGION);
}

#[tokio::test]
async fn test_s3_transport_error_aborts_handler() {
    let fake = Arc::new(FakeS3::new());
    fake.create_in("first", Some("us-east-2"));
    fake.create("broken", LocationAnswer::Transport);
    fake.create_in("never", Some("us-west-1"));
    let handler = S3Handler::new(fake);

    let report = sweep_handler(&handler, &RegionPolicy::default(), &mut NoopObserver).await;

    assert!(!report.is_success());
    assert_eq!(report.inspected, 1);
    assert_eq!(report.violations[0].resource_id, "first");
}

#[tokio::test]
async fn test_s3_dry_run_then_real_delete() {
    let fake = Arc::new(FakeS3::new());
    fake.create_in("test-bucket", Some("us-west-2"));
    fake.create_in("home", Some("eu-west-1"));
    let policy = RegionPolicy::default();
    let mut handler = S3Handler::new(fake.clone()).with_delete_enabled(true);

    let dry = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert_eq!(dry.violations.len(), 1);
    assert!(matches!(
        dry.violations[0].outcome,
        DeleteOutcome::DryRun { .. }
    ));
    let still_there = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert_eq!(still_there.violations.len(), 1);
    assert!(fake.deleted.lock().unwrap().is_empty());

    handler.set_dry_run(false);
    let real = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert!(real.violations[0].outcome.is_deleted());
    assert_eq!(
        *fake.deleted.lock().unwrap(),
        vec![("us-west-2".to_string(), "test-bucket".to_string())]
    );

    let after = sweep_handler(&handler, &policy, &mut NoopObserver).await;
    assert!(after.violations.is_empty());
    assert_eq!(fake.names(), vec!["home".to_string()]);
}

#[tokio::test]
async fn test_s3_disabled_deletion_reports_every_sweep() {
    let fake = Arc::new(FakeS3::new());
    fake.create_in("sticky", Some("ap-northeast-1"));
    let mut handler = S3Handler::new(fake.clone());
    handler.set_dry_run(false);
    let policy = RegionPolicy::default();

    for _ in 0..2 {
        let report = sweep_handler(&handler, &policy, &mut NoopObserver).await;
        assert!(report.is_success());
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(
            report.violations[0].outcome,
            DeleteOutcome::Skipped { .. }
        ));
    }
    assert_eq!(fake.names(), vec!["sticky".to_string()]);
}

#[tokio::test]
async fn test_s3_describe() {
    let fake = Arc::new(FakeS3::new());
    fake.create_in("logs", Some("us-east-2"));
    let handler = S3Handler::new(fake);
    let resources = fetch(&handler).await;

    assert_eq!(
        handler.describe(&resources[0]),
        "s3 bucket found in us-east-2\n\tlogs, created 2023-11-14T22:13:20+00:00"
    );
}

// ---------------------------------------------------------------------------
// Full sweep

#[tokio::test]
async fn test_sweep_reports_only_disallowed_regions() {
    let ec2 = Arc::new(FakeEc2::new(&["eu-west-1", "us-east-1", "cn-north-1"]));
    ec2.launch("eu-west-1", "i-eu");
    ec2.launch("us-east-1", "i-us");
    let s3 = Arc::new(FakeS3::new());
    s3.create_in("eu-data", Some("eu-west-1"));

    let registry = HandlerRegistry::new()
        .with(Arc::new(Ec2HandlerFactory::new(ec2.clone())))
        .with(Arc::new(S3HandlerFactory::new(s3)));
    let report = Sweeper::new(registry, RegionPolicy::default())
        .run(&mut NoopObserver)
        .await;

    assert!(report.is_success());
    let violations: Vec<(&str, &str)> = report
        .violations()
        .map(|v| (v.resource_id.as_str(), v.region.as_str()))
        .collect();
    assert_eq!(violations, vec![("i-us", "us-east-1")]);
    assert!(
        !ec2.describe_calls
            .lock()
            .unwrap()
            .contains(&"cn-north-1".to_string())
    );
}

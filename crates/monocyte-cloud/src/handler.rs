//! Handler contract
//!
//! One `Handler` implementation exists per resource type. Handlers are built by a
//! `HandlerFactory` at the start of each sweep and dropped at its end.

use crate::error::Result;
use crate::policy::{RegionFilter, RegionPolicy};
use crate::report::{DeleteOutcome, HandlerReport};
use crate::resource::Resource;
use crate::sweep::{SweepObserver, sweep_handler};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Lazy, finite, non-restartable sequence of fetched resources
pub type ResourceStream<'a, T> = BoxStream<'a, Result<Resource<T>>>;

/// Per-resource-type fetch/describe/delete contract
///
/// Implementations must:
/// - only enumerate regions accepted by the filter they were built with
/// - skip (with a warning) items whose region cannot be classified, without ending
///   the stream
/// - never delete anything while `dry_run()` is true
#[async_trait]
pub trait Handler: Send + Sync {
    /// Provider-native object wrapped by each `Resource`
    type Item: Send + Sync;

    /// Constant service name (e.g. "ec2", "s3")
    fn service_name(&self) -> &'static str;

    fn dry_run(&self) -> bool;

    fn set_dry_run(&mut self, dry_run: bool);

    /// Enumerate every resource of this type in the handled regions.
    ///
    /// Nothing is queried until the stream is polled.
    fn fetch_all_resources(&self) -> ResourceStream<'_, Self::Item>;

    /// Human-readable description used in the violation report
    fn describe(&self, resource: &Resource<Self::Item>) -> String;

    /// Delete the resource, or simulate it in dry-run mode
    async fn delete(&self, resource: &Resource<Self::Item>) -> Result<DeleteOutcome>;
}

/// Type-erased handler, as stored and driven by the sweep driver
#[async_trait]
pub trait SweepTarget: Send + Sync {
    fn target_name(&self) -> &'static str;

    fn is_dry_run(&self) -> bool;

    /// Fetch, filter, report and delete violators for this handler.
    ///
    /// Never fails: a fatal error is recorded in the returned report.
    async fn sweep(
        &self,
        policy: &RegionPolicy,
        observer: &mut dyn SweepObserver,
    ) -> HandlerReport;
}

#[async_trait]
impl<H: Handler> SweepTarget for H {
    fn target_name(&self) -> &'static str {
        self.service_name()
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run()
    }

    async fn sweep(
        &self,
        policy: &RegionPolicy,
        observer: &mut dyn SweepObserver,
    ) -> HandlerReport {
        sweep_handler(self, policy, observer).await
    }
}

/// Builds a fresh handler for each sweep
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    /// Service name of the handlers this factory builds
    fn service_name(&self) -> &'static str;

    /// Whether real deletion is switched on for this resource type
    fn deletion_enabled(&self) -> bool {
        true
    }

    /// Build the handler.
    ///
    /// May resolve the list of candidate regions; must not enumerate resources.
    async fn build(
        &self,
        region_filter: RegionFilter,
        dry_run: bool,
    ) -> Result<Box<dyn SweepTarget>>;
}

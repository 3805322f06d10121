//! Sweep driver
//!
//! Handlers are processed one after another. A fatal error inside one handler is
//! recorded in its report and the sweep moves on to the next handler; item-level
//! classification errors never reach this level (handlers skip those themselves).

use crate::error::Result;
use crate::handler::Handler;
use crate::policy::RegionPolicy;
use crate::registry::HandlerRegistry;
use crate::report::{DeleteOutcome, HandlerReport, SweepReport, Violation};
use futures_util::TryStreamExt;
use std::collections::HashSet;
use std::time::Instant;

/// Receives sweep progress as it happens.
///
/// `on_violation` is always called before the delete attempt for that resource.
pub trait SweepObserver: Send {
    fn on_handler_start(&mut self, _service: &str) {}

    fn on_violation(&mut self, _service: &str, _description: &str, _region: &str) {}

    fn on_delete(&mut self, _service: &str, _resource_id: &str, _outcome: &DeleteOutcome) {}

    fn on_handler_finished(&mut self, _report: &HandlerReport) {}

    fn on_handler_failed(&mut self, _service: &str, _error: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {}

/// Sweep a single handler against the policy.
pub async fn sweep_handler<H: Handler>(
    handler: &H,
    policy: &RegionPolicy,
    observer: &mut dyn SweepObserver,
) -> HandlerReport {
    let start = Instant::now();
    let mut report = HandlerReport::new(handler.service_name());

    if let Err(e) = sweep_into(handler, policy, observer, &mut report).await {
        tracing::error!(
            service = handler.service_name(),
            error = %e,
            "Sweep aborted"
        );
        observer.on_handler_failed(handler.service_name(), &e.to_string());
        report.error = Some(e.to_string());
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}

async fn sweep_into<H: Handler>(
    handler: &H,
    policy: &RegionPolicy,
    observer: &mut dyn SweepObserver,
    report: &mut HandlerReport,
) -> Result<()> {
    let service = handler.service_name();
    let mut seen = HashSet::new();
    let mut resources = handler.fetch_all_resources();

    while let Some(resource) = resources.try_next().await? {
        report.inspected += 1;

        if policy.is_region_allowed(&resource.region) {
            continue;
        }
        if !seen.insert(resource.key()) {
            tracing::debug!(service, resource = %resource.resource_id, "Duplicate resource skipped");
            continue;
        }

        let description = handler.describe(&resource);
        tracing::warn!(
            service,
            resource = %resource.resource_id,
            region = %resource.region,
            "Region not allowed"
        );
        observer.on_violation(service, &description, &resource.region);

        let (outcome, fatal) = match handler.delete(&resource).await {
            Ok(outcome) => (outcome, None),
            Err(e) => (DeleteOutcome::failed(e.to_string()), Some(e)),
        };
        observer.on_delete(service, &resource.resource_id, &outcome);

        report.violations.push(Violation {
            service: service.to_string(),
            resource_type: resource.resource_type.clone(),
            resource_id: resource.resource_id.clone(),
            region: resource.region.clone(),
            description,
            outcome,
        });

        // A failed delete still aborts the handler, after being recorded.
        if let Some(e) = fatal {
            return Err(e);
        }
    }

    Ok(())
}

/// Runs one sweep over every registered handler
pub struct Sweeper {
    registry: HandlerRegistry,
    policy: RegionPolicy,
    dry_run: bool,
    services: Option<Vec<String>>,
}

impl Sweeper {
    /// New sweeper; dry run is on until `with_dry_run(false)`
    pub fn new(registry: HandlerRegistry, policy: RegionPolicy) -> Self {
        Self {
            registry,
            policy,
            dry_run: true,
            services: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Restrict the sweep to the given service names
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let services: Vec<String> = services.into_iter().map(Into::into).collect();
        self.services = if services.is_empty() {
            None
        } else {
            Some(services)
        };
        self
    }

    pub fn policy(&self) -> &RegionPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sweep every selected handler in registration order
    pub async fn run(&self, observer: &mut dyn SweepObserver) -> SweepReport {
        let mut report = SweepReport::new(self.dry_run);

        for factory in self.registry.iter() {
            let service = factory.service_name();
            if let Some(ref only) = self.services {
                if !only.iter().any(|s| s == service) {
                    continue;
                }
            }

            observer.on_handler_start(service);
            tracing::info!(service, dry_run = self.dry_run, "Checking resources");

            let handler = match factory
                .build(self.policy.region_filter(), self.dry_run)
                .await
            {
                Ok(handler) => handler,
                Err(e) => {
                    tracing::error!(service, error = %e, "Failed to build handler");
                    observer.on_handler_failed(service, &e.to_string());
                    report
                        .handlers
                        .push(HandlerReport::failed(service, e.to_string()));
                    continue;
                }
            };

            let handler_report = handler.sweep(&self.policy, observer).await;
            observer.on_handler_finished(&handler_report);
            report.handlers.push(handler_report);
        }

        report
    }
}

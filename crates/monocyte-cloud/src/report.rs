//! Sweep results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a delete call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The resource was really removed
    Deleted,
    /// Dry run: the provider confirmed the delete would be attempted
    DryRun { message: String },
    /// Deletion is switched off for this resource type
    Skipped { reason: String },
    /// The delete call returned an error; the handler was aborted
    Failed { error: String },
}

impl DeleteOutcome {
    pub fn dry_run(message: impl Into<String>) -> Self {
        Self::DryRun {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteOutcome::Deleted => write!(f, "deleted"),
            DeleteOutcome::DryRun { message } => write!(f, "dry run: {}", message),
            DeleteOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            DeleteOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// A resource found outside the allowed regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub service: String,
    pub resource_type: String,
    pub resource_id: String,
    pub region: String,
    /// Human-readable description from the handler
    pub description: String,
    pub outcome: DeleteOutcome,
}

/// Result of sweeping one handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerReport {
    pub service: String,

    /// Resources yielded by the handler, allowed or not
    pub inspected: usize,

    pub violations: Vec<Violation>,

    /// Fatal error that aborted this handler
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl HandlerReport {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            inspected: 0,
            violations: Vec::new(),
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failed(service: impl Into<String>, error: impl Into<String>) -> Self {
        let mut report = Self::new(service);
        report.error = Some(error.into());
        report
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one full sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub handlers: Vec<HandlerReport>,
}

impl SweepReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            dry_run,
            handlers: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.handlers.iter().all(HandlerReport::is_success)
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.handlers.iter().flat_map(|h| h.violations.iter())
    }

    pub fn handler(&self, service: &str) -> Option<&HandlerReport> {
        self.handlers.iter().find(|h| h.service == service)
    }

    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary {
            inspected: 0,
            violations: 0,
            deleted: 0,
            simulated: 0,
            skipped: 0,
            failed_deletes: 0,
            failed_handlers: 0,
        };
        for handler in &self.handlers {
            summary.inspected += handler.inspected;
            if !handler.is_success() {
                summary.failed_handlers += 1;
            }
            for violation in &handler.violations {
                summary.violations += 1;
                match violation.outcome {
                    DeleteOutcome::Deleted => summary.deleted += 1,
                    DeleteOutcome::DryRun { .. } => summary.simulated += 1,
                    DeleteOutcome::Skipped { .. } => summary.skipped += 1,
                    DeleteOutcome::Failed { .. } => summary.failed_deletes += 1,
                }
            }
        }
        summary
    }
}

/// Counters over a sweep report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub inspected: usize,
    pub violations: usize,
    pub deleted: usize,
    pub simulated: usize,
    pub skipped: usize,
    pub failed_deletes: usize,
    pub failed_handlers: usize,
}

impl std::fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} inspected, {} violations ({} deleted, {} simulated, {} skipped, {} failed), {} failed handlers",
            self.inspected,
            self.violations,
            self.deleted,
            self.simulated,
            self.skipped,
            self.failed_deletes,
            self.failed_handlers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(id: &str, outcome: DeleteOutcome) -> Violation {
        Violation {
            service: "ec2".to_string(),
            resource_type: "ec2.Instance".to_string(),
            resource_id: id.to_string(),
            region: "us-east-1".to_string(),
            description: format!("instance {id}"),
            outcome,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut report = SweepReport::new(true);
        let mut ec2 = HandlerReport::new("ec2");
        ec2.inspected = 3;
        ec2.violations.push(violation("i-1", DeleteOutcome::Deleted));
        ec2.violations
            .push(violation("i-2", DeleteOutcome::dry_run("would terminate")));
        report.handlers.push(ec2);

        let mut s3 = HandlerReport::failed("s3", "access denied");
        s3.violations
            .push(violation("logs", DeleteOutcome::skipped("deletion disabled")));
        s3.violations
            .push(violation("data", DeleteOutcome::failed("BucketNotEmpty")));
        report.handlers.push(s3);

        let summary = report.summary();
        assert_eq!(summary.inspected, 3);
        assert_eq!(summary.violations, 4);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.simulated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed_deletes, 1);
        assert_eq!(summary.failed_handlers, 1);
        assert!(!report.is_success());
        assert_eq!(
            summary.to_string(),
            "3 inspected, 4 violations (1 deleted, 1 simulated, 1 skipped, 1 failed), 1 failed handlers"
        );
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(DeleteOutcome::dry_run("ok")).unwrap();
        assert_eq!(json["outcome"], "dry_run");
        assert_eq!(json["message"], "ok");

        let json = serde_json::to_value(DeleteOutcome::Deleted).unwrap();
        assert_eq!(json["outcome"], "deleted");
    }

    #[test]
    fn test_handler_lookup() {
        let mut report = SweepReport::new(false);
        report.handlers.push(HandlerReport::new("s3"));
        assert!(report.handler("s3").is_some());
        assert!(report.handler("ec2").is_none());
        assert!(report.is_success());
    }
}

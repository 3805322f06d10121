//! Monocyte sweep engine
//!
//! This crate holds the provider-independent part of Monocyte: the handler
//! contract every resource type implements, the region policy, the handler
//! registry, and the sweep driver that finds and removes resources living outside
//! the allowed regions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 monocyte CLI                     │
//! │            (composition root, report)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                monocyte-cloud                    │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │ RegionPolicy │  │ Sweeper / HandlerRegistry │ │
//! │  └──────────────┘  └──────────────────────────┘ │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait Handler { fetch, describe, delete } │  │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  ec2 handler  │ │  s3 handler   │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use monocyte_cloud::{HandlerRegistry, NoopObserver, RegionPolicy, Sweeper};
//!
//! let registry = HandlerRegistry::new().with(ec2_factory).with(s3_factory);
//! let sweeper = Sweeper::new(registry, RegionPolicy::default());
//!
//! // Dry run by default
//! let report = sweeper.run(&mut NoopObserver).await;
//! println!("{}", report.summary());
//! ```

pub mod error;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod report;
pub mod resource;
pub mod sweep;

// Re-exports
pub use error::{Result, SweepError};
pub use handler::{Handler, HandlerFactory, ResourceStream, SweepTarget};
pub use policy::{RegionFilter, RegionPolicy};
pub use registry::HandlerRegistry;
pub use report::{DeleteOutcome, HandlerReport, SweepReport, SweepSummary, Violation};
pub use resource::{DEFAULT_REGION, ERROR_REGION, Resource, resolve_region};
pub use sweep::{NoopObserver, SweepObserver, Sweeper, sweep_handler};

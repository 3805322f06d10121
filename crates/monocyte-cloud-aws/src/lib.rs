//! AWS handlers for Monocyte
//!
//! This crate implements the `Handler` contract for AWS resource types:
//!
//! - **ec2**: instances in every enabled region, terminated through the EC2
//!   dry-run check
//! - **s3**: buckets, located one by one with `GetBucketLocation`
//!
//! # Requirements
//!
//! - AWS credentials available to the default provider chain (environment,
//!   `~/.aws/config`, instance role)
//! - `ec2:DescribeRegions`, `ec2:DescribeInstances`, `ec2:TerminateInstances`,
//!   `s3:ListAllMyBuckets`, `s3:GetBucketLocation` and, for real bucket
//!   deletion, `s3:ListBucket`, `s3:DeleteObject`, `s3:DeleteBucket`
//!
//! # Example
//!
//! ```ignore
//! use monocyte_cloud::{HandlerRegistry, RegionPolicy, Sweeper, NoopObserver};
//! use monocyte_cloud_aws::{AwsContext, Ec2HandlerFactory, S3HandlerFactory};
//! use std::sync::Arc;
//!
//! let ctx = AwsContext::new("eu-west-1").await;
//! let registry = HandlerRegistry::new()
//!     .with(Arc::new(Ec2HandlerFactory::from_context(&ctx)))
//!     .with(Arc::new(S3HandlerFactory::from_context(&ctx)));
//!
//! let report = Sweeper::new(registry, RegionPolicy::default())
//!     .run(&mut NoopObserver)
//!     .await;
//! ```

pub mod api;
pub mod context;
pub mod ec2;
pub mod error;
pub mod s3;

pub use api::{Ec2Api, S3Api, SdkEc2, SdkS3};
pub use context::AwsContext;
pub use ec2::{Ec2Handler, Ec2HandlerFactory};
pub use error::{AwsError, Result, classify_aws_error, classify_sdk_error};
pub use s3::{S3Handler, S3HandlerFactory, map_location};

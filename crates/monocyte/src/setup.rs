//! Composition root: configuration, region policy and handler registry

use crate::PolicyArgs;
use anyhow::Context;
use monocyte_cloud::{DEFAULT_REGION, HandlerRegistry, RegionPolicy};
use monocyte_cloud_aws::{AwsContext, Ec2HandlerFactory, S3HandlerFactory};
use monocyte_config::{LoadedConfig, MonocyteConfig};
use std::sync::Arc;

pub fn load_config(args: &PolicyArgs) -> anyhow::Result<LoadedConfig> {
    let loaded = MonocyteConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    match &loaded.source {
        Some(path) => tracing::debug!(path = %path.display(), "Using configuration file"),
        None => tracing::debug!("Using built-in configuration"),
    }
    Ok(loaded)
}

/// Policy from the configuration, with command-line lists replacing file lists
pub fn region_policy(config: &MonocyteConfig, args: &PolicyArgs) -> RegionPolicy {
    let allowed = if args.allow_prefixes.is_empty() {
        &config.allowed_region_prefixes
    } else {
        &args.allow_prefixes
    };
    let ignored = if args.ignore_regions.is_empty() {
        &config.ignored_regions
    } else {
        &args.ignore_regions
    };
    RegionPolicy::new(allowed, ignored)
}

/// Region for account-global calls: flag, then file, then us-east-1
pub fn bootstrap_region(config: &MonocyteConfig, flag: Option<&str>) -> String {
    flag.or(config.region.as_deref())
        .unwrap_or(DEFAULT_REGION)
        .to_string()
}

/// Register every handler enabled in the configuration
pub fn build_registry(config: &MonocyteConfig, ctx: &AwsContext) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    if config.handlers.ec2.enabled {
        registry.register(Arc::new(
            Ec2HandlerFactory::from_context(ctx)
                .with_terminate_enabled(config.handlers.ec2.allow_terminate),
        ));
    }
    if config.handlers.s3.enabled {
        registry.register(Arc::new(
            S3HandlerFactory::from_context(ctx)
                .with_delete_enabled(config.handlers.s3.allow_delete),
        ));
    }

    registry
}

/// Fail on service names nothing is registered under
pub fn check_services(registry: &HandlerRegistry, services: &[String]) -> anyhow::Result<()> {
    let unknown: Vec<&str> = services
        .iter()
        .map(String::as_str)
        .filter(|s| !registry.contains(s))
        .collect();

    if !unknown.is_empty() {
        anyhow::bail!(
            "Unknown service(s): {}. Available: {}",
            unknown.join(", "),
            registry.service_names().join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_uses_config_lists() {
        let config = MonocyteConfig {
            allowed_region_prefixes: vec!["us-west".to_string()],
            ignored_regions: vec![],
            ..MonocyteConfig::default()
        };
        let policy = region_policy(&config, &PolicyArgs::default());

        assert!(policy.is_region_allowed("us-west-2"));
        assert!(!policy.is_region_allowed("eu-west-1"));
        assert!(policy.is_region_handled("cn-north-1"));
    }

    #[test]
    fn test_policy_flags_replace_config_lists() {
        let args = PolicyArgs {
            allow_prefixes: vec!["ap".to_string()],
            ignore_regions: vec!["eu-south-2".to_string()],
            ..PolicyArgs::default()
        };
        let policy = region_policy(&MonocyteConfig::default(), &args);

        assert!(policy.is_region_allowed("ap-south-1"));
        assert!(!policy.is_region_allowed("eu-west-1"));
        assert!(policy.is_region_ignored("eu-south-2"));
        assert!(!policy.is_region_ignored("cn-north-1"));
    }

    #[test]
    fn test_unknown_service_message_is_plain() {
        let registry = HandlerRegistry::new();
        let err = check_services(&registry, &["rds".to_string()]).unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("Unknown service(s): rds."));
        assert!(!message.contains('\x1b'));
        assert!(check_services(&registry, &[]).is_ok());
    }

    #[test]
    fn test_bootstrap_region_precedence() {
        let mut config = MonocyteConfig::default();
        assert_eq!(bootstrap_region(&config, None), "us-east-1");

        config.region = Some("eu-central-1".to_string());
        assert_eq!(bootstrap_region(&config, None), "eu-central-1");
        assert_eq!(bootstrap_region(&config, Some("eu-west-1")), "eu-west-1");
    }
}

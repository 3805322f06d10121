use crate::PolicyArgs;
use crate::setup;
use colored::Colorize;
use monocyte_cloud_aws::AwsContext;

/// List the registered handlers and their deletion switch. Makes no AWS calls.
pub async fn handle(args: &PolicyArgs) -> anyhow::Result<()> {
    let loaded = setup::load_config(args)?;
    let config = loaded.config;
    let ctx = AwsContext::new(&setup::bootstrap_region(&config, None)).await;
    let registry = setup::build_registry(&config, &ctx);

    if registry.is_empty() {
        println!("{}", "No handlers enabled".yellow());
        return Ok(());
    }

    println!("{}", "Registered handlers:".bold());
    for factory in registry.iter() {
        let deletion = if factory.deletion_enabled() {
            "deletion enabled".red()
        } else {
            "deletion disabled".green()
        };
        let name = format!("{:<6}", factory.service_name());
        println!("  {} {}", name.cyan(), deletion);
    }

    Ok(())
}

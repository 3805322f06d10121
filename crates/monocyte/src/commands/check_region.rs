use crate::PolicyArgs;
use crate::setup;
use colored::Colorize;

pub fn handle(args: &PolicyArgs, regions: &[String]) -> anyhow::Result<()> {
    let loaded = setup::load_config(args)?;
    let policy = setup::region_policy(&loaded.config, args);

    println!("policy: {}", policy.to_string().cyan());
    for region in regions {
        let verdict = if policy.is_region_allowed(region) {
            "allowed".green()
        } else if policy.is_region_ignored(region) {
            "ignored".dimmed()
        } else {
            "not allowed".red()
        };
        let handled = if policy.is_region_handled(region) {
            "handled"
        } else {
            "skipped"
        };
        println!("  {:<16} {} ({})", region, verdict, handled);
    }

    Ok(())
}

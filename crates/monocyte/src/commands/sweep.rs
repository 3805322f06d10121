use crate::PolicyArgs;
use crate::observer::ConsoleObserver;
use crate::setup;
use colored::Colorize;
use monocyte_cloud::{NoopObserver, SweepReport, Sweeper};
use monocyte_cloud_aws::AwsContext;

pub struct SweepOptions {
    pub policy: PolicyArgs,
    pub execute: bool,
    pub services: Vec<String>,
    pub region: Option<String>,
    pub json: bool,
}

/// Run one sweep. Returns false when any handler failed.
pub async fn handle(opts: SweepOptions) -> anyhow::Result<bool> {
    let loaded = setup::load_config(&opts.policy)?;
    let config = loaded.config;
    let policy = setup::region_policy(&config, &opts.policy);
    let dry_run = config.dry_run && !opts.execute;
    let region = setup::bootstrap_region(&config, opts.region.as_deref());

    let ctx = AwsContext::new(&region).await;
    let registry = setup::build_registry(&config, &ctx);
    setup::check_services(&registry, &opts.services)?;

    tracing::info!(%policy, dry_run, region = %region, "Starting sweep");

    let sweeper = Sweeper::new(registry, policy)
        .with_dry_run(dry_run)
        .with_services(opts.services);

    let report = if opts.json {
        let report = sweeper.run(&mut NoopObserver).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report
    } else {
        print_header(&sweeper);
        let report = sweeper.run(&mut ConsoleObserver).await;
        print_summary(&report);
        report
    };

    Ok(report.is_success())
}

fn print_header(sweeper: &Sweeper) {
    println!(
        "{}",
        "Monocyte - Search and Destroy unwanted AWS Resources relentlessly."
            .bold()
    );
    println!("  policy: {}", sweeper.policy().to_string().cyan());
    if sweeper.is_dry_run() {
        println!("  mode:   {}", "dry run (pass --execute to delete)".blue());
    } else {
        println!("  mode:   {}", "EXECUTE".red().bold());
    }
}

fn print_summary(report: &SweepReport) {
    let summary = report.summary();
    println!();
    if report.is_success() {
        println!("{} {}", "✓".green().bold(), summary);
    } else {
        println!("{} {}", "✗".red().bold(), summary);
        for handler in report.handlers.iter().filter(|h| !h.is_success()) {
            if let Some(error) = &handler.error {
                println!("  {} {}", handler.service.red(), error);
            }
        }
    }
}

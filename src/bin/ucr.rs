use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Import from organized modules
use ucr::Result;
use ucr::config::{Config, ConfigOverrides, OutputFormat};
use ucr::error::UcrError;
use ucr::loader::{
    load_group_multipliers, load_pricing_table, load_usage_events, read_usage_events_stdin,
};
use ucr::pricing::CostCalculator;
use ucr::report::{UserContext, build_reports};

#[derive(Parser)]
#[command(
    name = "ucr",
    version,
    about = "Reconstruct and verify the billed cost of LLM gateway usage events"
)]
struct Cli {
    /// Pricing rows exported from the gateway (JSON)
    #[arg(short, long)]
    pricing: Option<PathBuf>,

    /// Usage events (JSON); read from stdin when omitted
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Channel groups with price multipliers (JSON)
    #[arg(short, long)]
    groups: Option<PathBuf>,

    /// User group applied to events that carry none (repeatable)
    #[arg(long = "user-group")]
    user_groups: Vec<String>,

    /// Subscription group of the user
    #[arg(long)]
    subscription_group: Option<String>,

    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            pricing_path: cli.pricing,
            events_path: cli.events,
            groups_path: cli.groups,
            user_groups: cli.user_groups,
            subscription_group: cli.subscription_group,
            output: cli.output,
            no_color: cli.no_color,
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| UcrError::LoggingInit {
            message: e.to_string(),
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    // Configure rayon thread pool for parallel reconciliation
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .thread_name(|i| format!("ucr-worker-{}", i))
        .build_global()
        .map_err(UcrError::ThreadPoolInit)?;

    let config = Config::load(Cli::parse().into())?;
    colored::control::set_override(config.color);

    let Some(pricing_path) = config.pricing_path.as_deref() else {
        return Err(UcrError::MissingInput {
            what: "pricing file (--pricing or UCR_PRICING)".to_string(),
        });
    };

    // Load pricing, events and groups concurrently
    let (pricing, events, groups) = tokio::join!(
        load_pricing_table(pricing_path),
        async {
            match config.events_path.as_deref() {
                Some(path) => load_usage_events(path).await,
                None => read_usage_events_stdin().await,
            }
        },
        load_group_multipliers(config.groups_path.as_deref())
    );
    let (pricing, events, groups) = (pricing?, events?, groups?);

    if pricing.is_empty() {
        tracing::warn!(path = %pricing_path.display(), "Pricing table is empty; every event is unpriced");
    }

    let user = UserContext {
        user_groups: config.user_groups.clone(),
        subscription_group: config.subscription_group.clone(),
    };
    let calculator = CostCalculator::new(pricing);
    let reports = build_reports(&calculator, &events, &groups, &user);

    let unpriced = reports
        .iter()
        .filter(|r| !r.reconciliation.is_available())
        .count();
    let mismatched = reports.iter().filter(|r| r.has_unexplained_diff()).count();
    for report in reports.iter().filter(|r| r.has_unexplained_diff()) {
        tracing::warn!(
            event_id = report.event_id,
            request_id = %report.request_id,
            "Recorded cost differs from the reconstruction"
        );
    }

    match config.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .map_err(|source| UcrError::ReportSerialize { source })?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for report in &reports {
                for line in report.to_text_lines() {
                    println!("{line}");
                }
                println!();
            }
            println!(
                "{} events, {} unpriced, {} with unexplained difference",
                reports.len(),
                if unpriced > 0 {
                    unpriced.to_string().yellow()
                } else {
                    unpriced.to_string().green()
                },
                if mismatched > 0 {
                    mismatched.to_string().red()
                } else {
                    mismatched.to_string().green()
                },
            );
        }
    }

    Ok(())
}

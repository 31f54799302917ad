use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dragnet::cli::{Cli, Commands, Display, OutputFormat, ReportAction};
use dragnet::config::DragnetConfig;
use dragnet::correlate::{EntityCategory, normalize, validators};
use dragnet::error::{Result, ScanError};
use dragnet::notification::Notifier;
use dragnet::probe::{Phase, ScanPlan};
use dragnet::report::ReportStore;
use dragnet::scan::{ScanOptions, ScanOrchestrator};
use dragnet::service::{InvestigationRequest, InvestigationService, InvestigationStatus};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dragnet=debug")
    } else {
        EnvFilter::new("dragnet=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("dragnet.toml"));
    let config = DragnetConfig::load(&config_path).await?;

    match cli.command {
        Commands::Scan {
            target,
            plan,
            deadline_secs,
            max_concurrent,
            save,
        } => {
            cmd_scan(
                &display,
                cli.output,
                &config,
                &target,
                &plan,
                deadline_secs,
                max_concurrent,
                save,
            )
            .await
        }
        Commands::Check { value, category } => {
            cmd_check(&display, cli.output, &value, category.into())
        }
        Commands::Report { action } => match action {
            ReportAction::List => cmd_report_list(&display, cli.output, &config).await,
            ReportAction::Show { path } => {
                cmd_report_show(&display, cli.output, &config, &path).await
            }
        },
        Commands::Investigate {
            targets,
            plan,
            scan_type,
            depth,
        } => cmd_investigate(&display, cli.output, &config, targets, &plan, scan_type, depth).await,
    }
}

async fn load_phases(plan_path: &Path) -> Result<Vec<Phase>> {
    let plan = ScanPlan::load(plan_path).await?;
    Ok(plan.build())
}

fn notifier_from(config: &DragnetConfig) -> Notifier {
    let logs_dir = config.report.output_dir.join("events");
    Notifier::new(config.notification.clone(), Some(logs_dir))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_scan(
    display: &Display,
    output: OutputFormat,
    config: &DragnetConfig,
    target: &str,
    plan_path: &Path,
    deadline_secs: Option<u64>,
    max_concurrent: Option<usize>,
    save: bool,
) -> Result<()> {
    let phases = load_phases(plan_path).await?;

    let mut options = ScanOptions::from_config(config);
    if let Some(secs) = deadline_secs {
        options.probe_deadline = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(max) = max_concurrent {
        options.max_concurrent_probes = max;
    }

    let orchestrator = ScanOrchestrator::new(options).with_notifier(notifier_from(config));
    let report = orchestrator.run(target, phases).await?;

    if save {
        let store = ReportStore::from_config(&config.report);
        store.init().await?;
        let path = store.save(&report).await?;
        if output == OutputFormat::Text {
            display.print_success(&format!("Report saved to {}", path.display()));
        }
    }

    match output {
        OutputFormat::Text => display.print_report_detail(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn cmd_check(
    display: &Display,
    output: OutputFormat,
    value: &str,
    category: EntityCategory,
) -> Result<()> {
    let normalized = normalize(category, value);
    let valid = validators::is_valid(category, &normalized);

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "category": category,
                    "value": value,
                    "normalized": normalized,
                    "valid": valid,
                })
            );
        }
        OutputFormat::Text => {
            if valid {
                display.print_success(&format!("{} is a well-formed {}", normalized, category));
            } else {
                display.print_warning(&format!("{} failed {} validation", value, category));
            }
        }
    }

    Ok(())
}

async fn cmd_report_list(
    display: &Display,
    output: OutputFormat,
    config: &DragnetConfig,
) -> Result<()> {
    let store = ReportStore::from_config(&config.report);
    let paths = store.list().await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&paths)?),
        OutputFormat::Text => {
            display.print_header("Stored Reports");
            if paths.is_empty() {
                display.print_info("No reports found.");
            }
            for path in &paths {
                println!("  {}", path.display());
            }
        }
    }

    Ok(())
}

async fn cmd_report_show(
    display: &Display,
    output: OutputFormat,
    config: &DragnetConfig,
    path: &Path,
) -> Result<()> {
    let store = ReportStore::from_config(&config.report);
    let report = store.load(path).await?;

    match output {
        OutputFormat::Text => display.print_report_detail(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

async fn cmd_investigate(
    display: &Display,
    output: OutputFormat,
    config: &DragnetConfig,
    targets: Vec<String>,
    plan_path: &Path,
    scan_type: String,
    depth: String,
) -> Result<()> {
    let phases = load_phases(plan_path).await?;

    let store = ReportStore::from_config(&config.report);
    store.init().await?;

    let service = InvestigationService::new(phases, ScanOptions::from_config(config))
        .with_notifier(notifier_from(config))
        .with_store(store);

    let request = InvestigationRequest::new(targets)
        .with_scan_type(scan_type)
        .with_depth(depth);
    let id = service.submit(request)?;

    let spinner = (output == OutputFormat::Text)
        .then(|| display.create_spinner("Investigation running..."));

    let investigation = loop {
        let investigation = service.status(&id)?;
        if investigation.status.is_terminal() {
            break investigation;
        }
        if let Some(spinner) = &spinner {
            spinner.set_message(format!(
                "Investigation running... {}/{} targets",
                investigation.targets_done,
                investigation.request.targets.len()
            ));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match output {
        OutputFormat::Json => {
            let reports = service.report(&id).unwrap_or_default();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "investigation": investigation,
                    "reports": reports,
                }))?
            );
        }
        OutputFormat::Text => {
            display.print_header("Investigation");
            display.print_investigation_status(&investigation);
            if investigation.status == InvestigationStatus::Completed {
                for report in service.report(&id)? {
                    display.print_report_summary(&report);
                }
                display.print_success("Investigation completed");
            }
        }
    }

    if investigation.status == InvestigationStatus::Failed {
        let message = investigation
            .error
            .unwrap_or_else(|| "scan failed".to_string());
        return Err(ScanError::Investigation(message));
    }

    Ok(())
}

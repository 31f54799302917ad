use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::fusion::{AggregatedReport, PhaseReport};
use crate::service::{Investigation, InvestigationStatus};
use crate::utils::truncate_chars;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_report_summary(&self, report: &AggregatedReport) {
        let summary = &report.summary;
        let available = summary.phases_attempted - summary.phases_unavailable;
        let entities: usize = summary.unique_entities.values().map(Vec::len).sum();

        println!("{}", style(&report.target).bold());
        println!(
            "    Phases: {}/{} available  Entities: {}  Findings flagged: {}",
            self.phase_count_style(summary.phases_unavailable)
                .apply_to(available),
            summary.phases_attempted,
            style(entities).bold(),
            summary.critical_findings
        );
        println!(
            "    Probes: {} {:.0}% ({}/{})",
            self.progress_bar_inline(summary.success_rate),
            summary.success_rate,
            summary.completed_tasks,
            summary.total_tasks
        );
        println!();
    }

    pub fn print_report_detail(&self, report: &AggregatedReport) {
        self.print_header(&format!("Scan Report: {}", report.target));

        for (name, phase) in &report.per_phase {
            match phase {
                PhaseReport::Available { categories } => {
                    println!(
                        "{} {}",
                        style(name).bold(),
                        style("AVAILABLE").green()
                    );
                    for result in categories.values() {
                        println!(
                            "  {:<14} {} unique  confidence {:.2}",
                            result.category.to_string(),
                            style(result.entity_count()).bold(),
                            result.confidence
                        );
                        for entity in &result.unique_entities {
                            println!("    {}", style(&entity.value).dim());
                        }
                    }
                }
                PhaseReport::Unavailable { reason } => {
                    println!("{} {}", style(name).bold(), style("UNAVAILABLE").red());
                    println!("  {}", style(truncate_chars(reason, 70)).dim());
                }
            }
            println!();
        }

        let summary = &report.summary;
        println!("{}", style("Summary:").bold());
        for (category, values) in &summary.unique_entities {
            println!("  {:<14} {}", category, values.join(", "));
        }
        println!(
            "  Findings flagged: {}  Probe failures: {}",
            summary.critical_findings, summary.probe_failures
        );
        println!(
            "  Probes: {} {:.0}% ({}/{})",
            self.progress_bar(summary.success_rate, 30),
            summary.success_rate,
            summary.completed_tasks,
            summary.total_tasks
        );
        println!();

        println!(
            "{}",
            style(format!(
                "Started:   {}",
                report.started_at.format("%Y-%m-%d %H:%M:%S")
            ))
            .dim()
        );
        println!(
            "{}",
            style(format!(
                "Completed: {}",
                report.completed_at.format("%Y-%m-%d %H:%M:%S")
            ))
            .dim()
        );
    }

    pub fn print_investigation_status(&self, investigation: &Investigation) {
        let status_style = self.status_style(investigation.status);

        println!(
            "{}  {}",
            style(&investigation.id).bold(),
            style(investigation.request.targets.join(", ")).white()
        );
        println!(
            "    Status: {}  Progress: {} {:.0}%",
            status_style.apply_to(investigation.status.to_string()),
            self.progress_bar_inline(investigation.progress()),
            investigation.progress()
        );
        println!(
            "    Type: {}  Depth: {}",
            style(&investigation.request.scan_type).dim(),
            style(&investigation.request.depth).dim()
        );

        if let Some(error) = &investigation.error {
            println!("    {}", style(error).red());
        }

        println!();
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    fn status_style(&self, status: InvestigationStatus) -> Style {
        match status {
            InvestigationStatus::Pending => Style::new().dim(),
            InvestigationStatus::Running => Style::new().yellow().bold(),
            InvestigationStatus::Completed => Style::new().green(),
            InvestigationStatus::Failed => Style::new().red().bold(),
        }
    }

    fn phase_count_style(&self, unavailable: usize) -> Style {
        if unavailable == 0 {
            Style::new().green()
        } else {
            Style::new().yellow().bold()
        }
    }

    fn progress_bar(&self, percentage: f64, width: usize) -> String {
        let filled = (width as f64 * percentage / 100.0) as usize;
        let filled = filled.min(width);
        let empty = width - filled;

        format!(
            "{}{}",
            style("█".repeat(filled)).green(),
            style("░".repeat(empty)).dim()
        )
    }

    fn progress_bar_inline(&self, percentage: f64) -> String {
        self.progress_bar(percentage, 20)
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

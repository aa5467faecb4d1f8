use crate::infra::{load_catalog, read_audit, write_report};
use chrono::{Local, NaiveDate};
use clap::Args;
use site_inspection::error::AppError;
use site_inspection::inspection::{
    save_audit, AuditState, ExportCoordinator, InspectionCatalog, ProvidedSnapshot, PumpGridRenderer,
    PumpStatus, QuestionKind, SaveReceipt, SnapshotRenderer,
};
use site_inspection::report::{render_pump_grid, to_data_url, RenderedReport};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Audit JSON file as returned by `GET /api/v1/audit`
    #[arg(long)]
    pub(crate) audit: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Audit JSON file to render
    #[arg(long)]
    pub(crate) audit: PathBuf,
    /// Directory receiving the PDF
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
    /// Pre-rendered PNG of the pump compliance grid
    #[arg(long, conflicts_with = "skip_snapshot")]
    pub(crate) snapshot: Option<PathBuf>,
    /// Leave the pump compliance block out of the report
    #[arg(long)]
    pub(crate) skip_snapshot: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory receiving the PDF
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
    /// Inspection date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

pub(crate) fn run_catalog() -> Result<(), AppError> {
    let catalog = load_catalog()?;

    println!("Locations:");
    for location in &catalog.locations {
        println!("- {location}");
    }

    for section in catalog.bank().sections() {
        if section.is_visual_block() {
            println!("\n{} (pump grid)", section.title);
            continue;
        }
        println!("\n{}", section.title);
        for question in &section.questions {
            let kind = match question.kind {
                QuestionKind::Standard => "",
                QuestionKind::NumericInput => " [numeric]",
                QuestionKind::Informational => " [info]",
            };
            println!("  {}: {}{} (max {})", question.id, question.text, kind, question.max_points);
            let options: Vec<String> = question
                .options
                .iter()
                .map(|option| format!("{} = {}", option.text, option.points))
                .collect();
            println!("    {}", options.join(" | "));
        }
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let catalog = load_catalog()?;
    let audit = read_audit(&args.audit, &catalog)?;
    let totals = audit.totals(catalog.bank());

    println!("Audit for {} on {}", audit.location(), audit.inspection_date());
    println!(
        "- Score: {} / {}",
        totals.live_score, totals.total_possible_score
    );
    println!(
        "- Answered: {} of {} ({:.0}%)",
        totals.answered_questions,
        totals.total_questions,
        totals.progress_pct()
    );
    let non_compliant = audit
        .pump_statuses()
        .iter()
        .filter(|status| **status == PumpStatus::NonCompliant)
        .count();
    println!(
        "- Pumps: {} ({} non-compliant)",
        audit.pump_count(),
        non_compliant
    );

    match save_audit(&catalog, &audit) {
        Ok(receipt) => println!("{}", receipt.message),
        Err(err) => println!("Not ready to save: {err}"),
    }

    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let catalog = load_catalog()?;
    let audit = read_audit(&args.audit, &catalog)?;

    let provided = args
        .snapshot
        .as_deref()
        .map(fs::read)
        .transpose()?
        .map(ProvidedSnapshot);
    let snapshots: Option<&dyn SnapshotRenderer> = match (&provided, args.skip_snapshot) {
        (_, true) => None,
        (Some(snapshot), false) => Some(snapshot as &dyn SnapshotRenderer),
        (None, false) => Some(&PumpGridRenderer as &dyn SnapshotRenderer),
    };

    let report = ExportCoordinator::new().export(&catalog, &audit, snapshots)?;
    let path = write_report(&args.output_dir, &report.file_name, &report.bytes)?;
    print_export(&report, &path);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = load_catalog()?;
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let (audit, receipt) = saved_demo_audit(&catalog, today)?;
    let totals = audit.totals(catalog.bank());

    println!("Site inspection demo");
    println!(
        "- {} inspected by {} on {}",
        audit.location(),
        audit.inspector_name(),
        audit.inspection_date()
    );
    println!(
        "- Score {} / {} with {} of {} questions answered",
        totals.live_score,
        totals.total_possible_score,
        totals.answered_questions,
        totals.total_questions
    );
    println!("- {}", receipt.message);

    let report = ExportCoordinator::new().export(&catalog, &audit, Some(&PumpGridRenderer))?;
    let path = write_report(&args.output_dir, &report.file_name, &report.bytes)?;
    print_export(&report, &path);
    Ok(())
}

/// The demo only exports an audit that passes the save gate.
fn saved_demo_audit(
    catalog: &InspectionCatalog,
    today: NaiveDate,
) -> Result<(AuditState, SaveReceipt), AppError> {
    let audit = demo_audit(catalog, today)?;
    let receipt = save_audit(catalog, &audit)?;
    Ok((audit, receipt))
}

/// Answers every question with its first option, flags a few issues, and
/// attaches a photo so the report exercises every block.
fn demo_audit(catalog: &InspectionCatalog, today: NaiveDate) -> Result<AuditState, AppError> {
    let bank = catalog.bank();
    let mut audit = AuditState::for_catalog(catalog, today);
    audit.set_inspector_name("Demo Inspector");
    audit.set_pump_count(12);
    audit.toggle_pump(3)?;
    audit.toggle_pump(10)?;

    let picks: Vec<(String, String)> = bank
        .questions()
        .filter_map(|question| {
            let option = question.options.first()?;
            Some((question.id.clone(), option.text.clone()))
        })
        .collect();
    for (index, (question_id, answer)) in picks.into_iter().enumerate() {
        let answer = match bank.question(&question_id) {
            Some(question) if index % 7 == 3 && question.options.len() > 1 => {
                question.options[1].text.clone()
            }
            _ => answer,
        };
        audit.select_answer(bank, &question_id, answer)?;
    }

    if let Some(first) = bank.question_sections().flat_map(|section| &section.questions).next() {
        audit.set_comment(bank, &first.id, "Checked at opening; signage lit and readable.")?;
        let photo = render_pump_grid(audit.pump_statuses())?;
        audit.add_photo(bank, &first.id, to_data_url("image/png", &photo))?;
    }

    Ok(audit)
}

fn print_export(report: &RenderedReport, path: &Path) {
    println!(
        "Exported {} ({} pages, {} questions)",
        path.display(),
        report.page_count,
        report.entries.len()
    );
    if report.failed_images > 0 {
        println!("- {} image(s) replaced by placeholders", report.failed_images);
    }
}

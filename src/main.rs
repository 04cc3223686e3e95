//! Headless entry point: classify a CSV and print the dashboard views.

use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use exoscope::config;
use exoscope::dashboard::{DashboardController, ResultsPipeline};
use exoscope::labels::PredictionLabel;
use exoscope::logging;
use exoscope::metrics::{FeatureImportanceEntry, ModelEvaluation, format_percent};
use exoscope::results::ClassSummary;

const BAR_WIDTH: usize = 40;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err}");
            if let Some(path) = logging::log_file() {
                eprintln!("Run log: {}", path.display());
            }
            std::process::exit(2);
        }
    }
}

fn run() -> Result<i32, String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(0);
    };
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    // Worst case both the upload and the metrics fetch hit the timeout.
    let wait = settings.timeout() * 2 + Duration::from_secs(5);
    let mut dashboard =
        DashboardController::from_settings(settings).map_err(|err| err.to_string())?;

    dashboard
        .select_dataset(&options.dataset)
        .map_err(|err| err.to_string())?;
    dashboard.submit();
    if options.metrics {
        dashboard.refresh_metrics();
    }
    if !dashboard.wait_until_idle(wait) {
        return Err("Timed out waiting for the prediction service".to_string());
    }

    let color_stderr = std::io::stderr().is_terminal();
    for note in dashboard.notifications().iter() {
        let (badge, rgb) = note.tone.badge();
        let badge = paint(&format!("[{badge}]"), rgb, color_stderr);
        match &note.detail {
            Some(detail) => eprintln!("{badge} {}: {detail}", note.title),
            None => eprintln!("{badge} {}", note.title),
        }
    }

    let results = dashboard.results_mut();
    if results.last_error().is_some() {
        return Ok(1);
    }
    results.set_high_confidence_only(options.high_confidence);
    if let Some(page) = options.page {
        results
            .go_to_page(page)
            .map_err(|err| format!("Cannot show page {page}: {err}"))?;
    }

    let color_stdout = std::io::stdout().is_terminal();
    print_summary(results.summary(), color_stdout);
    print_page(dashboard.results(), color_stdout);
    if let Some(path) = &options.export {
        let file = File::create(path)
            .map_err(|err| format!("Create {} failed: {err}", path.display()))?;
        let mut writer = BufWriter::new(file);
        dashboard
            .results()
            .export_csv(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|err| format!("Export to {} failed: {err}", path.display()))?;
        println!("Exported {} rows to {}", dashboard.results().visible_count(), path.display());
    }
    if options.metrics {
        if let Some(evaluation) = dashboard.metrics().evaluation().data() {
            print_evaluation(evaluation);
        }
        if let Some(entries) = dashboard.metrics().importance().data() {
            print_importance(entries);
        }
    }
    Ok(0)
}

fn print_summary(summary: ClassSummary, color: bool) {
    let counts: Vec<String> = PredictionLabel::KNOWN
        .iter()
        .map(|label| {
            let name = paint(label.display_name(), label.tone().rgb(), color);
            format!("{name}: {}", summary.count(label))
        })
        .collect();
    println!("{}", counts.join("  "));
    if summary.unrecognized > 0 {
        println!("Unrecognized labels: {}", summary.unrecognized);
    }
}

fn print_page(results: &ResultsPipeline, color: bool) {
    let Some(page) = results.current_page() else {
        println!("No rows to display.");
        return;
    };
    let mut header = vec!["label".to_string()];
    header.extend(results.columns().iter().cloned());
    println!("{}", header.join("\t"));
    for row in &page.rows {
        let mut cells = vec![paint(row.label.display_name(), row.label.tone().rgb(), color)];
        cells.extend(
            results
                .columns()
                .iter()
                .map(|key| row.feature(key).map(ToString::to_string).unwrap_or_default()),
        );
        println!("{}", cells.join("\t"));
    }
    println!(
        "Page {} of {} ({} of {} rows)",
        page.index,
        page.total_pages,
        results.visible_count(),
        results.total_count()
    );
    if results.high_confidence_only() {
        println!("Showing rows with confidence >= {}%", format_percent(results.threshold()));
    }
    if page.has_next {
        println!("More rows: --page {}", page.index + 1);
    }
}

fn print_evaluation(evaluation: &ModelEvaluation) {
    for card in evaluation.report.cards() {
        println!("{}: {}%", card.name, card.value);
    }
    println!("actual \\ predicted\t{}", evaluation.matrix.labels.join("\t"));
    for row in &evaluation.matrix.rows {
        let counts: Vec<String> = evaluation
            .matrix
            .labels
            .iter()
            .map(|label| row.count(label).unwrap_or(0).to_string())
            .collect();
        println!("{}\t{}", row.actual, counts.join("\t"));
    }
    for class in &evaluation.report.per_class {
        println!(
            "{}: precision {}% recall {}% f1 {}% support {}",
            class.label,
            format_percent(class.precision),
            format_percent(class.recall),
            format_percent(class.f1),
            class.support
        );
    }
}

fn print_importance(entries: &[FeatureImportanceEntry]) {
    for entry in entries {
        let filled = (entry.normalized_score * BAR_WIDTH as f64).round() as usize;
        println!(
            "{:<28} {:<width$} {:.4}",
            entry.display_name,
            "#".repeat(filled.min(BAR_WIDTH)),
            entry.raw_score,
            width = BAR_WIDTH
        );
    }
}

/// Wrap `text` in a 24-bit ANSI foreground colour when `enabled`.
fn paint(text: &str, (r, g, b): (u8, u8, u8), enabled: bool) -> String {
    if enabled {
        format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

struct Options {
    dataset: PathBuf,
    page: Option<usize>,
    high_confidence: bool,
    export: Option<PathBuf>,
    metrics: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut dataset = None;
    let mut page = None;
    let mut high_confidence = false;
    let mut export = None;
    let mut metrics = true;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--page" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--page requires a value".to_string())?;
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid page number: {value}"))?;
                page = Some(parsed);
            }
            "--export" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--export requires a value".to_string())?;
                export = Some(PathBuf::from(value));
            }
            "--high-confidence" => high_confidence = true,
            "--no-metrics" => metrics = false,
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => {
                if dataset.replace(PathBuf::from(path)).is_some() {
                    return Err("Only one dataset may be given".to_string());
                }
            }
        }
        idx += 1;
    }
    let dataset = dataset.ok_or_else(|| format!("A dataset path is required\n\n{}", help_text()))?;
    Ok(Some(Options {
        dataset,
        page,
        high_confidence,
        export,
        metrics,
    }))
}

fn help_text() -> &'static str {
    "Usage: exoscope <dataset.csv> [--page N] [--high-confidence]\n\
     \x20      [--export out.csv] [--no-metrics]\n\
     \n\
     Uploads the dataset to the prediction service and prints the classified rows.\n\
     Service endpoints and paging defaults are read from settings.toml in the\n\
     application directory."
}

// Entry point and high-level CLI flow.
//
// Without a subcommand the binary runs an interactive menu:
// - Option [1] loads the source sheet, printing diagnostics.
// - Option [2] runs the ASIN daily dashboard.
// - Option [3] runs the product monthly dashboard.
// - Option [4] drops the cached sheet and loads it again.
// With `asin` or `products` it renders one dashboard and exits.
use clap::Parser;
use sales_dash::chart::ChartOutcome;
use sales_dash::config::{Cli, Command, RangeArgs};
use sales_dash::dashboard::{self, DashboardConfig, DashboardKind, DashboardReport, DashboardView};
use sales_dash::filter::FilterCriteria;
use sales_dash::logging::init_logging;
use sales_dash::output;
use sales_dash::source::{open_source, SourceCache};
use sales_dash::types::Dataset;
use sales_dash::util::{self, format_percent};
use sales_dash::Result;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

const PREVIEW_ROWS: usize = 10;

// Session state: the sheet is loaded at most once unless refreshed.
struct AppState {
    cache: SourceCache,
    out_dir: PathBuf,
}

/// Print `label` and read one trimmed line of input.
///
/// Returns `None` once stdin is closed or unreadable.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

fn read_answer<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Ask the user whether to go back to the dashboard selection menu.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N` or
/// input ended.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = prompt("Back to Dashboard Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_load_summary(data: &Dataset) {
    println!(
        "Processing dataset... ({} rows read, {} kept)",
        util::format_int(data.report.total_rows as u64),
        util::format_int(data.report.kept_rows as u64)
    );
    if data.report.dropped_dates > 0 {
        println!(
            "Note: {} rows skipped because their date could not be parsed.",
            util::format_int(data.report.dropped_dates as u64)
        );
    }
    if let Some((min, max)) = data.date_bounds() {
        println!("Dates: {} to {}", min, max);
    }
    println!();
}

/// Handle option [1]: load the sheet (a no-op when already cached).
fn handle_load(state: &AppState) {
    let was_loaded = state.cache.is_loaded();
    match state.cache.snapshot() {
        Ok(data) => {
            if was_loaded {
                println!("Source already loaded; use [4] to reload it.");
            }
            print_load_summary(&data);
        }
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

/// Handle option [4]: explicit refresh is the only way to reload.
fn handle_refresh(state: &mut AppState) {
    match state.cache.refresh() {
        Ok(data) => print_load_summary(&data),
        Err(e) => eprintln!("Failed to reload file: {}\n", e),
    }
}

/// `Some(date or default)` for an answer, `None` once input has ended.
fn prompt_date(
    label: &str,
    default: Option<chrono::NaiveDate>,
) -> Option<Option<chrono::NaiveDate>> {
    loop {
        let hint = default.map(|d| d.to_string()).unwrap_or_else(|| "none".into());
        let input = prompt(&format!("{} (YYYY-MM-DD, blank = {}): ", label, hint))?;
        if input.is_empty() {
            return Some(default);
        }
        match util::parse_date_safe(Some(&input)) {
            Some(d) => return Some(Some(d)),
            None => println!("Invalid date. Please use YYYY-MM-DD."),
        }
    }
}

fn prompt_range(data: &Dataset) -> Option<RangeArgs> {
    let bounds = data.date_bounds();
    Some(RangeArgs {
        from: prompt_date("From", bounds.map(|b| b.0))?,
        to: prompt_date("To", bounds.map(|b| b.1))?,
    })
}

fn prompt_asin(data: &Dataset) -> Option<String> {
    let ids = data.product_ids();
    if ids.is_empty() {
        println!("No ASINs found in the source.\n");
        return None;
    }
    for (i, id) in ids.iter().enumerate() {
        println!("[{}] {}", i + 1, id);
    }
    loop {
        let input = prompt("Select ASIN (number or value): ")?;
        if let Ok(n) = input.parse::<usize>() {
            if (1..=ids.len()).contains(&n) {
                return Some(ids[n - 1].to_string());
            }
        }
        if let Some(id) = ids.iter().find(|id| **id == input) {
            return Some(id.to_string());
        }
        println!("Invalid choice. Please pick one of the listed ASINs.");
    }
}

/// Handle options [2] and [3]: collect criteria interactively and render.
fn handle_dashboard(state: &AppState, kind: DashboardKind) {
    let data = match state.cache.snapshot() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return;
        }
    };
    let command = match kind {
        DashboardKind::AsinDaily => {
            let Some(asin) = prompt_asin(&data) else { return };
            let Some(range) = prompt_range(&data) else { return };
            Command::Asin { asin, range }
        }
        DashboardKind::ProductMonthly => {
            let Some(range) = prompt_range(&data) else { return };
            let Some(keyword) = prompt("Keyword (SKU / 品名 / 标题, blank = all): ") else {
                return;
            };
            Command::Products {
                keyword: Some(keyword).filter(|k| !k.is_empty()),
                range,
            }
        }
    };
    if let Err(e) = render(&data, &command, &state.out_dir) {
        eprintln!("Error: {}\n", e);
    }
}

fn render(data: &Dataset, command: &Command, out_dir: &Path) -> Result<()> {
    let criteria: FilterCriteria = command.criteria(data.date_bounds())?;
    let kind = match command {
        Command::Asin { .. } => DashboardKind::AsinDaily,
        Command::Products { .. } => DashboardKind::ProductMonthly,
    };
    let config = DashboardConfig::for_kind(kind);
    match dashboard::run(&config, data, &criteria) {
        DashboardView::NoData => {
            println!("{}\n", config.title);
            println!("当前筛选条件下无数据。\n");
            Ok(())
        }
        DashboardView::Ready(report) => present(&report, out_dir),
    }
}

/// Print every section of a report and write its CSV and chart files.
fn present(report: &DashboardReport, out_dir: &Path) -> Result<()> {
    println!("{}", report.title);
    println!("({} rows selected)\n", util::format_int(report.selected_rows as u64));

    if let Some(kpis) = &report.kpis {
        println!("总销售额: {} 円", util::format_number(kpis.total_revenue, 0));
        println!("广告花费（估）: {} 円", util::format_number(kpis.total_ad_spend, 0));
        println!("访客数: {}", util::format_number(kpis.total_sessions, 0));
        let acos = match kpis.mean_acos {
            Some(v) => format_percent(Some(v)),
            None => "无效".to_string(),
        };
        println!("ACOS (平均): {}\n", acos);
    }

    for monthly in &report.monthly {
        output::preview_table(monthly.title, None, &monthly.table, PREVIEW_ROWS);
    }

    output::preview_table(
        report.detail.title,
        Some("preview"),
        &report.detail.table,
        PREVIEW_ROWS,
    );
    std::fs::create_dir_all(out_dir)?;
    let csv_path = out_dir.join(&report.export_file_name);
    output::write_csv(&csv_path, &report.detail.table)?;
    println!("(Full table exported to {})\n", csv_path.display());

    match &report.chart {
        Some(ChartOutcome::Ready(figure)) => {
            let stem = report
                .export_file_name
                .strip_suffix(".csv")
                .unwrap_or(&report.export_file_name);
            let chart_path = out_dir.join(format!("{}_chart.json", stem));
            output::write_json(&chart_path, figure)?;
            println!("Chart written to {}\n", chart_path.display());
        }
        Some(ChartOutcome::InsufficientData) => println!("暂无足够数据绘制图表。\n"),
        None => {}
    }
    Ok(())
}

fn interactive(state: &mut AppState) {
    loop {
        println!("Select Dashboard:");
        println!("[1] Load the file");
        println!("[2] ASIN daily report");
        println!("[3] Product monthly report");
        println!("[4] Reload the file");
        println!("[5] Exit\n");
        let Some(choice) = read_choice() else {
            println!("\nInput closed. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(state),
            "2" | "3" => {
                println!();
                let kind = if choice == "2" {
                    DashboardKind::AsinDaily
                } else {
                    DashboardKind::ProductMonthly
                };
                handle_dashboard(state, kind);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_refresh(state),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let source = match open_source(&cli.source, &cli.sheet) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "cannot open source");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut state = AppState {
        cache: SourceCache::new(source),
        out_dir: cli.out_dir,
    };

    match cli.command {
        None => {
            interactive(&mut state);
            ExitCode::SUCCESS
        }
        Some(command) => {
            let result = state
                .cache
                .snapshot()
                .and_then(|data| render(&data, &command, &state.out_dir));
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "dashboard failed");
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn answers_are_trimmed_lines() {
        let mut input = Cursor::new("  2 \n\nY\n");
        assert_eq!(read_answer(&mut input), Some("2".to_string()));
        assert_eq!(read_answer(&mut input), Some(String::new()));
        assert_eq!(read_answer(&mut input), Some("Y".to_string()));
    }

    #[test]
    fn closed_input_yields_no_answer() {
        let mut input = Cursor::new("1\n");
        assert_eq!(read_answer(&mut input), Some("1".to_string()));
        assert_eq!(read_answer(&mut input), None);
        assert_eq!(read_answer(&mut Cursor::new("")), None);
    }
}

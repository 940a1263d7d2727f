use chrono::NaiveDate;
use sales_dash::chart::ChartOutcome;
use sales_dash::dashboard::{run, DashboardConfig, DashboardReport, DashboardView};
use sales_dash::filter::FilterCriteria;
use sales_dash::output::{table_to_csv, write_csv};
use sales_dash::source::{open_source, CsvSource, SourceCache};
use sales_dash::types::{AdChannel, DateRange, Dataset};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/daily.csv")
}

fn load_fixture() -> Arc<Dataset> {
    SourceCache::new(Box::new(CsvSource::new(fixture_path())))
        .snapshot()
        .expect("fixture loads")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ready(view: DashboardView) -> Box<DashboardReport> {
    match view {
        DashboardView::Ready(report) => report,
        DashboardView::NoData => panic!("expected rows for this selection"),
    }
}

fn column(report: &DashboardReport, header: &str) -> usize {
    report
        .detail
        .table
        .headers
        .iter()
        .position(|h| h == header)
        .unwrap_or_else(|| panic!("missing column {header}"))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn fixture_drops_undated_rows_and_detects_schema() {
    let data = load_fixture();
    assert_eq!(data.report.total_rows, 4);
    assert_eq!(data.report.kept_rows, 3);
    assert_eq!(data.report.dropped_dates, 1);
    assert_eq!(
        data.schema.ad_channels,
        vec![AdChannel::SponsoredProducts, AdChannel::SponsoredDisplay]
    );
    assert!(data.schema.has_cpc);
    assert_eq!(data.date_bounds(), Some((day(2024, 1, 1), day(2024, 2, 3))));
    assert_eq!(data.product_ids(), vec!["B0KETTLE1", "B0MUG0001"]);
}

#[test]
fn workbook_source_loads_the_named_sheet() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/daily.xlsx");
    let cache = SourceCache::new(open_source(&path, "源").unwrap());
    let data = cache.snapshot().unwrap();
    assert_eq!(data.report.kept_rows, 2);
    assert_eq!(data.date_bounds(), Some((day(2024, 1, 1), day(2024, 1, 2))));
    assert!((data.records[0].acos.unwrap() - 0.1234).abs() < 1e-12);
    assert_eq!(data.records[1].acos, None);

    let report = ready(run(
        &DashboardConfig::asin_daily(),
        &data,
        &FilterCriteria::default().with_product_id("B0KETTLE1"),
    ));
    assert_eq!(report.detail.table.rows[0][column(&report, "ACOS")], "12.34%");
    assert_eq!(report.detail.table.rows[1][column(&report, "访客转化率")], "--");
}

// ---------------------------------------------------------------------------
// ASIN daily dashboard
// ---------------------------------------------------------------------------

#[test]
fn asin_dashboard_formats_detail_rows() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_product_id("B0KETTLE1");
    let report = ready(run(&DashboardConfig::asin_daily(), &data, &criteria));

    assert_eq!(report.selected_rows, 2);
    let table = &report.detail.table;
    assert_eq!(table.headers.len(), 19);
    assert_eq!(table.band_row().unwrap()[0], "整体数据");
    assert_eq!(table.band_row().unwrap()[18], "广告数据");

    let first = &table.rows[0];
    let second = &table.rows[1];
    assert_eq!(first[column(&report, "日期")], "2024-01-01");
    assert_eq!(first[column(&report, "访客数")], "100");
    assert_eq!(first[column(&report, "访客转化率")], "10.00%");
    assert_eq!(first[column(&report, "销售额")], "20,000");
    assert_eq!(first[column(&report, "CPC-SP")], "45.3");
    assert_eq!(first[column(&report, "CR")], "10.00%");
    assert_eq!(first[column(&report, "广告花费")], "500");
    assert_eq!(first[column(&report, "ACOS")], "12.34%");

    // Zero sessions/clicks and the ACOS sentinel all render the placeholder.
    assert_eq!(second[column(&report, "访客转化率")], "--");
    assert_eq!(second[column(&report, "CR")], "--");
    assert_eq!(second[column(&report, "ACOS")], "--");
    assert_eq!(second[column(&report, "CPA")], "--");
    assert_eq!(second[column(&report, "广告花费")], "0");

    assert_eq!(report.export_file_name, "ASIN日报_B0KETTLE1.csv");
}

#[test]
fn asin_dashboard_kpis_skip_undefined_acos() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_product_id("B0KETTLE1");
    let report = ready(run(&DashboardConfig::asin_daily(), &data, &criteria));
    let kpis = report.kpis.expect("asin dashboard shows KPIs");
    assert_eq!(kpis.total_revenue, 24000.0);
    assert_eq!(kpis.total_ad_spend, 500.0);
    assert_eq!(kpis.total_sessions, 100.0);
    assert!((kpis.mean_acos.unwrap() - 0.1234).abs() < 1e-12);
}

#[test]
fn asin_dashboard_chart_uses_only_clean_days() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_product_id("B0KETTLE1");
    let report = ready(run(&DashboardConfig::asin_daily(), &data, &criteria));
    let Some(ChartOutcome::Ready(figure)) = &report.chart else {
        panic!("expected a chart");
    };
    assert_eq!(figure.data[0].x, vec![day(2024, 1, 1)]);
    // One point cannot fill a 30-day window.
    assert_eq!(figure.data[4].y, vec![None]);
}

#[test]
fn asin_dashboard_without_clean_days_reports_insufficient_data() {
    let data = load_fixture();
    let criteria = FilterCriteria::default()
        .with_product_id("B0KETTLE1")
        .with_date_range(DateRange::new(day(2024, 1, 2), day(2024, 1, 2)).unwrap());
    let report = ready(run(&DashboardConfig::asin_daily(), &data, &criteria));
    assert_eq!(report.chart, Some(ChartOutcome::InsufficientData));
}

#[test]
fn unknown_asin_yields_no_data() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_product_id("B0MISSING");
    assert_eq!(
        run(&DashboardConfig::asin_daily(), &data, &criteria),
        DashboardView::NoData
    );
}

// ---------------------------------------------------------------------------
// Product monthly dashboard
// ---------------------------------------------------------------------------

#[test]
fn product_dashboard_summarizes_by_month() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_keyword("KETTLE");
    let report = ready(run(&DashboardConfig::product_monthly(), &data, &criteria));

    assert!(report.kpis.is_none());
    assert!(report.chart.is_none());
    assert_eq!(report.monthly.len(), 2);

    let by_product = &report.monthly[0].table;
    assert_eq!(
        by_product.rows,
        vec![vec!["Red Kettle", "2024-01", "12", "11", "21,600", "1"]]
    );
    let by_asin = &report.monthly[1].table;
    assert_eq!(
        by_asin.rows,
        vec![vec!["Red Kettle", "B0KETTLE1", "2024-01", "12", "11", "21,600"]]
    );
    assert_eq!(report.detail.table.headers.len(), 17);
    assert_eq!(report.export_file_name, "日度明细.csv");
}

#[test]
fn product_dashboard_date_range_limits_months() {
    let data = load_fixture();
    let criteria = FilterCriteria::default()
        .with_date_range(DateRange::new(day(2024, 2, 1), day(2024, 2, 29)).unwrap());
    let report = ready(run(&DashboardConfig::product_monthly(), &data, &criteria));
    let rows = &report.monthly[0].table.rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Tea Mug");
    assert_eq!(rows[0][1], "2024-02");
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

#[test]
fn exported_csv_matches_on_screen_strings() {
    let data = load_fixture();
    let criteria = FilterCriteria::default()
        .with_product_id("B0KETTLE1")
        .with_date_range(DateRange::new(day(2024, 1, 1), day(2024, 1, 1)).unwrap());
    let report = ready(run(&DashboardConfig::asin_daily(), &data, &criteria));
    let table = &report.detail.table;

    let bytes = table_to_csv(table).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let mut rdr = csv::Reader::from_reader(&bytes[3..]);
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, table.headers);
    let rows: Vec<Vec<String>> = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    assert_eq!(rows, table.rows);
    assert_eq!(rows[0][column(&report, "ACOS")], "12.34%");
}

#[test]
fn csv_file_is_written_with_bom() {
    let data = load_fixture();
    let criteria = FilterCriteria::default().with_keyword("mug");
    let report = ready(run(&DashboardConfig::product_monthly(), &data, &criteria));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&report.export_file_name);
    write_csv(&path, &report.detail.table).unwrap();
    let written = std::fs::read(&path).unwrap();
    assert!(written.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(written[3..].to_vec()).unwrap();
    assert!(text.starts_with("日期,访客,销量"));
    assert!(text.contains("2024-02-03"));
}

//! Command-line and environment configuration.

use crate::error::{DashboardError, Result};
use crate::filter::FilterCriteria;
use crate::types::DateRange;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sales-dash", version, about = "ASIN and product sales dashboards")]
pub struct Cli {
    /// Spreadsheet to load (.xlsx/.xls/.ods or a .csv export)
    #[arg(long, env = "SALES_DASH_SOURCE", default_value = "source.xlsx")]
    pub source: PathBuf,

    /// Sheet name inside a workbook
    #[arg(long, env = "SALES_DASH_SHEET", default_value = "源")]
    pub sheet: String,

    /// Directory for CSV and chart output
    #[arg(long, env = "SALES_DASH_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Daily report for one ASIN
    Asin {
        #[arg(long)]
        asin: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Monthly product summaries, optionally narrowed by keyword
    Products {
        #[arg(long)]
        keyword: Option<String>,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub to: Option<NaiveDate>,
}

fn parse_day(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}

impl RangeArgs {
    /// Fill open ends from the dataset bounds. `None` when both ends are
    /// open and there are no bounds.
    pub fn resolve(&self, bounds: Option<(NaiveDate, NaiveDate)>) -> Result<Option<DateRange>> {
        let (lo, hi) = match (self.from, self.to, bounds) {
            (None, None, _) => return Ok(None),
            (Some(f), Some(t), _) => (f, t),
            (Some(f), None, Some((_, max))) => (f, max.max(f)),
            (None, Some(t), Some((min, _))) => (min.min(t), t),
            (Some(d), None, None) | (None, Some(d), None) => (d, d),
        };
        DateRange::new(lo, hi).map(Some)
    }
}

impl Command {
    pub fn criteria(&self, bounds: Option<(NaiveDate, NaiveDate)>) -> Result<FilterCriteria> {
        match self {
            Command::Asin { asin, range } => {
                if asin.trim().is_empty() {
                    return Err(DashboardError::InvalidInput("ASIN must not be empty".into()));
                }
                Ok(FilterCriteria {
                    product_id: Some(asin.trim().to_string()),
                    date_range: range.resolve(bounds)?,
                    keyword: None,
                })
            }
            Command::Products { keyword, range } => Ok(FilterCriteria {
                product_id: None,
                date_range: range.resolve(bounds)?,
                keyword: keyword.clone(),
            }),
        }
    }
}

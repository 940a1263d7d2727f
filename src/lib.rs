//! Sales dashboards over a daily e-commerce performance sheet.
//!
//! Load the sheet once per session, filter by ASIN, date range or keyword,
//! derive conversion and advertising metrics, aggregate monthly totals and
//! render tables, CSV exports and a traffic vs. conversion chart.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod presenter;
pub mod reports;
pub mod source;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};

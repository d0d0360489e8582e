//! payequity - pay-equity statistics for payroll exports.
//!
//! Loads a payroll table (CSV or Excel), aggregates female/male pay per
//! occupation (CBO) into derived tables with a traffic-light
//! classification, and renders them as an Excel workbook with native
//! charts or as JSON.
//!
//! ```no_run
//! use payequity::{aggregate, load_input, render, ReportStyle};
//! use std::path::Path;
//!
//! let dataset = load_input(Path::new("folha.csv"))?;
//! let bundle = aggregate(&dataset, 3)?;
//! render(&dataset, &bundle, Path::new("relatorio.xlsx"), &ReportStyle::default())?;
//! # Ok::<(), payequity::ReportError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod report;

pub use analysis::aggregate;
pub use dataset::{load_input, Dataset};
pub use error::{ReportError, Result};
pub use models::AggregateBundle;
pub use report::{generate_json_report, render, ReportStyle};

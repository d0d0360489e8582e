//! Report output.
//!
//! The workbook renderer lives in `generator`; colors and cell formats in
//! `style`; native chart builders in `charts`.

pub mod charts;
pub mod generator;
pub mod style;

pub use generator::*;
pub use style::{HexColor, ReportStyle};

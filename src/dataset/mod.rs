//! In-memory payroll dataset.
//!
//! A [`Dataset`] keeps the header row and the cells exactly as they were
//! loaded, so that the report can reproduce the input verbatim. Typed
//! [`PayrollRecord`]s are derived from it after the required columns have
//! been resolved.

pub mod loader;

pub use loader::load_input;

use crate::error::{ReportError, Result};
use crate::models::{CompetenceMonth, OccupationKey, PayrollRecord, Sex};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

/// A single input cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    /// Classify a raw text field the way a CSV reader sees it.
    pub fn from_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(field.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric value, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text value with surrounding whitespace removed; `None` when blank.
    pub fn as_key(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string().trim().to_string())
        }
    }

    /// Month of a competence date cell.
    pub fn as_month(&self) -> Option<CompetenceMonth> {
        match self {
            CellValue::Date(d) => Some(CompetenceMonth::from_date(*d)),
            CellValue::Number(n) => excel_serial_to_date(*n).map(CompetenceMonth::from_date),
            CellValue::Text(s) => parse_month(s.trim()),
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Convert an Excel date serial (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Parse the competence date formats seen in payroll exports.
fn parse_month(s: &str) -> Option<CompetenceMonth> {
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(CompetenceMonth::from_date(date));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(CompetenceMonth::from_date(dt.date()));
        }
    }

    // Bare "YYYY-MM" / "YYYY/MM"
    let (year, month) = s.split_once(['-', '/'])?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    CompetenceMonth::new(year.parse().ok()?, month.parse().ok()?)
}

/// The columns every input must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    EmployerId,
    OccupationCode,
    OccupationTitle,
    Sex,
    Race,
    ContractualSalary,
    TotalCompensation,
    CompetenceDate,
    WorkerId,
}

impl Column {
    pub const REQUIRED: [Column; 9] = [
        Column::EmployerId,
        Column::OccupationCode,
        Column::OccupationTitle,
        Column::Sex,
        Column::Race,
        Column::ContractualSalary,
        Column::TotalCompensation,
        Column::CompetenceDate,
        Column::WorkerId,
    ];

    /// Canonical (lowercase) column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::EmployerId => "cnpj_estabelecimento",
            Column::OccupationCode => "cbo_2002",
            Column::OccupationTitle => "cbo_titulo",
            Column::Sex => "sexo",
            Column::Race => "raca_cor",
            Column::ContractualSalary => "salario_contratual_mensal",
            Column::TotalCompensation => "remuneracao_total_mensal",
            Column::CompetenceDate => "data_competencia",
            Column::WorkerId => "id_trabalhador_hash",
        }
    }
}

/// Positions of the required columns in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [usize; 9],
}

impl ColumnMap {
    pub fn position(&self, column: Column) -> usize {
        self.positions[column as usize]
    }
}

/// A loaded table: header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Create a dataset. Header names are trimmed and short rows are padded.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate every required column, case-insensitively.
    ///
    /// All missing columns are collected before failing.
    pub fn resolve_columns(&self) -> Result<ColumnMap> {
        let lowered: Vec<String> = self.columns.iter().map(|c| c.to_lowercase()).collect();
        let mut positions = [0usize; 9];
        let mut missing = Vec::new();

        for column in Column::REQUIRED {
            match lowered.iter().position(|c| c == column.name()) {
                Some(idx) => positions[column as usize] = idx,
                None => missing.push(column.name()),
            }
        }

        if missing.is_empty() {
            Ok(ColumnMap { positions })
        } else {
            Err(ReportError::schema(missing))
        }
    }

    /// Convert every row into a typed record.
    pub fn records(&self) -> Result<Vec<PayrollRecord>> {
        let map = self.resolve_columns()?;
        Ok(self.rows.iter().map(|row| to_record(row, &map)).collect())
    }
}

fn to_record(row: &[CellValue], map: &ColumnMap) -> PayrollRecord {
    let cell = |column: Column| &row[map.position(column)];

    let occupation = match (
        cell(Column::OccupationCode).as_key(),
        cell(Column::OccupationTitle).as_key(),
    ) {
        (Some(code), Some(title)) => Some(OccupationKey::new(code, title)),
        _ => None,
    };

    PayrollRecord {
        employer_id: cell(Column::EmployerId).as_key().unwrap_or_default(),
        occupation,
        sex: cell(Column::Sex).as_key().map(|s| Sex::parse(&s)),
        race: cell(Column::Race).as_key(),
        salary: cell(Column::ContractualSalary).as_f64(),
        compensation: cell(Column::TotalCompensation).as_f64(),
        month: cell(Column::CompetenceDate).as_month(),
        worker_id: cell(Column::WorkerId).as_key(),
    }
}

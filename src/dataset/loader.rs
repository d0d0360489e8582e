//! Input file loading.
//!
//! Payroll exports arrive as CSV or as an Excel workbook (first sheet).
//! Either way the result is a [`Dataset`] whose required columns have
//! already been checked.

use super::{excel_serial_to_date, CellValue, Dataset};
use crate::error::{ReportError, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
}

impl InputFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" => Ok(InputFormat::Excel),
            _ => Err(ReportError::UnsupportedFormat {
                extension: format!(".{}", extension),
            }),
        }
    }
}

/// Load and validate an input file.
pub fn load_input(path: &Path) -> Result<Dataset> {
    let format = InputFormat::from_path(path)?;
    info!("Loading {:?} input from: {}", format, path.display());

    let dataset = match format {
        InputFormat::Csv => {
            let file = std::fs::File::open(path)
                .map_err(|e| ReportError::Input(format!("{}: {}", path.display(), e)))?;
            read_csv(file)?
        }
        InputFormat::Excel => read_excel(path)?,
    };

    dataset.resolve_columns()?;
    debug!(
        "Loaded {} rows x {} columns",
        dataset.len(),
        dataset.columns().len()
    );

    Ok(dataset)
}

/// Read a comma-separated table with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::from_field).collect());
    }

    Ok(Dataset::new(columns, rows))
}

/// Read the first worksheet of an Excel workbook.
pub fn read_excel(path: &Path) -> Result<Dataset> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(ReportError::Input("workbook has no worksheets".to_string())),
    };

    let mut rows_iter = range.rows();
    let columns: Vec<String> = match rows_iter.next() {
        Some(header) => header.iter().map(|c| from_excel(c).to_string()).collect(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(from_excel).collect())
        .collect();

    Ok(Dataset::new(columns, rows))
}

fn from_excel(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
cnpj_estabelecimento,CBO_2002,cbo_titulo,sexo,raca_cor,salario_contratual_mensal,remuneracao_total_mensal,data_competencia,id_trabalhador_hash
11222333000144,252105,Administrador,F,Branca,4000,4500,2024-01-31,w1
11222333000144,252105,Administrador,M,Parda,5000,5600,2024-01-31,w2
";

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::from_path(Path::new("folha.CSV")).unwrap(),
            InputFormat::Csv
        );
        assert_eq!(
            InputFormat::from_path(Path::new("folha.xlsm")).unwrap(),
            InputFormat::Excel
        );
        assert!(matches!(
            InputFormat::from_path(Path::new("folha.txt")),
            Err(ReportError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            InputFormat::from_path(Path::new("folha")),
            Err(ReportError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_read_csv() {
        let dataset = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.columns()[1], "CBO_2002");
        assert_eq!(dataset.rows()[0][3], CellValue::Text("F".to_string()));
        assert_eq!(dataset.rows()[1][5], CellValue::Number(5000.0));
    }

    #[test]
    fn test_load_input_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = load_input(file.path()).unwrap();
        assert_eq!(dataset.records().unwrap().len(), 2);
    }

    #[test]
    fn test_load_input_reports_missing_columns() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"cbo_2002,cbo_titulo\n1,A\n").unwrap();

        match load_input(file.path()) {
            Err(ReportError::Schema { missing }) => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"raca_cor".to_string()));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_excel_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folha.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in super::super::Column::REQUIRED.iter().enumerate() {
            sheet.write_string(0, col as u16, name.name()).unwrap();
        }
        sheet.write_number(1, 0, 11222333000144.0).unwrap();
        sheet.write_number(1, 1, 252105.0).unwrap();
        sheet.write_string(1, 2, "Administrador").unwrap();
        sheet.write_string(1, 3, "F").unwrap();
        sheet.write_string(1, 4, "Preta").unwrap();
        sheet.write_number(1, 5, 4200.0).unwrap();
        sheet.write_number(1, 6, 4700.0).unwrap();
        sheet.write_string(1, 7, "2024-02-29").unwrap();
        sheet.write_string(1, 8, "w9").unwrap();
        workbook.save(&path).unwrap();

        let dataset = load_input(&path).unwrap();
        let records = dataset.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].occupation.as_ref().map(|o| o.code.as_str()),
            Some("252105")
        );
        assert_eq!(records[0].salary, Some(4200.0));
    }
}

//! Spreadsheet report generation.
//!
//! Every derived table of an [`AggregateBundle`] becomes a worksheet with a
//! styled header row, and most sheets carry native Excel charts built from
//! the cells written next to them. Nothing is recomputed here: the renderer
//! only lays out what the aggregator produced.

use super::charts::{self, MedianBar, SeriesRows, LOWER_SPREAD_COL, UPPER_SPREAD_COL};
use super::style::{classification_format, format_currency, NumberFormats, ReportStyle};
use crate::dataset::{CellValue, Dataset};
use crate::error::Result;
use crate::models::{
    AggregateBundle, Classification, DemographicCount, OccupationGroupStat, OccupationKey, Sex,
};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const RAW_DATA_SHEET: &str = "Dados_Originais";
pub const SUMMARY_SHEET: &str = "razao_salarial_cbo";
pub const TREND_SHEET: &str = "Evolucao_Mensal";
pub const DISTRIBUTION_SHEET: &str = "Distribuicao_por_Ocupacao";
pub const DEMOGRAPHICS_SHEET: &str = "Analise_Demografica";
pub const RACE_CHARTS_SHEET: &str = "Graficos_Detalhados_por_CBO";
pub const MEDIAN_SHEET: &str = "Analise_Mediana_Salarial_CBO";
pub const INDICATORS_SHEET: &str = "Indicadores";
pub const ACTION_PLAN_SHEET: &str = "Plano_de_Acao";

/// Sheets in workbook order.
pub const SHEET_NAMES: [&str; 9] = [
    RAW_DATA_SHEET,
    SUMMARY_SHEET,
    TREND_SHEET,
    DISTRIBUTION_SHEET,
    DEMOGRAPHICS_SHEET,
    RACE_CHARTS_SHEET,
    MEDIAN_SHEET,
    INDICATORS_SHEET,
    ACTION_PLAN_SHEET,
];

// Rows reserved per chart section so consecutive charts never overlap.
const RACE_SECTION_MIN_ROWS: RowNum = 20;
const MEDIAN_SECTION_ROWS: RowNum = 24;

/// Accumulates worksheets and the formats shared between them.
pub struct ReportBuilder {
    workbook: Workbook,
    style: ReportStyle,
    header: Format,
    title: Format,
    numbers: NumberFormats,
}

impl ReportBuilder {
    pub fn new(style: &ReportStyle) -> Self {
        Self {
            workbook: Workbook::new(),
            style: style.clone(),
            header: style.header_format(),
            title: style.title_format(),
            numbers: NumberFormats::default(),
        }
    }

    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    fn push(&mut self, sheet: Worksheet) {
        self.workbook.push_worksheet(sheet);
    }

    /// Write the workbook to `destination`.
    pub fn save(mut self, destination: &Path) -> Result<()> {
        self.workbook.save(destination)?;
        Ok(())
    }
}

/// Render the full workbook for `bundle` to `destination`.
pub fn render(
    dataset: &Dataset,
    bundle: &AggregateBundle,
    destination: &Path,
    style: &ReportStyle,
) -> Result<()> {
    info!("Rendering report to: {}", destination.display());

    let mut builder = ReportBuilder::new(style);

    write_raw_data(&mut builder, dataset)?;
    write_summary(&mut builder, &bundle.occupations)?;
    write_monthly_trend(&mut builder, bundle)?;
    write_distribution(&mut builder, bundle)?;
    write_demographics(&mut builder, bundle)?;
    write_race_charts(&mut builder, bundle)?;
    write_median_analysis(&mut builder, bundle)?;
    write_indicators(&mut builder, bundle)?;
    write_action_plan(&mut builder, bundle)?;

    builder.save(destination)?;
    debug!("Workbook saved with {} sheets", SHEET_NAMES.len());

    Ok(())
}

/// Generate a JSON report.
pub fn generate_json_report(bundle: &AggregateBundle) -> Result<String> {
    serde_json::to_string_pretty(bundle)
        .map_err(|e| crate::error::ReportError::Render(e.to_string()))
}

fn new_sheet(name: &str) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(name)?;
    Ok(sheet)
}

fn write_header(sheet: &mut Worksheet, row: RowNum, headers: &[&str], format: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as ColNum, *header, format)?;
    }
    Ok(())
}

fn set_widths(sheet: &mut Worksheet, widths: &[f64]) -> Result<()> {
    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as ColNum, *width)?;
    }
    Ok(())
}

/// Undefined values stay as empty cells.
fn write_optional(
    sheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: Option<f64>,
    format: &Format,
) -> Result<()> {
    if let Some(value) = value {
        sheet.write_number_with_format(row, col, value, format)?;
    }
    Ok(())
}

fn write_count(sheet: &mut Worksheet, row: RowNum, col: ColNum, count: usize) -> Result<()> {
    sheet.write_number(row, col, count as f64)?;
    Ok(())
}

/// Numeric occupation codes are written as numbers.
fn write_occupation(sheet: &mut Worksheet, row: RowNum, occupation: &OccupationKey) -> Result<()> {
    match occupation.code.parse::<f64>() {
        Ok(code) if code.is_finite() => sheet.write_number(row, 0, code)?,
        _ => sheet.write_string(row, 0, &occupation.code)?,
    };
    sheet.write_string(row, 1, &occupation.title)?;
    Ok(())
}

fn write_raw_data(builder: &mut ReportBuilder, dataset: &Dataset) -> Result<()> {
    let mut sheet = new_sheet(RAW_DATA_SHEET)?;

    let headers: Vec<&str> = dataset.columns().iter().map(String::as_str).collect();
    write_header(&mut sheet, 0, &headers, &builder.header)?;

    for (i, row) in dataset.rows().iter().enumerate() {
        let r = i as RowNum + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as ColNum;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    sheet.write_string(r, c, text)?;
                }
                CellValue::Number(number) => {
                    sheet.write_number(r, c, *number)?;
                }
                CellValue::Date(_) => {
                    sheet.write_string(r, c, cell.to_string())?;
                }
            }
        }
    }

    set_widths(&mut sheet, &vec![20.0; headers.len()])?;
    builder.push(sheet);
    Ok(())
}

fn write_summary(builder: &mut ReportBuilder, occupations: &[OccupationGroupStat]) -> Result<()> {
    let mut sheet = new_sheet(SUMMARY_SHEET)?;
    let numbers = &builder.numbers;

    write_header(
        &mut sheet,
        0,
        &[
            "cbo_2002",
            "cbo_titulo",
            "mediana_sal_F",
            "mediana_sal_M",
            "razao_mediana_F_M",
            "media_rem_F",
            "media_rem_M",
            "razao_media_F_M",
            "n_F",
            "n_M",
            "classificacao",
        ],
        &builder.header,
    )?;

    for (i, stat) in occupations.iter().enumerate() {
        let r = i as RowNum + 1;
        write_occupation(&mut sheet, r, &stat.occupation)?;
        write_optional(&mut sheet, r, 2, stat.median_salary_female, &numbers.currency)?;
        write_optional(&mut sheet, r, 3, stat.median_salary_male, &numbers.currency)?;
        write_optional(&mut sheet, r, 4, stat.ratio_median, &numbers.ratio)?;
        write_optional(&mut sheet, r, 5, stat.mean_compensation_female, &numbers.currency)?;
        write_optional(&mut sheet, r, 6, stat.mean_compensation_male, &numbers.currency)?;
        write_optional(&mut sheet, r, 7, stat.ratio_mean, &numbers.ratio)?;
        if let Some(n) = stat.workers_female {
            write_count(&mut sheet, r, 8, n)?;
        }
        if let Some(n) = stat.workers_male {
            write_count(&mut sheet, r, 9, n)?;
        }
        sheet.write_string_with_format(
            r,
            10,
            stat.classification.label(),
            &classification_format(stat.classification),
        )?;
    }

    set_widths(
        &mut sheet,
        &[12.0, 35.0, 15.0, 15.0, 18.0, 15.0, 15.0, 18.0, 8.0, 8.0, 15.0],
    )?;

    if !occupations.is_empty() {
        let rows = SeriesRows::new(SUMMARY_SHEET, 1, occupations.len() as RowNum);
        let chart = charts::ratio_chart(rows, 1, 4, 7, &builder.style);
        sheet.insert_chart(1, 12, &chart)?;
    }

    builder.push(sheet);
    Ok(())
}

fn write_monthly_trend(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(TREND_SHEET)?;
    let numbers = &builder.numbers;

    write_header(
        &mut sheet,
        0,
        &["data_competencia", "F", "M", "razao_F_M"],
        &builder.header,
    )?;

    for (i, trend) in bundle.monthly_trend.iter().enumerate() {
        let r = i as RowNum + 1;
        sheet.write_string(r, 0, trend.month.to_string())?;
        write_optional(&mut sheet, r, 1, trend.mean_compensation_female, &numbers.currency)?;
        write_optional(&mut sheet, r, 2, trend.mean_compensation_male, &numbers.currency)?;
        write_optional(&mut sheet, r, 3, trend.ratio, &numbers.ratio)?;
    }

    set_widths(&mut sheet, &[18.0, 15.0, 15.0, 12.0])?;

    if !bundle.monthly_trend.is_empty() {
        let rows = SeriesRows::new(TREND_SHEET, 1, bundle.monthly_trend.len() as RowNum);
        let chart = charts::trend_chart(rows, 0, 3, &builder.style);
        sheet.insert_chart(1, 5, &chart)?;
    }

    builder.push(sheet);
    Ok(())
}

fn write_distribution(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(DISTRIBUTION_SHEET)?;
    let numbers = &builder.numbers;

    write_header(
        &mut sheet,
        0,
        &[
            "cbo_2002",
            "cbo_titulo",
            "total_trabalhadores",
            "F",
            "M",
            "percentual_F",
            "percentual_M",
        ],
        &builder.header,
    )?;

    for (i, entry) in bundle.distribution.iter().enumerate() {
        let r = i as RowNum + 1;
        write_occupation(&mut sheet, r, &entry.occupation)?;
        write_count(&mut sheet, r, 2, entry.total)?;
        write_count(&mut sheet, r, 3, entry.female)?;
        write_count(&mut sheet, r, 4, entry.male)?;
        sheet.write_number_with_format(r, 5, entry.percent_female, &numbers.percent)?;
        sheet.write_number_with_format(r, 6, entry.percent_male, &numbers.percent)?;
    }

    set_widths(&mut sheet, &[12.0, 35.0, 20.0, 8.0, 8.0, 14.0, 14.0])?;

    if !bundle.distribution.is_empty() {
        let rows = SeriesRows::new(DISTRIBUTION_SHEET, 1, bundle.distribution.len() as RowNum);
        let total_chart = charts::headcount_chart(rows, 1, 2, &builder.style);
        sheet.insert_chart(1, 8, &total_chart)?;

        let sex_chart = charts::sex_headcount_chart(rows, 1, 3, 4, &builder.style);
        sheet.insert_chart(21, 8, &sex_chart)?;
    }

    builder.push(sheet);
    Ok(())
}

/// Demographic cells grouped by occupation, in summary order.
fn demographics_by_occupation<'a>(
    bundle: &'a AggregateBundle,
) -> Vec<(&'a OccupationKey, Vec<&'a DemographicCount>)> {
    let mut grouped: BTreeMap<&OccupationKey, Vec<&DemographicCount>> = BTreeMap::new();
    for cell in &bundle.demographics {
        grouped.entry(&cell.occupation).or_default().push(cell);
    }

    bundle
        .occupations
        .iter()
        .filter_map(|stat| {
            grouped
                .remove(&stat.occupation)
                .map(|cells| (&stat.occupation, cells))
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct RaceCounts {
    female: usize,
    male: usize,
    total: usize,
}

fn race_counts<'a>(cells: &[&'a DemographicCount]) -> BTreeMap<&'a str, RaceCounts> {
    let mut races: BTreeMap<&str, RaceCounts> = BTreeMap::new();
    for cell in cells {
        let counts = races.entry(cell.race.as_str()).or_default();
        match cell.sex {
            Sex::Female => counts.female += cell.workers,
            Sex::Male => counts.male += cell.workers,
            Sex::Other(_) => {}
        }
        counts.total += cell.workers;
    }
    races
}

fn write_demographics(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(DEMOGRAPHICS_SHEET)?;
    let header = &builder.header;

    write_header(
        &mut sheet,
        0,
        &[
            "cbo_2002",
            "cbo_titulo",
            "sexo",
            "raca_cor",
            "contagem_trabalhadores",
        ],
        header,
    )?;

    for (i, cell) in bundle.demographics.iter().enumerate() {
        let r = i as RowNum + 1;
        write_occupation(&mut sheet, r, &cell.occupation)?;
        sheet.write_string(r, 2, cell.sex.as_str())?;
        sheet.write_string(r, 3, &cell.race)?;
        write_count(&mut sheet, r, 4, cell.workers)?;
    }

    let sections = demographics_by_occupation(bundle);
    let mut row = bundle.demographics.len() as RowNum + 2;

    // Totals per occupation.
    let mut grand_female = 0;
    let mut grand_male = 0;
    let mut grand_total = 0;
    for (occupation, cells) in &sections {
        let races = race_counts(cells);
        let female: usize = races.values().map(|c| c.female).sum();
        let male: usize = races.values().map(|c| c.male).sum();
        let total: usize = races.values().map(|c| c.total).sum();

        sheet.write_string_with_format(row, 0, format!("TOTAL CBO {}", occupation.code), header)?;
        sheet.write_string(row, 1, &occupation.title)?;
        sheet.write_string(row, 2, "TOTAL")?;
        write_count(&mut sheet, row, 3, total)?;
        sheet.write_string(row, 4, format!("Mulheres: {} | Homens: {}", female, male))?;

        grand_female += female;
        grand_male += male;
        grand_total += total;
        row += 1;
    }

    sheet.write_string_with_format(row, 0, "TOTAL GERAL", header)?;
    sheet.write_string(row, 2, "TOTAL")?;
    write_count(&mut sheet, row, 3, grand_total)?;
    sheet.write_string(
        row,
        4,
        format!("Mulheres: {} | Homens: {}", grand_female, grand_male),
    )?;
    row += 2;

    // Totals per race/color, laid out like the occupation totals.
    let all_cells: Vec<&DemographicCount> = bundle.demographics.iter().collect();
    let race_totals = race_counts(&all_cells);

    sheet.write_string_with_format(row, 0, "TOTAL POR RAÇA/COR", header)?;
    row += 1;
    for (race, counts) in &race_totals {
        sheet.write_string(row, 0, *race)?;
        write_count(&mut sheet, row, 3, counts.total)?;
        sheet.write_string(
            row,
            4,
            format!("Mulheres: {} | Homens: {}", counts.female, counts.male),
        )?;
        row += 1;
    }
    row += 2;

    // Occupation x race/color cross-tab.
    let races: Vec<&str> = race_totals.keys().copied().collect();
    let mut pivot_header = vec!["cbo_2002", "cbo_titulo"];
    pivot_header.extend(races.iter().copied());
    write_header(&mut sheet, row, &pivot_header, header)?;
    row += 1;

    for (occupation, cells) in &sections {
        let counts = race_counts(cells);
        write_occupation(&mut sheet, row, occupation)?;
        for (offset, race) in races.iter().enumerate() {
            let workers = counts.get(race).map(|c| c.total).unwrap_or(0);
            write_count(&mut sheet, row, offset as ColNum + 2, workers)?;
        }
        row += 1;
    }

    set_widths(&mut sheet, &[18.0, 35.0, 10.0, 15.0, 28.0])?;
    builder.push(sheet);
    Ok(())
}

fn write_race_charts(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(RACE_CHARTS_SHEET)?;

    sheet.write_string_with_format(
        0,
        0,
        "Distribuição por Raça/Cor e Sexo por CBO",
        &builder.title,
    )?;

    let mut row: RowNum = 2;
    for (occupation, cells) in demographics_by_occupation(bundle) {
        let races = race_counts(&cells);
        let has_female = races.values().any(|c| c.female > 0);
        let has_male = races.values().any(|c| c.male > 0);

        sheet.write_string_with_format(row, 0, occupation.to_string(), &builder.title)?;
        write_header(
            &mut sheet,
            row + 1,
            &["Raça/Cor", "Mulheres (F)", "Homens (M)", "Total"],
            &builder.header,
        )?;

        let first = row + 2;
        for (offset, (race, counts)) in races.iter().enumerate() {
            let r = first + offset as RowNum;
            sheet.write_string(r, 0, *race)?;
            write_count(&mut sheet, r, 1, counts.female)?;
            write_count(&mut sheet, r, 2, counts.male)?;
            write_count(&mut sheet, r, 3, counts.total)?;
        }
        let last = first + races.len() as RowNum - 1;

        if has_female || has_male {
            let title = format!("CBO {}", occupation.code);
            let rows = SeriesRows::new(RACE_CHARTS_SHEET, first, last);
            let chart =
                charts::race_sex_chart(rows, &title, has_female, has_male, builder.style());
            sheet.insert_chart(row, 5, &chart)?;
        }

        row += (races.len() as RowNum + 2).max(RACE_SECTION_MIN_ROWS) + 1;
    }

    set_widths(&mut sheet, &[20.0, 14.0, 14.0, 10.0])?;
    builder.push(sheet);
    Ok(())
}

fn write_median_analysis(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(MEDIAN_SHEET)?;
    let currency = &builder.numbers.currency;

    sheet.write_string_with_format(
        0,
        0,
        "Análise de Mediana Salarial por CBO",
        &builder.title,
    )?;

    let mut row: RowNum = 2;
    for detail in &bundle.salary_detail {
        let present: Vec<_> = [
            ("F", "Mulheres", detail.female.as_ref(), builder.style.female_color()),
            ("M", "Homens", detail.male.as_ref(), builder.style.male_color()),
        ]
        .into_iter()
        .filter_map(|(code, label, stats, color)| stats.map(|s| (code, label, s, color)))
        .collect();

        if present.is_empty() {
            continue;
        }

        sheet.write_string_with_format(row, 0, detail.occupation.to_string(), &builder.title)?;
        write_header(
            &mut sheet,
            row + 1,
            &[
                "Gênero",
                "Mediana",
                "Média",
                "Q1",
                "Q3",
                "Contagem",
                "Erro inferior",
                "Erro superior",
            ],
            &builder.header,
        )?;

        let mut bars = Vec::with_capacity(present.len());
        for (offset, (code, label, stats, color)) in present.into_iter().enumerate() {
            let r = row + 2 + offset as RowNum;
            sheet.write_string(r, 0, code)?;
            sheet.write_number_with_format(r, 1, stats.median, currency)?;
            sheet.write_number_with_format(r, 2, stats.mean, currency)?;
            sheet.write_number_with_format(r, 3, stats.q1, currency)?;
            sheet.write_number_with_format(r, 4, stats.q3, currency)?;
            write_count(&mut sheet, r, 5, stats.count)?;
            sheet.write_number_with_format(r, LOWER_SPREAD_COL, stats.lower_spread(), currency)?;
            sheet.write_number_with_format(r, UPPER_SPREAD_COL, stats.upper_spread(), currency)?;

            bars.push(MedianBar {
                row: r,
                name: format!("{} (Mediana: R$ {})", label, format_currency(stats.median)),
                color,
            });
        }

        let title = format!("CBO {}", detail.occupation.code);
        let chart = charts::median_chart(MEDIAN_SHEET, &title, &bars);
        sheet.insert_chart(row, 9, &chart)?;

        row += MEDIAN_SECTION_ROWS;
    }

    set_widths(
        &mut sheet,
        &[20.0, 14.0, 14.0, 14.0, 14.0, 10.0, 14.0, 14.0],
    )?;
    builder.push(sheet);
    Ok(())
}

fn write_ranking(
    sheet: &mut Worksheet,
    builder: &ReportBuilder,
    row: RowNum,
    title: &str,
    stats: &[OccupationGroupStat],
) -> Result<RowNum> {
    sheet.write_string_with_format(row, 0, title, &builder.title)?;
    write_header(
        sheet,
        row + 1,
        &["cbo_2002", "cbo_titulo", "razao_mediana_F_M", "classificacao"],
        &builder.header,
    )?;

    let mut r = row + 2;
    for stat in stats {
        write_occupation(sheet, r, &stat.occupation)?;
        write_optional(sheet, r, 2, stat.ratio_median, &builder.numbers.ratio)?;
        sheet.write_string_with_format(
            r,
            3,
            stat.classification.label(),
            &classification_format(stat.classification),
        )?;
        r += 1;
    }

    Ok(r)
}

fn write_indicators(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(INDICATORS_SHEET)?;
    let ratio = &builder.numbers.ratio;

    sheet.write_string_with_format(
        0,
        0,
        format!(
            "Relatório de Igualdade Salarial - {}",
            builder.style.company_name
        ),
        &builder.title,
    )?;

    sheet.write_string(2, 0, "Empresa")?;
    sheet.write_string(2, 1, &builder.style.company_name)?;
    sheet.write_string(3, 0, "k mínimo")?;
    write_count(&mut sheet, 3, 1, bundle.k_min)?;
    sheet.write_string(4, 0, "Ocupações analisadas")?;
    write_count(&mut sheet, 4, 1, bundle.occupations.len())?;

    write_header(&mut sheet, 6, &["Classificação", "Ocupações"], &builder.header)?;
    let first_band: RowNum = 7;
    for (offset, classification) in Classification::ALL.iter().enumerate() {
        let r = first_band + offset as RowNum;
        sheet.write_string_with_format(
            r,
            0,
            classification.label(),
            &classification_format(*classification),
        )?;
        write_count(
            &mut sheet,
            r,
            1,
            bundle.classification_counts.get(*classification),
        )?;
    }
    let last_band = first_band + Classification::ALL.len() as RowNum - 1;

    sheet.write_string(12, 0, "Razão mediana F/M média")?;
    write_optional(&mut sheet, 12, 1, bundle.mean_ratio_median, ratio)?;
    sheet.write_string(13, 0, "Razão média F/M média")?;
    write_optional(&mut sheet, 13, 1, bundle.mean_ratio_mean, ratio)?;

    let next = write_ranking(
        &mut sheet,
        builder,
        15,
        "Maiores razões (mediana F/M)",
        &bundle.top_ratios,
    )?;
    write_ranking(
        &mut sheet,
        builder,
        next + 1,
        "Menores razões (mediana F/M)",
        &bundle.bottom_ratios,
    )?;

    set_widths(&mut sheet, &[28.0, 35.0, 18.0, 15.0])?;

    let rows = SeriesRows::new(INDICATORS_SHEET, first_band, last_band);
    let chart = charts::classification_chart(rows, 0, 1, &builder.style);
    sheet.insert_chart(2, 5, &chart)?;

    builder.push(sheet);
    Ok(())
}

fn write_action_plan(builder: &mut ReportBuilder, bundle: &AggregateBundle) -> Result<()> {
    let mut sheet = new_sheet(ACTION_PLAN_SHEET)?;

    write_header(
        &mut sheet,
        0,
        &[
            "cbo_2002",
            "cbo_titulo",
            "razao_mediana_F_M",
            "medida",
            "meta",
            "prazo",
        ],
        &builder.header,
    )?;

    for (i, item) in bundle.remediation_plan.iter().enumerate() {
        let r = i as RowNum + 1;
        write_occupation(&mut sheet, r, &item.occupation)?;
        write_optional(&mut sheet, r, 2, item.ratio_median, &builder.numbers.ratio)?;
        sheet.write_string(r, 3, item.action)?;
        sheet.write_number(r, 4, item.target_ratio)?;
        sheet.write_string(r, 5, item.horizon)?;
    }

    set_widths(&mut sheet, &[12.0, 35.0, 18.0, 28.0, 8.0, 18.0])?;
    builder.push(sheet);
    Ok(())
}

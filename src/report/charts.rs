//! Native Excel charts.
//!
//! Every chart reads its series from cells already written to a sheet,
//! so ranges are `(sheet, first_row, col, last_row, col)` tuples.

use super::style::{HexColor, ReportStyle};
use rust_xlsxwriter::{
    Chart, ChartErrorBars, ChartErrorBarsType, ChartFormat, ChartLegendPosition, ChartLine,
    ChartRange, ChartSolidFill, ChartType, ColNum, RowNum,
};

const BASE_WIDTH: u32 = 480;
const BASE_HEIGHT: u32 = 288;

/// A contiguous block of rows holding one series per column.
#[derive(Debug, Clone, Copy)]
pub struct SeriesRows<'a> {
    pub sheet: &'a str,
    pub first_row: RowNum,
    pub last_row: RowNum,
}

impl<'a> SeriesRows<'a> {
    pub fn new(sheet: &'a str, first_row: RowNum, last_row: RowNum) -> Self {
        Self {
            sheet,
            first_row,
            last_row,
        }
    }

    fn column(&self, col: ColNum) -> (&'a str, RowNum, ColNum, RowNum, ColNum) {
        (self.sheet, self.first_row, col, self.last_row, col)
    }
}

fn fill(color: HexColor) -> ChartFormat {
    let mut format = ChartFormat::new();
    format.set_solid_fill(ChartSolidFill::new().set_color(color));
    format
}

fn line(color: HexColor) -> ChartFormat {
    let mut format = ChartFormat::new();
    format.set_line(ChartLine::new().set_color(color));
    format
}

fn scaled(chart: &mut Chart, factor: f64) {
    chart
        .set_width((BASE_WIDTH as f64 * factor) as u32)
        .set_height((BASE_HEIGHT as f64 * factor) as u32);
}

/// Clustered columns of the median and mean F/M ratios per occupation.
pub fn ratio_chart(
    rows: SeriesRows,
    category_col: ColNum,
    median_col: ColNum,
    mean_col: ColNum,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    chart
        .add_series()
        .set_name("Razão Mediana F/M")
        .set_categories(rows.column(category_col))
        .set_values(rows.column(median_col))
        .set_format(&mut fill(style.primary));
    chart
        .add_series()
        .set_name("Razão Média F/M")
        .set_categories(rows.column(category_col))
        .set_values(rows.column(mean_col))
        .set_format(&mut fill(style.accent));

    chart.title().set_name("Razões F/M por CBO");
    chart.x_axis().set_name("CBO");
    chart.y_axis().set_name("Razão F/M");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.5);
    chart
}

/// Line of the monthly F/M compensation ratio.
pub fn trend_chart(
    rows: SeriesRows,
    month_col: ColNum,
    ratio_col: ColNum,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Line);

    chart
        .add_series()
        .set_name("Razão F/M")
        .set_categories(rows.column(month_col))
        .set_values(rows.column(ratio_col))
        .set_format(&mut line(style.primary));

    chart.title().set_name("Tendência da Razão F/M (12m)");
    chart.x_axis().set_name("Mês");
    chart.y_axis().set_name("Razão F/M");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.2);
    chart
}

/// Workers per occupation.
pub fn headcount_chart(
    rows: SeriesRows,
    category_col: ColNum,
    total_col: ColNum,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    chart
        .add_series()
        .set_name("Trabalhadores")
        .set_categories(rows.column(category_col))
        .set_values(rows.column(total_col))
        .set_format(&mut fill(style.primary));

    chart.title().set_name("Distribuição de Trabalhadores por CBO");
    chart.x_axis().set_name("CBO");
    chart.y_axis().set_name("Número de Trabalhadores");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.2);
    chart
}

/// Workers per occupation, one series per sex.
pub fn sex_headcount_chart(
    rows: SeriesRows,
    category_col: ColNum,
    female_col: ColNum,
    male_col: ColNum,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    chart
        .add_series()
        .set_name("Mulheres")
        .set_categories(rows.column(category_col))
        .set_values(rows.column(female_col))
        .set_format(&mut fill(style.female_color()));
    chart
        .add_series()
        .set_name("Homens")
        .set_categories(rows.column(category_col))
        .set_values(rows.column(male_col))
        .set_format(&mut fill(style.male_color()));

    chart.title().set_name("Distribuição de Trabalhadores por CBO e Sexo");
    chart.x_axis().set_name("CBO");
    chart.y_axis().set_name("Número de Trabalhadores");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.2);
    chart
}

/// Race x sex columns for a single occupation.
///
/// Columns are: race (categories), female count, male count. A sex with no
/// workers in the occupation gets no series.
pub fn race_sex_chart(
    rows: SeriesRows,
    title: &str,
    has_female: bool,
    has_male: bool,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    if has_female {
        chart
            .add_series()
            .set_name("Mulheres")
            .set_categories(rows.column(0))
            .set_values(rows.column(1))
            .set_format(&mut fill(style.female_color()))
            .set_gap(20)
            .set_overlap(-10);
    }
    if has_male {
        chart
            .add_series()
            .set_name("Homens")
            .set_categories(rows.column(0))
            .set_values(rows.column(2))
            .set_format(&mut fill(style.male_color()))
            .set_gap(20)
            .set_overlap(-10);
    }

    chart
        .title()
        .set_name(format!("Distribuição por Raça/Cor x Sexo - {}", title).as_str());
    chart.x_axis().set_name("Raça/Cor");
    chart.y_axis().set_name("Número de Trabalhadores");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.2);
    chart
}

/// One bar of a median chart: the row holding
/// `label, median, mean, q1, q3, count, lower, upper`.
#[derive(Debug, Clone)]
pub struct MedianBar {
    pub row: RowNum,
    pub name: String,
    pub color: HexColor,
}

/// Column of the lower spread (median - q1) in a median block.
pub const LOWER_SPREAD_COL: ColNum = 6;
/// Column of the upper spread (q3 - median) in a median block.
pub const UPPER_SPREAD_COL: ColNum = 7;

/// Median salary per sex with interquartile error bars.
pub fn median_chart(sheet: &str, title: &str, bars: &[MedianBar]) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    for bar in bars {
        let plus = ChartRange::new_from_range(
            sheet,
            bar.row,
            UPPER_SPREAD_COL,
            bar.row,
            UPPER_SPREAD_COL,
        );
        let minus =
            ChartRange::new_from_range(sheet, bar.row, LOWER_SPREAD_COL, bar.row, LOWER_SPREAD_COL);

        let mut error_bars = ChartErrorBars::new();
        error_bars
            .set_type(ChartErrorBarsType::Custom(plus, minus))
            .set_format(&mut line(HexColor::ERROR_BAR));

        chart
            .add_series()
            .set_name(bar.name.as_str())
            .set_categories((sheet, bar.row, 0, bar.row, 0))
            .set_values((sheet, bar.row, 1, bar.row, 1))
            .set_format(&mut fill(bar.color))
            .set_y_error_bars(&error_bars);
    }

    chart
        .title()
        .set_name(format!("Mediana Salarial com Intervalo Interquartil - {}", title).as_str());
    chart.x_axis().set_name("Gênero");
    chart.y_axis().set_name("Salário (R$)");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    scaled(&mut chart, 1.5);
    chart
}

/// Occupations per classification band.
pub fn classification_chart(
    rows: SeriesRows,
    label_col: ColNum,
    count_col: ColNum,
    style: &ReportStyle,
) -> Chart {
    let mut chart = Chart::new(ChartType::Column);

    chart
        .add_series()
        .set_name("Ocupações")
        .set_categories(rows.column(label_col))
        .set_values(rows.column(count_col))
        .set_format(&mut fill(style.primary));

    chart.title().set_name("Ocupações por Classificação");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Workbook, Worksheet};

    const SHEET: &str = "Dados";

    fn sheet_with_rows() -> Worksheet {
        let mut sheet = Worksheet::new();
        sheet.set_name(SHEET).unwrap();
        for row in 0..3u32 {
            sheet.write_string(row, 0, format!("cat{}", row)).unwrap();
            for col in 1..=UPPER_SPREAD_COL {
                sheet.write_number(row, col, (row + col as u32) as f64).unwrap();
            }
        }
        sheet
    }

    #[test]
    fn test_every_chart_saves_with_colors() {
        let style = ReportStyle::default();
        let rows = SeriesRows::new(SHEET, 0, 2);
        let bars = [
            MedianBar {
                row: 0,
                name: "Feminino".to_string(),
                color: style.female_color(),
            },
            MedianBar {
                row: 1,
                name: "Masculino".to_string(),
                color: style.male_color(),
            },
        ];

        let charts = [
            ratio_chart(rows, 0, 1, 2, &style),
            trend_chart(rows, 0, 1, &style),
            headcount_chart(rows, 0, 1, &style),
            sex_headcount_chart(rows, 0, 1, 2, &style),
            race_sex_chart(rows, "252105", true, true, &style),
            median_chart(SHEET, "252105", &bars),
            classification_chart(rows, 0, 1, &style),
        ];

        let mut sheet = sheet_with_rows();
        for (i, chart) in charts.iter().enumerate() {
            sheet.insert_chart(i as u32 * 20, 10, chart).unwrap();
        }

        let mut workbook = Workbook::new();
        workbook.push_worksheet(sheet);
        let buffer = workbook.save_to_buffer().unwrap();
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_race_chart_with_one_sex_saves() {
        let style = ReportStyle::default();
        let chart = race_sex_chart(SeriesRows::new(SHEET, 0, 2), "411010", true, false, &style);

        let mut sheet = sheet_with_rows();
        sheet.insert_chart(0, 10, &chart).unwrap();

        let mut workbook = Workbook::new();
        workbook.push_worksheet(sheet);
        assert!(workbook.save_to_buffer().is_ok());
    }
}

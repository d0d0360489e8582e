//! Data models for the pay-equity report.
//!
//! This module contains the input record type and every derived table
//! produced by the aggregator and consumed by the workbook renderer.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Sex category as recorded in the payroll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sex {
    Female,
    Male,
    /// Any other value, kept verbatim.
    Other(String),
}

impl Sex {
    /// Parse a raw cell value. `F`/`M` are matched case-insensitively.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("F") {
            Sex::Female
        } else if trimmed.eq_ignore_ascii_case("M") {
            Sex::Male
        } else {
            Sex::Other(trimmed.to_string())
        }
    }

    /// Label used in tables (`F`, `M` or the raw value).
    pub fn as_str(&self) -> &str {
        match self {
            Sex::Female => "F",
            Sex::Male => "M",
            Sex::Other(s) => s,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Ordered by label so that grouped tables sort F before M.
impl Ord for Sex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Sex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Traffic-light ("semáforo") classification of an occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Ratio of medians at or above 0.99.
    Green,
    /// Ratio of medians in [0.95, 0.99).
    Amber,
    /// Ratio of medians below 0.95.
    Red,
    /// Fewer than `k_min` distinct workers of either sex. Not comparable.
    Insufficient,
}

impl Classification {
    /// All labels, in the order they are reported.
    pub const ALL: [Classification; 4] = [
        Classification::Green,
        Classification::Amber,
        Classification::Red,
        Classification::Insufficient,
    ];

    /// Label written to the workbook.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Green => "Verde",
            Classification::Amber => "Âmbar",
            Classification::Red => "Vermelho",
            Classification::Insufficient => "Insuficiente",
        }
    }

    /// Returns an emoji representation of the classification.
    pub fn emoji(&self) -> &'static str {
        match self {
            Classification::Green => "🟢",
            Classification::Amber => "🟡",
            Classification::Red => "🔴",
            Classification::Insufficient => "⚪",
        }
    }

    /// Whether the occupation passed the k-anonymity gate.
    pub fn is_sufficient(&self) -> bool {
        !matches!(self, Classification::Insufficient)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A calendar month, the granularity of the competence date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompetenceMonth {
    year: i32,
    month: u32,
}

impl CompetenceMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncate a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for CompetenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for CompetenceMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Occupation grouping key (CBO 2002 code and title).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OccupationKey {
    #[serde(rename = "cbo_2002")]
    pub code: String,
    #[serde(rename = "cbo_titulo")]
    pub title: String,
}

impl OccupationKey {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }
}

// Integer codes first, numerically; every other code after them as text;
// then by title.
impl OccupationKey {
    fn sort_key(&self) -> (bool, i64, &str, &str) {
        let numeric = self.code.trim().parse::<i64>().ok();
        (
            numeric.is_none(),
            numeric.unwrap_or(0),
            self.code.as_str(),
            self.title.as_str(),
        )
    }
}

impl Ord for OccupationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for OccupationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OccupationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CBO {} - {}", self.code, self.title)
    }
}

/// One payroll row, typed.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollRecord {
    /// Employer (establishment) identifier.
    pub employer_id: String,
    /// `None` when the code or the title is blank.
    pub occupation: Option<OccupationKey>,
    pub sex: Option<Sex>,
    pub race: Option<String>,
    /// Monthly contractual salary. `None` when the cell is not numeric.
    pub salary: Option<f64>,
    /// Monthly total compensation. `None` when the cell is not numeric.
    pub compensation: Option<f64>,
    /// Competence month. `None` when the date could not be parsed.
    pub month: Option<CompetenceMonth>,
    /// Opaque worker identifier, used only for distinct counting.
    pub worker_id: Option<String>,
}

/// Per-occupation statistics with separate female/male columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationGroupStat {
    #[serde(flatten)]
    pub occupation: OccupationKey,
    #[serde(rename = "mediana_sal_F")]
    pub median_salary_female: Option<f64>,
    #[serde(rename = "mediana_sal_M")]
    pub median_salary_male: Option<f64>,
    #[serde(rename = "razao_mediana_F_M")]
    pub ratio_median: Option<f64>,
    #[serde(rename = "media_rem_F")]
    pub mean_compensation_female: Option<f64>,
    #[serde(rename = "media_rem_M")]
    pub mean_compensation_male: Option<f64>,
    #[serde(rename = "razao_media_F_M")]
    pub ratio_mean: Option<f64>,
    #[serde(rename = "n_F")]
    pub workers_female: Option<usize>,
    #[serde(rename = "n_M")]
    pub workers_male: Option<usize>,
    #[serde(rename = "classificacao")]
    pub classification: Classification,
}

/// Mean total compensation per month and sex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    #[serde(rename = "data_competencia")]
    pub month: CompetenceMonth,
    #[serde(rename = "F")]
    pub mean_compensation_female: Option<f64>,
    #[serde(rename = "M")]
    pub mean_compensation_male: Option<f64>,
    #[serde(rename = "razao_F_M")]
    pub ratio: Option<f64>,
}

/// Headcount of an occupation, overall and per sex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationDistribution {
    #[serde(flatten)]
    pub occupation: OccupationKey,
    #[serde(rename = "total_trabalhadores")]
    pub total: usize,
    #[serde(rename = "F")]
    pub female: usize,
    #[serde(rename = "M")]
    pub male: usize,
    #[serde(rename = "percentual_F")]
    pub percent_female: f64,
    #[serde(rename = "percentual_M")]
    pub percent_male: f64,
}

/// Distinct workers of one occupation × sex × race/color cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicCount {
    #[serde(flatten)]
    pub occupation: OccupationKey,
    #[serde(rename = "sexo")]
    pub sex: Sex,
    #[serde(rename = "raca_cor")]
    pub race: String,
    #[serde(rename = "contagem_trabalhadores")]
    pub workers: usize,
}

/// Descriptive statistics of contractual salary for one sex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryStats {
    pub median: f64,
    pub mean: f64,
    pub q1: f64,
    pub q3: f64,
    pub count: usize,
}

impl SalaryStats {
    /// Distance from Q1 up to the median.
    pub fn lower_spread(&self) -> f64 {
        self.median - self.q1
    }

    /// Distance from the median up to Q3.
    pub fn upper_spread(&self) -> f64 {
        self.q3 - self.median
    }
}

/// Contractual salary detail of one occupation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryDetail {
    #[serde(flatten)]
    pub occupation: OccupationKey,
    pub female: Option<SalaryStats>,
    pub male: Option<SalaryStats>,
}

/// Number of occupations per classification label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
    pub insufficient: usize,
}

impl ClassificationCounts {
    /// Count the classifications of a summary table.
    pub fn from_stats(stats: &[OccupationGroupStat]) -> Self {
        let mut counts = Self::default();

        for stat in stats {
            match stat.classification {
                Classification::Green => counts.green += 1,
                Classification::Amber => counts.amber += 1,
                Classification::Red => counts.red += 1,
                Classification::Insufficient => counts.insufficient += 1,
            }
        }

        counts
    }

    pub fn get(&self, classification: Classification) -> usize {
        match classification {
            Classification::Green => self.green,
            Classification::Amber => self.amber,
            Classification::Red => self.red,
            Classification::Insufficient => self.insufficient,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.amber + self.red + self.insufficient
    }
}

/// One entry of the remediation plan for red occupations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationItem {
    #[serde(flatten)]
    pub occupation: OccupationKey,
    #[serde(rename = "razao_mediana_F_M")]
    pub ratio_median: Option<f64>,
    #[serde(rename = "medida")]
    pub action: &'static str,
    #[serde(rename = "meta")]
    pub target_ratio: f64,
    #[serde(rename = "prazo")]
    pub horizon: &'static str,
}

/// Everything the aggregator derives from one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBundle {
    /// k-anonymity threshold used for classification.
    pub k_min: usize,
    /// Occupation summary, in report order.
    pub occupations: Vec<OccupationGroupStat>,
    pub monthly_trend: Vec<MonthlyTrend>,
    pub distribution: Vec<OccupationDistribution>,
    pub demographics: Vec<DemographicCount>,
    pub salary_detail: Vec<SalaryDetail>,
    pub classification_counts: ClassificationCounts,
    /// Occupations with the highest ratio of medians.
    pub top_ratios: Vec<OccupationGroupStat>,
    /// Occupations with the lowest ratio of medians.
    pub bottom_ratios: Vec<OccupationGroupStat>,
    pub mean_ratio_median: Option<f64>,
    pub mean_ratio_mean: Option<f64>,
    pub remediation_plan: Vec<RemediationItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_parse() {
        assert_eq!(Sex::parse("F"), Sex::Female);
        assert_eq!(Sex::parse(" m "), Sex::Male);
        assert_eq!(Sex::parse("X"), Sex::Other("X".to_string()));
        assert!(Sex::Female < Sex::Male);
    }

    #[test]
    fn test_classification_labels() {
        assert_eq!(Classification::Green.label(), "Verde");
        assert_eq!(Classification::Amber.label(), "Âmbar");
        assert_eq!(Classification::Red.label(), "Vermelho");
        assert_eq!(Classification::Insufficient.to_string(), "Insuficiente");
        assert!(!Classification::Insufficient.is_sufficient());
    }

    #[test]
    fn test_occupation_key_ordering() {
        let a = OccupationKey::new("2521", "Administrador");
        let b = OccupationKey::new("411005", "Auxiliar de escritório");
        let c = OccupationKey::new("411005", "Assistente");
        assert!(a < b, "codes compare numerically");
        assert!(c < b, "equal codes fall back to title");
    }

    #[test]
    fn test_occupation_key_ordering_mixed_codes() {
        let mut keys: Vec<OccupationKey> = ["9", "10", "1a", "2521-05", "2", "0x", "100"]
            .iter()
            .map(|code| OccupationKey::new(*code, "T"))
            .collect();
        keys.sort();

        let codes: Vec<&str> = keys.iter().map(|k| k.code.as_str()).collect();
        assert_eq!(codes, vec!["2", "9", "10", "100", "0x", "1a", "2521-05"]);

        let nine = OccupationKey::new("9", "T");
        let ten = OccupationKey::new("10", "T");
        let text = OccupationKey::new("1a", "T");
        assert!(nine < ten && ten < text && nine < text);
    }

    #[test]
    fn test_competence_month_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(CompetenceMonth::from_date(date).to_string(), "2024-03");
        assert!(CompetenceMonth::new(2024, 13).is_none());
    }

    #[test]
    fn test_salary_stats_spread() {
        let stats = SalaryStats {
            median: 5000.0,
            mean: 5100.0,
            q1: 4200.0,
            q3: 6000.0,
            count: 8,
        };
        assert_eq!(stats.lower_spread(), 800.0);
        assert_eq!(stats.upper_spread(), 1000.0);
    }
}

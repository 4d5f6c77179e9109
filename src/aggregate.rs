//! Period filtering and group-by aggregations behind the public dashboard.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::loader::Dataset;
use crate::record::{CaseRecord, Period, compare_months};

/// Number of diseases shown in the ranking and the trend chart.
pub const TOP_N: usize = 10;

/// Shown instead of the charts when a period has no rows.
pub const EMPTY_PERIOD_WARNING: &str = "Tidak ada data untuk periode ini.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseTotal {
    pub disease: String,
    pub total: i64,
}

/// Monthly totals of a single disease across one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub disease: String,
    /// `(month, total)` in calendar order; months without rows are absent.
    pub points: Vec<(String, i64)>,
}

/// Everything the public dashboard shows for one selected period.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub top: Vec<DiseaseTotal>,
    pub trend: Vec<TrendSeries>,
    pub trend_months: Vec<String>,
    pub annual: Vec<DiseaseTotal>,
    pub warning: Option<String>,
}

pub fn filter_period<'a>(records: &'a [CaseRecord], year: i32, month: &str) -> Vec<&'a CaseRecord> {
    records
        .iter()
        .filter(|r| r.year == year && r.month == month)
        .collect()
}

/// Sum `case_count` per disease, keeping first-appearance order. Totals
/// saturate at `i64::MAX` / `i64::MIN`.
fn sum_by_disease<'a, I>(records: I) -> Vec<DiseaseTotal>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<DiseaseTotal> = Vec::new();
    for r in records {
        match index.get(r.disease.as_str()) {
            Some(&i) => totals[i].total = totals[i].total.saturating_add(r.case_count),
            None => {
                index.insert(r.disease.as_str(), totals.len());
                totals.push(DiseaseTotal {
                    disease: r.disease.clone(),
                    total: r.case_count,
                });
            }
        }
    }
    totals
}

/// Group by disease, sum, sort descending and keep the first `n`.
///
/// The sort is stable, so equal totals keep the order in which their disease
/// first appears in `records`.
pub fn top_diseases<'a, I>(records: I, n: usize) -> Vec<DiseaseTotal>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut totals = sum_by_disease(records);
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals.truncate(n);
    totals
}

/// Per-disease totals for a whole year, sorted descending, not truncated.
pub fn annual_summary(records: &[CaseRecord], year: i32) -> Vec<DiseaseTotal> {
    top_diseases(records.iter().filter(|r| r.year == year), usize::MAX)
}

/// Monthly series for `diseases` (in that order) across `year`.
pub fn annual_trend(records: &[CaseRecord], year: i32, diseases: &[String]) -> Vec<TrendSeries> {
    let mut by_month: HashMap<(&str, &str), i64> = HashMap::new();
    for r in records.iter().filter(|r| r.year == year) {
        let total = by_month.entry((r.disease.as_str(), r.month.as_str())).or_insert(0);
        *total = total.saturating_add(r.case_count);
    }

    let months = year_months(records, year);
    diseases
        .iter()
        .map(|disease| TrendSeries {
            disease: disease.clone(),
            points: months
                .iter()
                .filter_map(|m| {
                    by_month
                        .get(&(disease.as_str(), m.as_str()))
                        .map(|total| (m.clone(), *total))
                })
                .collect(),
        })
        .collect()
}

/// Distinct months that occur in `year`, in calendar order.
pub fn year_months(records: &[CaseRecord], year: i32) -> Vec<String> {
    sorted_months(records.iter().filter(|r| r.year == year))
}

/// Distinct years, newest first.
pub fn available_years(records: &[CaseRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
    years.into_iter().rev().collect()
}

/// Distinct months over the whole dataset, in calendar order.
pub fn available_months(records: &[CaseRecord]) -> Vec<String> {
    sorted_months(records.iter())
}

fn sorted_months<'a, I>(records: I) -> Vec<String>
where
    I: Iterator<Item = &'a CaseRecord>,
{
    let set: BTreeSet<&str> = records.map(|r| r.month.as_str()).collect();
    let mut months: Vec<String> = set.into_iter().map(str::to_string).collect();
    months.sort_by(|a, b| compare_months(a, b));
    months
}

/// Pick the requested period, falling back to the newest year and the first
/// month for anything not supplied. `None` when the dataset is empty.
pub fn resolve_period(dataset: &Dataset, year: Option<i32>, month: Option<&str>) -> Option<Period> {
    let year = match year {
        Some(y) => y,
        None => *available_years(&dataset.records).first()?,
    };
    let month = match month {
        Some(m) if !m.trim().is_empty() => m.trim().to_string(),
        _ => available_months(&dataset.records).into_iter().next()?,
    };
    Some(Period { year, month })
}

/// Top-N ranking, trend and annual summary for one period.
pub fn summarize(dataset: &Dataset, period: &Period) -> PeriodSummary {
    let records = &dataset.records;
    let selected = filter_period(records, period.year, &period.month);

    if selected.is_empty() {
        return PeriodSummary {
            period: period.clone(),
            top: Vec::new(),
            trend: Vec::new(),
            trend_months: Vec::new(),
            annual: annual_summary(records, period.year),
            warning: Some(EMPTY_PERIOD_WARNING.to_string()),
        };
    }

    let top = top_diseases(selected, TOP_N);
    let leaders: Vec<String> = top.iter().map(|t| t.disease.clone()).collect();

    PeriodSummary {
        period: period.clone(),
        trend: annual_trend(records, period.year, &leaders),
        trend_months: year_months(records, period.year),
        annual: annual_summary(records, period.year),
        top,
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, month: &str, disease: &str, count: i64) -> CaseRecord {
        CaseRecord::new(year, month, disease, count)
    }

    fn total(disease: &str, total: i64) -> DiseaseTotal {
        DiseaseTotal {
            disease: disease.to_string(),
            total,
        }
    }

    #[test]
    fn test_top_diseases_example() {
        let records = vec![
            rec(2024, "Jan", "Flu", 5),
            rec(2024, "Jan", "Flu", 3),
            rec(2024, "Jan", "Cold", 10),
        ];
        let selected = filter_period(&records, 2024, "Jan");
        assert_eq!(
            top_diseases(selected, TOP_N),
            vec![total("Cold", 10), total("Flu", 8)]
        );
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let records = vec![
            rec(2024, "Jan", "Flu", i64::MAX),
            rec(2024, "Jan", "Flu", 1),
            rec(2024, "Jan", "ISPA", i64::MAX - 1),
            rec(2024, "Jan", "ISPA", i64::MAX),
        ];
        let top = top_diseases(&records, TOP_N);
        assert_eq!(top, vec![total("Flu", i64::MAX), total("ISPA", i64::MAX)]);

        let leaders = vec!["Flu".to_string()];
        let trend = annual_trend(&records, 2024, &leaders);
        assert_eq!(trend[0].points, vec![("Jan".to_string(), i64::MAX)]);

        let ds = Dataset::from_records(records);
        let summary = summarize(&ds, &Period { year: 2024, month: "Jan".to_string() });
        assert_eq!(summary.annual[0].total, i64::MAX);
    }

    #[test]
    fn test_filter_period_matches_both_fields() {
        let records = vec![
            rec(2024, "Jan", "Flu", 1),
            rec(2024, "Feb", "Flu", 2),
            rec(2023, "Jan", "Flu", 3),
            rec(2024, "Jan", "ISPA", 4),
        ];
        let selected = filter_period(&records, 2024, "Jan");
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|r| r.year == 2024 && r.month == "Jan"));
    }

    #[test]
    fn test_top_diseases_truncates_and_sorts() {
        let records: Vec<CaseRecord> = (0..15)
            .map(|i| rec(2024, "Jan", &format!("P{}", i), (i * 7 % 11) as i64))
            .collect();
        let top = top_diseases(&records, TOP_N);
        assert_eq!(top.len(), TOP_N);
        assert!(top.windows(2).all(|w| w[0].total >= w[1].total));
    }

    #[test]
    fn test_top_diseases_ties_keep_first_appearance() {
        let records = vec![
            rec(2024, "Jan", "B", 5),
            rec(2024, "Jan", "A", 5),
            rec(2024, "Jan", "C", 9),
        ];
        let top = top_diseases(&records, TOP_N);
        let names: Vec<&str> = top.iter().map(|t| t.disease.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_annual_trend_only_leaders_in_month_order() {
        let records = vec![
            rec(2024, "Maret", "Flu", 2),
            rec(2024, "Januari", "Flu", 1),
            rec(2024, "Januari", "Flu", 4),
            rec(2024, "Februari", "Diare", 6),
            rec(2024, "Januari", "Cacar", 9),
            rec(2023, "Januari", "Flu", 100),
        ];
        let leaders = vec!["Flu".to_string(), "Diare".to_string()];
        let trend = annual_trend(&records, 2024, &leaders);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].disease, "Flu");
        assert_eq!(
            trend[0].points,
            vec![("Januari".to_string(), 5), ("Maret".to_string(), 2)]
        );
        assert_eq!(trend[1].points, vec![("Februari".to_string(), 6)]);
    }

    #[test]
    fn test_annual_summary_not_truncated() {
        let records: Vec<CaseRecord> = (0..12)
            .map(|i| rec(2024, "Jan", &format!("P{}", i), i as i64))
            .chain(std::iter::once(rec(2023, "Jan", "Old", 99)))
            .collect();
        let summary = annual_summary(&records, 2024);
        assert_eq!(summary.len(), 12);
        assert_eq!(summary[0], total("P11", 11));
    }

    #[test]
    fn test_available_years_and_months() {
        let records = vec![
            rec(2022, "Maret", "Flu", 1),
            rec(2024, "Januari", "Flu", 1),
            rec(2023, "Maret", "Flu", 1),
        ];
        assert_eq!(available_years(&records), vec![2024, 2023, 2022]);
        assert_eq!(available_months(&records), vec!["Januari", "Maret"]);
    }

    #[test]
    fn test_resolve_period_defaults() {
        let ds = Dataset::from_records(vec![
            rec(2023, "Februari", "Flu", 1),
            rec(2024, "Januari", "Flu", 1),
        ]);
        let p = resolve_period(&ds, None, None).unwrap();
        assert_eq!(p.year, 2024);
        assert_eq!(p.month, "Januari");

        let p = resolve_period(&ds, Some(2023), Some("Februari")).unwrap();
        assert_eq!(p.year, 2023);
        assert_eq!(p.month, "Februari");

        assert!(resolve_period(&Dataset::default(), None, None).is_none());
    }

    #[test]
    fn test_summarize_empty_period_warns() {
        let ds = Dataset::from_records(vec![rec(2024, "Januari", "Flu", 1)]);
        let period = Period {
            year: 2024,
            month: "Februari".to_string(),
        };
        let summary = summarize(&ds, &period);
        assert!(summary.top.is_empty());
        assert!(summary.trend.is_empty());
        assert_eq!(summary.warning.as_deref(), Some(EMPTY_PERIOD_WARNING));
    }

    #[test]
    fn test_summarize_full() {
        let ds = Dataset::from_records(vec![
            rec(2024, "Januari", "Flu", 3),
            rec(2024, "Januari", "ISPA", 8),
            rec(2024, "Februari", "Flu", 4),
            rec(2024, "Februari", "Diare", 20),
        ]);
        let period = Period {
            year: 2024,
            month: "Januari".to_string(),
        };
        let summary = summarize(&ds, &period);
        assert!(summary.warning.is_none());
        assert_eq!(summary.top, vec![total("ISPA", 8), total("Flu", 3)]);
        assert_eq!(summary.trend.len(), 2);
        assert_eq!(summary.trend_months, vec!["Januari", "Februari"]);
        assert_eq!(summary.annual[0], total("Diare", 20));
        assert_eq!(summary.annual.len(), 3);
    }
}

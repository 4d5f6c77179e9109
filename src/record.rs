use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One CSV row: the case count reported for a disease in a given month and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub year: i32,
    pub month: String,
    pub disease: String,
    pub case_count: i64,
}

impl CaseRecord {
    pub fn new(year: i32, month: &str, disease: &str, case_count: i64) -> Self {
        Self {
            year,
            month: month.to_string(),
            disease: disease.to_string(),
            case_count,
        }
    }
}

/// The year/month pair selected on the public dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: String,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

// Indonesian and English spellings, lower-case. Index + 1 is the calendar month.
const MONTH_NAMES: [&[&str]; 12] = [
    &["januari", "january", "jan"],
    &["februari", "february", "feb", "peb"],
    &["maret", "march", "mar"],
    &["april", "apr"],
    &["mei", "may"],
    &["juni", "june", "jun"],
    &["juli", "july", "jul"],
    &["agustus", "august", "agu", "agt", "aug"],
    &["september", "sept", "sep"],
    &["oktober", "october", "okt", "oct"],
    &["november", "nopember", "nov", "nop"],
    &["desember", "december", "des", "dec"],
];

/// Calendar position (1..=12) of a month label, if it is recognised.
///
/// Accepts Indonesian and English names and abbreviations in any case, as
/// well as plain month numbers such as `"3"` or `"03"`.
pub fn month_rank(month: &str) -> Option<u32> {
    let key = month.trim().to_lowercase();
    if let Ok(n) = key.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    MONTH_NAMES
        .iter()
        .position(|names| names.contains(&key.as_str()))
        .map(|i| i as u32 + 1)
}

/// Orders month labels by calendar position; unrecognised labels go last,
/// sorted lexicographically among themselves.
pub fn compare_months(a: &str, b: &str) -> Ordering {
    match (month_rank(a), month_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_rank_indonesian_and_english() {
        assert_eq!(month_rank("Januari"), Some(1));
        assert_eq!(month_rank("jan"), Some(1));
        assert_eq!(month_rank("AGUSTUS"), Some(8));
        assert_eq!(month_rank("Aug"), Some(8));
        assert_eq!(month_rank("Desember"), Some(12));
        assert_eq!(month_rank(" Mei "), Some(5));
    }

    #[test]
    fn test_month_rank_numbers() {
        assert_eq!(month_rank("3"), Some(3));
        assert_eq!(month_rank("03"), Some(3));
        assert_eq!(month_rank("13"), None);
        assert_eq!(month_rank("0"), None);
    }

    #[test]
    fn test_month_rank_unknown() {
        assert_eq!(month_rank("Triwulan 1"), None);
        assert_eq!(month_rank(""), None);
    }

    #[test]
    fn test_compare_months_calendar_order() {
        let mut months = vec!["Maret", "Januari", "Desember", "Februari"];
        months.sort_by(|a, b| compare_months(a, b));
        assert_eq!(months, vec!["Januari", "Februari", "Maret", "Desember"]);
    }

    #[test]
    fn test_compare_months_unknown_last() {
        let mut months = vec!["Zeta", "Mei", "Alpha"];
        months.sort_by(|a, b| compare_months(a, b));
        assert_eq!(months, vec!["Mei", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_period_display() {
        let p = Period {
            year: 2024,
            month: "Jan".to_string(),
        };
        assert_eq!(p.to_string(), "Jan 2024");
    }
}

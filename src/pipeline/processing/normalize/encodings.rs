//! Cell-level coercions for the manual-entry encodings used in the workbook
//!
//! Each function interprets one cell. `Err` carries a human readable reason and
//! means the value could not be understood; the caller decides the fallback.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Category, ChangeDirection, TriState, YesNo};
use crate::pipeline::ingestion::excel::excel_serial_to_date;
use crate::pipeline::ingestion::CellValue;

/// Leading number of a free-text cell such as "27.4 kg/m2" or "5 days"
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").expect("static pattern"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%d-%b-%Y"];

const AFFIRMATIVE: &[&str] = &["y", "yes", "x", "true", "1"];
const NEGATIVE: &[&str] = &["n", "no", "false", "0"];

fn matches_any(raw: &str, candidates: &[&str]) -> bool {
    let raw = raw.trim();
    candidates.iter().any(|c| c.eq_ignore_ascii_case(raw))
}

pub fn number(cell: &CellValue) -> Result<Option<f64>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) => Ok(Some(*n)),
        CellValue::Text(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a number", s)),
        CellValue::Bool(_) | CellValue::Date(_) => Err("expected a number".to_string()),
    }
}

/// Non-negative whole number; fractional values are truncated like an integer cast
pub fn count(cell: &CellValue) -> Result<Option<u32>, String> {
    match number(cell)? {
        None => Ok(None),
        Some(n) if n < 0.0 => Err(format!("{} is negative", n)),
        Some(n) if n > f64::from(u32::MAX) => Err(format!("{} is too large", n)),
        Some(n) => Ok(Some(n.trunc() as u32)),
    }
}

pub fn date(cell: &CellValue) -> Result<Option<NaiveDate>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Date(d) => Ok(Some(*d)),
        CellValue::Number(serial) => excel_serial_to_date(*serial)
            .map(Some)
            .ok_or_else(|| format!("{} is not a date serial", serial)),
        CellValue::Text(s) => DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a recognized date", s)),
        CellValue::Bool(_) => Err("expected a date".to_string()),
    }
}

/// "X" mark columns: any mark means Yes, a blank cell means No
pub fn x_flag(cell: &CellValue) -> YesNo {
    match cell {
        CellValue::Empty => YesNo::No,
        CellValue::Bool(b) => {
            if *b {
                YesNo::Yes
            } else {
                YesNo::No
            }
        }
        other => match other.as_text() {
            Some(text) if matches_any(&text, NEGATIVE) => YesNo::No,
            _ => YesNo::Yes,
        },
    }
}

/// Y/N answer with an explicit meaning for a blank cell
pub fn yes_no(cell: &CellValue, blank: Option<YesNo>) -> Result<Option<YesNo>, String> {
    match cell {
        CellValue::Empty => Ok(blank),
        CellValue::Bool(b) => Ok(Some(if *b { YesNo::Yes } else { YesNo::No })),
        other => {
            let text = other.as_text().unwrap_or_default();
            if matches_any(&text, AFFIRMATIVE) {
                Ok(Some(YesNo::Yes))
            } else if matches_any(&text, NEGATIVE) {
                Ok(Some(YesNo::No))
            } else {
                Err(format!("'{}' is not a Y/N answer", text))
            }
        }
    }
}

/// Y/N answer where the question may not apply
pub fn tri_state(cell: &CellValue, blank: TriState) -> Result<Option<TriState>, String> {
    if let Some(text) = cell.as_text() {
        if matches_any(&text, &["n/a", "na", "not applicable"]) {
            return Ok(Some(TriState::NotApplicable));
        }
    }
    Ok(match yes_no(cell, None)? {
        Some(YesNo::Yes) => Some(TriState::Yes),
        Some(YesNo::No) => Some(TriState::No),
        None => Some(blank),
    })
}

/// Direction of change; blank means no change (or not applicable)
pub fn direction(cell: &CellValue) -> Result<Option<ChangeDirection>, String> {
    let Some(text) = cell.as_text() else {
        return Ok(Some(ChangeDirection::NoChange));
    };
    if let Some(d) = ChangeDirection::from_label(&text) {
        return Ok(Some(d));
    }
    if matches_any(&text, &["no change", "none", "n/a", "na", "same"]) {
        return Ok(Some(ChangeDirection::NoChange));
    }
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("less") {
        Ok(Some(ChangeDirection::Less))
    } else if lower.starts_with("more") {
        Ok(Some(ChangeDirection::More))
    } else {
        Err(format!("'{}' is not a direction of change", text))
    }
}

/// Ordered vocabulary; values outside it are rejected
pub fn vocabulary<C: Category>(cell: &CellValue) -> Result<Option<C>, String> {
    match cell.as_text() {
        None => Ok(None),
        Some(text) => C::from_label(&text).map(Some).ok_or_else(|| {
            let allowed: Vec<&str> = C::ALL.iter().map(|c| c.label()).collect();
            format!("'{}' is not one of {:?}", text, allowed)
        }),
    }
}

/// Free-text category, trimmed; blank is missing
pub fn nominal(cell: &CellValue) -> Option<String> {
    cell.as_text().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CodeStatus;
    use rstest::rstest;

    fn text(s: &str) -> CellValue {
        CellValue::from_text(s)
    }

    #[rstest]
    #[case(text("X"), YesNo::Yes)]
    #[case(text("x"), YesNo::Yes)]
    #[case(text("Y"), YesNo::Yes)]
    #[case(CellValue::Empty, YesNo::No)]
    #[case(text("N"), YesNo::No)]
    #[case(text("limited trial"), YesNo::Yes)]
    fn test_x_flag(#[case] cell: CellValue, #[case] expected: YesNo) {
        assert_eq!(x_flag(&cell), expected);
    }

    #[rstest]
    #[case(text("Y"), Some(YesNo::Yes))]
    #[case(text("no"), Some(YesNo::No))]
    #[case(CellValue::Empty, Some(YesNo::Yes))]
    fn test_yes_no_with_blank_default(#[case] cell: CellValue, #[case] expected: Option<YesNo>) {
        assert_eq!(yes_no(&cell, Some(YesNo::Yes)).unwrap(), expected);
    }

    #[test]
    fn test_yes_no_rejects_free_text() {
        assert!(yes_no(&text("maybe"), None).is_err());
    }

    #[rstest]
    #[case(CellValue::Empty, TriState::NotApplicable)]
    #[case(text("N"), TriState::No)]
    #[case(text("Y"), TriState::Yes)]
    #[case(text("N/A"), TriState::NotApplicable)]
    fn test_tri_state(#[case] cell: CellValue, #[case] expected: TriState) {
        assert_eq!(
            tri_state(&cell, TriState::NotApplicable).unwrap(),
            Some(expected)
        );
    }

    #[rstest]
    #[case(CellValue::Empty, ChangeDirection::NoChange)]
    #[case(text("Less"), ChangeDirection::Less)]
    #[case(text("more aggressive"), ChangeDirection::More)]
    #[case(text("no change"), ChangeDirection::NoChange)]
    fn test_direction(#[case] cell: CellValue, #[case] expected: ChangeDirection) {
        assert_eq!(direction(&cell).unwrap(), Some(expected));
    }

    #[test]
    fn test_vocabulary() {
        assert_eq!(
            vocabulary::<CodeStatus>(&text("DNR")).unwrap(),
            Some(CodeStatus::Dnr)
        );
        assert_eq!(vocabulary::<CodeStatus>(&CellValue::Empty).unwrap(), None);
        let err = vocabulary::<CodeStatus>(&text("comfort")).unwrap_err();
        assert!(err.contains("Full code"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number(&text("27.4 kg/m2")).unwrap(), Some(27.4));
        assert_eq!(count(&CellValue::Number(6.0)).unwrap(), Some(6));
        assert!(count(&CellValue::Number(-1.0)).is_err());
        assert!(number(&text("unknown")).is_err());
    }

    #[test]
    fn test_dates() {
        let expected = NaiveDate::from_ymd_opt(2020, 4, 3);
        assert_eq!(date(&text("2020-04-03")).unwrap(), expected);
        assert_eq!(date(&text("4/3/2020")).unwrap(), expected);
        assert_eq!(date(&CellValue::Number(43924.0)).unwrap(), expected);
        assert!(date(&text("April-ish")).is_err());
    }
}

//! Value coercion for report inputs
//!
//! Dates are strict: a value that is not a recognised date fails the report.
//! Currency is lenient: anything that does not parse becomes a missing value.

use crate::error::{DashboardError, Result};
use crate::table::epoch_days_to_date;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;

lazy_static! {
    static ref CURRENCY_NOISE: Regex = Regex::new(r"[,$]").expect("currency pattern is valid");
    static ref FOUR_DIGIT_YEAR: Regex = Regex::new(r"(^|\D)\d{4}(\D|$)").expect("year pattern is valid");
}

// Month-first before year-first; every layout needs a four-digit year.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Strip thousands separators and `$`, then parse. Accounting brackets mark a
/// negative amount: `$(400.00)` is `-400.0`. Blank, a lone dash, or any other
/// residue is `None`.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let stripped = CURRENCY_NOISE.replace_all(raw, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    let (body, sign) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (inner.trim(), -1.0),
        None => (trimmed, 1.0),
    };
    if body.starts_with('-') && sign < 0.0 {
        return None;
    }
    body.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .map(|v| v * sign)
}

/// Parse one date value in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !FOUR_DIGIT_YEAR.is_match(trimmed) {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Convert a measure column to `Float64`, applying currency parsing to text.
///
/// Never fails on content; NaN is treated as missing.
pub fn currency_series(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = if series.dtype().is_numeric() {
        let cast = series.cast(&DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .map(|v| v.filter(|f| !f.is_nan()))
            .collect()
    } else {
        let cast = series.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|v| v.and_then(parse_currency))
            .collect()
    };

    Ok(Series::new(series.name(), values))
}

/// Parse every value of a date column.
///
/// Typed date/datetime columns are taken as is; anything else is read as text.
/// A null or unrecognised value is a hard parse error.
pub fn date_values(series: &Series) -> Result<Vec<NaiveDate>> {
    match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(epoch_days_to_date)
                        .ok_or_else(|| date_error(series.name(), row, "null"))
                })
                .collect()
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(raw) => parse_date(raw).ok_or_else(|| date_error(series.name(), row, raw)),
                    None => Err(date_error(series.name(), row, "null")),
                })
                .collect()
        }
    }
}

fn date_error(column: &str, row: usize, value: &str) -> DashboardError {
    DashboardError::parse(
        "date",
        format!("column '{}' row {}: cannot parse '{}' as a date", column, row, value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency(" $32,370.00 "), Some(32370.0));
        assert_eq!(parse_currency("1,000"), Some(1000.0));
        assert_eq!(parse_currency("-12.5"), Some(-12.5));
        assert_eq!(parse_currency(" $-   "), None);
        assert_eq!(parse_currency("   "), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("n/a"), None);
    }

    #[test]
    fn test_parse_currency_accounting_negatives() {
        assert_eq!(parse_currency("(1,200.00)"), Some(-1200.0));
        assert_eq!(parse_currency(" $(26,655.00)"), Some(-26655.0));
        assert_eq!(parse_currency("$( 400 )"), Some(-400.0));
        assert_eq!(parse_currency("(-5)"), None);
        assert_eq!(parse_currency("(12"), None);
        assert_eq!(parse_currency("()"), None);
    }

    #[test]
    fn test_parse_date_layouts() {
        let jan = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        assert_eq!(parse_date("2022-01-15"), Some(jan));
        assert_eq!(parse_date("2022/01/15"), Some(jan));
        assert_eq!(parse_date("1/15/2022"), Some(jan));
        assert_eq!(parse_date("15-Jan-2022"), Some(jan));
        assert_eq!(parse_date("2022-01-15 10:30:00"), Some(jan));
        assert_eq!(parse_date("2022-01-15T10:30:00"), Some(jan));
        assert_eq!(parse_date("2022-01-15T10:30:00+00:00"), Some(jan));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_date_requires_four_digit_year() {
        assert_eq!(parse_date("10/11/12"), None);
        assert_eq!(parse_date("22-01-15"), None);
        assert_eq!(
            parse_date("10/11/2012"),
            NaiveDate::from_ymd_opt(2012, 10, 11)
        );
        assert_eq!(
            parse_date("2012/10/11"),
            NaiveDate::from_ymd_opt(2012, 10, 11)
        );
    }

    #[test]
    fn test_currency_series_text_and_numeric() {
        let text = Series::new("Sales", &[Some(" $1,200.00 "), Some(" - "), None, Some("oops")]);
        let out = currency_series(&text).unwrap();
        assert_eq!(out.name(), "Sales");
        let values: Vec<Option<f64>> = out.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1200.0), None, None, None]);

        let ints = Series::new("Units", &[1i64, 2, 3]);
        let out = currency_series(&ints).unwrap();
        assert_eq!(out.dtype(), &DataType::Float64);
        assert_eq!(out.f64().unwrap().get(2), Some(3.0));
    }

    #[test]
    fn test_date_values_strict() {
        let ok = Series::new("Date", &["2022-01-01", "2/1/2022"]);
        let dates = date_values(&ok).unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2022, 2, 1).unwrap());

        let bad = Series::new("Date", &["2022-01-01", "soon"]);
        match date_values(&bad) {
            Err(DashboardError::Parse { format, message }) => {
                assert_eq!(format, "date");
                assert!(message.contains("row 1"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let missing = Series::new("Date", &[Some("2022-01-01"), None]);
        assert!(date_values(&missing).is_err());
    }

    #[test]
    fn test_date_values_typed_column() {
        let days = Series::new("Date", &[0i32, 31])
            .cast(&DataType::Date)
            .unwrap();
        let dates = date_values(&days).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(1970, 2, 1).unwrap());
    }
}

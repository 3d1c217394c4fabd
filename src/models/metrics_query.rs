use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Length of the rolling range used when the caller gives no explicit dates.
pub const DEFAULT_RANGE_DAYS: i64 = 10;

/// Query parameters accepted by the metrics endpoint. Dates are optional and
/// fall back to a rolling range ending today.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQueryParams {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub famille: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// The full key a metrics window is scoped to. Any component changing means a
/// different window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsIdentity {
    pub email: String,
    pub famille: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MetricsQueryParams {
    pub fn resolve(self, today: NaiveDate) -> Result<MetricsIdentity, AppError> {
        let email = self.email.trim().to_string();
        let famille = self.famille.trim().to_string();

        if email.is_empty() {
            return Err(AppError::Validation("email is required".to_string()));
        }
        if famille.is_empty() {
            return Err(AppError::Validation("famille is required".to_string()));
        }

        let end_date = self.end_date.unwrap_or(today);
        let start_date = self
            .start_date
            .unwrap_or_else(|| today - Duration::days(DEFAULT_RANGE_DAYS - 1));

        if start_date > end_date {
            return Err(AppError::Validation(format!(
                "startDate {} is after endDate {}",
                start_date, end_date
            )));
        }

        Ok(MetricsIdentity {
            email,
            famille,
            start_date,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params(start: Option<NaiveDate>, end: Option<NaiveDate>) -> MetricsQueryParams {
        MetricsQueryParams {
            email: "bo@samsic.test".to_string(),
            famille: "FTTH".to_string(),
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_default_range_is_ten_days_ending_today() {
        let identity = params(None, None).resolve(date(2024, 3, 10)).unwrap();

        assert_eq!(identity.start_date, date(2024, 3, 1));
        assert_eq!(identity.end_date, date(2024, 3, 10));
    }

    #[test]
    fn test_default_range_crosses_month_boundary() {
        let identity = params(None, None).resolve(date(2024, 3, 4)).unwrap();
        assert_eq!(identity.start_date, date(2024, 2, 24));
    }

    #[test]
    fn test_explicit_range_is_kept() {
        let identity = params(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)))
            .resolve(date(2024, 3, 10))
            .unwrap();

        assert_eq!(identity.start_date, date(2024, 1, 1));
        assert_eq!(identity.end_date, date(2024, 1, 31));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = params(Some(date(2024, 2, 1)), Some(date(2024, 1, 1))).resolve(date(2024, 3, 10));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let mut p = params(None, None);
        p.email = "   ".to_string();
        assert!(matches!(p.resolve(date(2024, 3, 10)), Err(AppError::Validation(_))));

        let mut p = params(None, None);
        p.famille = String::new();
        assert!(matches!(p.resolve(date(2024, 3, 10)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_identity_equality_covers_every_component() {
        let today = date(2024, 3, 10);
        let base = params(None, None).resolve(today).unwrap();

        let mut other = base.clone();
        assert_eq!(base, other);
        other.end_date = date(2024, 3, 11);
        assert_ne!(base, other);

        let mut other = base.clone();
        other.famille = "Radio".to_string();
        assert_ne!(base, other);
    }

    #[test]
    fn test_parses_query_string_names() {
        let p: MetricsQueryParams = serde_json::from_str(
            r#"{"email": "a@b.c", "famille": "all", "startDate": "2024-01-01"}"#,
        )
        .unwrap();

        assert_eq!(p.start_date, Some(date(2024, 1, 1)));
        assert_eq!(p.end_date, None);
    }
}

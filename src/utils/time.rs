use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Date format used on generated legal documents, e.g. `05.03.2026`.
pub fn format_document_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn parse_date(field: &str, raw: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        crate::error::Error::validation(field, format!("'{}' is not a YYYY-MM-DD date", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_dates_are_day_first() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_document_date(date), "05.03.2026");
    }

    #[test]
    fn bad_dates_name_the_field() {
        let err = parse_date("dateFrom", "15/10/2026").unwrap_err();
        assert_eq!(err.code(), "validation_error");
        assert!(parse_date("dateFrom", "2026-10-15").is_ok());
    }
}

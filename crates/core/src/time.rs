#![forbid(unsafe_code)]

//! RFC 3339 timestamp helpers, matching the teacher's `support::time`
//! module rather than hand-rolling date arithmetic.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// Age in whole days between `timestamp` and now; `None` if `timestamp`
/// fails to parse.
pub fn age_in_days(timestamp: &str) -> Option<i64> {
    let parsed = parse_rfc3339(timestamp)?;
    let now = OffsetDateTime::now_utc();
    Some((now - parsed).whole_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_rfc3339_parses_back() {
        let stamp = now_rfc3339();
        assert!(parse_rfc3339(&stamp).is_some());
    }

    #[test]
    fn parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339("not-a-date").is_none());
    }
}

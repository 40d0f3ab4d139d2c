use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use nudge_core::Argument;

use crate::context::CheckContext;
use crate::error::{CheckError, Result};
use crate::registry::{Check, CheckOutcome};

/// `date(timestamp)`: met once the run's `now` reaches the timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCheck;

/// Parse RFC 3339 or one of the naive `YYYY-MM-DD[ HH:MM:SS]` forms (UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CheckError::InvalidTimestamp(input.to_string()))
}

#[async_trait]
impl Check for DateCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let on_date = super::string_arg("date", args, 0)?;
        let due = parse_timestamp(on_date)?;

        if ctx.now >= due {
            Ok(CheckOutcome::Met(format!(
                "We are past the *{on_date}* due date and your TODO is now ready to be addressed."
            )))
        } else {
            Ok(CheckOutcome::Unmet)
        }
    }
}

use chrono::NaiveDate;

/// Parse a raw bank-order date into a midnight timestamp in milliseconds.
///
/// Registered dates arrive in three formats: `DD/MM/YYYY`, `YYYY-MM-DD`
/// and `DD-MM-YYYY`. The separator picks the family; for `-` the first
/// segment's length disambiguates (4 digits means year-first). The date
/// is always built from explicit year/month/day components, never from a
/// free-form parse, so the result cannot shift across timezones.
///
/// Unparseable or empty input yields 0, which sorts to the epoch end of
/// the ledger (first ascending, last descending).
pub fn parse_date_to_time(raw: &str) -> i64 {
    let clean = raw.trim();
    if clean.is_empty() {
        return 0;
    }

    if clean.contains('/') {
        let parts: Vec<&str> = clean.split('/').collect();
        if parts.len() == 3 {
            return midnight_millis(parts[2], parts[1], parts[0]);
        }
    }

    if clean.contains('-') {
        let parts: Vec<&str> = clean.split('-').collect();
        if parts.len() == 3 {
            return if parts[0].len() == 4 {
                midnight_millis(parts[0], parts[1], parts[2])
            } else {
                midnight_millis(parts[2], parts[1], parts[0])
            };
        }
    }

    0
}

fn midnight_millis(year: &str, month: &str, day: &str) -> i64 {
    let (Ok(year), Ok(month), Ok(day)) = (year.parse(), month.parse(), day.parse()) else {
        return 0;
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

const UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Daily cache-refresh fires shortly before lunch service.
pub const REFRESH_HOUR: u32 = 10;
pub const REFRESH_MINUTE: u32 = 50;

/// The cafeteria lives in Seoul, so "today" and the refresh schedule are
/// anchored to UTC+9 no matter where the service runs.
#[must_use]
pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECS).expect("UTC+9 should be a valid offset")
}

#[must_use]
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset())
}

#[must_use]
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Next 10:50 KST strictly after `after`. An `after` of exactly 10:50 rolls
/// over to the next day so a tick never fires twice.
#[must_use]
pub fn next_refresh(after: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let at_refresh = after
        .date_naive()
        .and_hms_opt(REFRESH_HOUR, REFRESH_MINUTE, 0)
        .expect("10:50:00 should be a valid time")
        .and_local_timezone(offset())
        .single()
        .expect("fixed offsets map every wall time exactly once");
    if at_refresh > after {
        at_refresh
    } else {
        at_refresh + chrono::Duration::days(1)
    }
}

/// How long to sleep until the next scheduled refresh.
#[must_use]
pub fn until_next_refresh() -> std::time::Duration {
    let now = now();
    (next_refresh(now) - now).to_std().unwrap_or_default()
}

static WEEKDAYS_KO: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Weekday letter as it appears on the menu board.
#[must_use]
pub fn weekday_ko(date: NaiveDate) -> &'static str {
    WEEKDAYS_KO[date.weekday().num_days_from_monday() as usize]
}

/// Date line used on the page and in push messages, e.g. "2024년 2월 26일 (월)".
#[must_use]
pub fn format_date_ko(date: NaiveDate) -> String {
    format!(
        "{}년 {}월 {}일 ({})",
        date.year(),
        date.month(),
        date.day(),
        weekday_ko(date)
    )
}

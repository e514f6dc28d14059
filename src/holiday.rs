use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;

/// Korean statutory holidays, including substitute days, for the years the
/// service is expected to run. Weekends are handled separately.
const KOREAN_HOLIDAYS: &[(i32, u32, u32)] = &[
    // 2024
    (2024, 1, 1),
    (2024, 2, 9),
    (2024, 2, 10),
    (2024, 2, 11),
    (2024, 2, 12),
    (2024, 3, 1),
    (2024, 4, 10),
    (2024, 5, 5),
    (2024, 5, 6),
    (2024, 5, 15),
    (2024, 6, 6),
    (2024, 8, 15),
    (2024, 9, 16),
    (2024, 9, 17),
    (2024, 9, 18),
    (2024, 10, 1),
    (2024, 10, 3),
    (2024, 10, 9),
    (2024, 12, 25),
    // 2025
    (2025, 1, 1),
    (2025, 1, 27),
    (2025, 1, 28),
    (2025, 1, 29),
    (2025, 1, 30),
    (2025, 3, 1),
    (2025, 3, 3),
    (2025, 5, 5),
    (2025, 5, 6),
    (2025, 6, 3),
    (2025, 6, 6),
    (2025, 8, 15),
    (2025, 10, 3),
    (2025, 10, 5),
    (2025, 10, 6),
    (2025, 10, 7),
    (2025, 10, 8),
    (2025, 10, 9),
    (2025, 12, 25),
    // 2026
    (2026, 1, 1),
    (2026, 2, 16),
    (2026, 2, 17),
    (2026, 2, 18),
    (2026, 3, 1),
    (2026, 3, 2),
    (2026, 5, 5),
    (2026, 5, 24),
    (2026, 5, 25),
    (2026, 6, 3),
    (2026, 6, 6),
    (2026, 8, 15),
    (2026, 8, 17),
    (2026, 9, 24),
    (2026, 9, 25),
    (2026, 9, 26),
    (2026, 9, 28),
    (2026, 10, 3),
    (2026, 10, 5),
    (2026, 10, 9),
    (2026, 12, 25),
];

/// Days the cafeteria is closed for a public holiday.
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Calendar holding the bundled Korean statutory holidays.
    #[must_use]
    pub fn korean() -> Self {
        let dates = KOREAN_HOLIDAYS
            .iter()
            .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date"))
            .collect();
        Self { dates }
    }

    /// Bundled calendar extended with dates from a JSON file containing an
    /// array of `YYYY-MM-DD` strings.
    pub fn korean_with_extra_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let mut calendar = Self::korean();
        let text = std::fs::read_to_string(path)?;
        let extra: Vec<NaiveDate> = serde_json::from_str(&text)?;
        calendar.dates.extend(extra);
        Ok(calendar)
    }

    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

//! Civil-date helpers for the agenda and finance views. All arithmetic is on
//! `NaiveDate`, so DST never enters the picture.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn add_days(date: NaiveDate, delta: i64) -> NaiveDate {
    date + Duration::days(delta)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday of the ISO week `date` falls in.
pub fn start_of_week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The agenda only shows working days. Weekend dates snap to the Monday of
/// their week; weekdays pass through unchanged.
pub fn normalize_to_weekday(date: NaiveDate) -> NaiveDate {
    if is_weekend(date) {
        start_of_week_monday(date)
    } else {
        date
    }
}

/// Monday through Friday of the week `date` falls in.
pub fn week_days_mon_fri(date: NaiveDate) -> [NaiveDate; 5] {
    let monday = start_of_week_monday(date);
    [0, 1, 2, 3, 4].map(|i| add_days(monday, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn start_of_week_is_always_monday() {
        let mut date = d("2025-01-01");
        for _ in 0..400 {
            assert_eq!(start_of_week_monday(date).weekday(), Weekday::Mon);
            date = add_days(date, 1);
        }
    }

    #[test]
    fn weekend_normalizes_to_same_week_monday() {
        // Saturday 2025-03-08 and Sunday 2025-03-09 belong to the week of
        // Monday 2025-03-03.
        assert_eq!(normalize_to_weekday(d("2025-03-08")), d("2025-03-03"));
        assert_eq!(normalize_to_weekday(d("2025-03-09")), d("2025-03-03"));
    }

    #[test]
    fn weekday_passes_through() {
        assert_eq!(normalize_to_weekday(d("2025-03-05")), d("2025-03-05"));
    }

    #[test]
    fn add_days_inverse_under_negation() {
        let date = d("2024-02-29");
        for delta in [-400i64, -30, -1, 0, 1, 30, 400] {
            assert_eq!(add_days(add_days(date, delta), -delta), date);
        }
    }

    #[test]
    fn week_days_are_mon_to_fri() {
        let days = week_days_mon_fri(d("2025-03-06"));
        assert_eq!(days[0], d("2025-03-03"));
        assert_eq!(days[4], d("2025-03-07"));
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[4].weekday(), Weekday::Fri);
    }
}

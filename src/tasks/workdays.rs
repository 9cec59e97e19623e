use chrono::{Datelike, Duration, NaiveDate, Weekday};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The date `days` business days before `now`.
///
/// Walks back one calendar day at a time, counting only Mon-Fri, then shifts
/// the candidate back one extra day for every weekday holiday inside
/// `[candidate, now]`. The holiday pass scans oldest-first against the
/// mutating candidate and does not re-validate the shifted result against
/// weekends or holidays the shift itself reaches; this reproduces the
/// portal's historical arithmetic exactly. `past_work_date_strict` is the
/// corrected variant.
pub fn past_work_date(days: u32, holidays: &[NaiveDate], now: NaiveDate) -> NaiveDate {
    let mut res = now;
    let mut remaining = days;
    while remaining > 0 {
        res -= Duration::days(1);
        if is_weekday(res) {
            remaining -= 1;
        }
    }

    let mut sorted = holidays.to_vec();
    sorted.sort_unstable();
    for holiday in sorted {
        if holiday <= now && holiday >= res && is_weekday(holiday) {
            res -= Duration::days(1);
        }
    }

    res
}

/// Corrected business-day arithmetic: holidays are skipped during the walk
/// itself, so the result always lands on a working day and every non-working
/// day crossed is accounted for. Not wired into the scheduler until product
/// intent on the historical behavior is confirmed.
pub fn past_work_date_strict(days: u32, holidays: &[NaiveDate], now: NaiveDate) -> NaiveDate {
    let holiday_set: std::collections::HashSet<NaiveDate> = holidays.iter().copied().collect();
    let mut res = now;
    let mut remaining = days;
    while remaining > 0 {
        res -= Duration::days(1);
        if is_weekday(res) && !holiday_set.contains(&res) {
            remaining -= 1;
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_days_is_identity() {
        let today = date(2022, 11, 23);
        assert_eq!(past_work_date(0, &[], today), today);
        assert_eq!(past_work_date_strict(0, &[], today), today);
    }

    #[test]
    fn skips_weekends_without_holidays() {
        // Friday to previous Friday is five business days.
        assert_eq!(past_work_date(5, &[], date(2022, 11, 25)), date(2022, 11, 18));
        // Wednesday back three business days crosses one weekend.
        assert_eq!(past_work_date(3, &[], date(2022, 11, 23)), date(2022, 11, 18));
        // Ten business days span two weekends.
        assert_eq!(past_work_date(10, &[], date(2022, 12, 2)), date(2022, 11, 18));
    }

    #[test]
    fn weekday_holiday_shifts_one_extra_day() {
        // Candidate is Mon 2023-01-02; that day being a holiday pushes the
        // literal result onto Sunday. The strict variant keeps walking to the
        // previous working day.
        let holidays = [date(2023, 1, 2)];
        assert_eq!(past_work_date(2, &holidays, date(2023, 1, 4)), date(2023, 1, 1));
        assert_eq!(
            past_work_date_strict(2, &holidays, date(2023, 1, 4)),
            date(2022, 12, 30)
        );
    }

    #[test]
    fn weekend_holidays_are_ignored() {
        // 2022-11-20 is a Sunday; it neither shifts nor counts.
        let holidays = [date(2022, 11, 20)];
        assert_eq!(past_work_date(5, &holidays, date(2022, 11, 25)), date(2022, 11, 18));
    }

    #[test]
    fn holiday_equal_to_now_or_candidate_counts() {
        // Holiday on `now` itself (Friday) still matches the inclusive range.
        let on_now = [date(2022, 11, 25)];
        assert_eq!(past_work_date(5, &on_now, date(2022, 11, 25)), date(2022, 11, 17));

        // Holiday exactly on the candidate matches too.
        let on_candidate = [date(2022, 11, 18)];
        assert_eq!(past_work_date(5, &on_candidate, date(2022, 11, 25)), date(2022, 11, 17));
    }

    #[test]
    fn holiday_reached_only_by_a_shift_is_not_recounted() {
        // The walk puts the candidate on Mon 2023-01-02. Scanning
        // oldest-first, Fri 2022-12-30 is outside [candidate, now] at the
        // time it is examined, so only the Monday holiday shifts the result;
        // the Friday holiday the shift lands next to is never recounted.
        let holidays = [date(2022, 12, 30), date(2023, 1, 2)];
        assert_eq!(past_work_date(2, &holidays, date(2023, 1, 4)), date(2023, 1, 1));

        // The strict variant accounts for both.
        assert_eq!(
            past_work_date_strict(2, &holidays, date(2023, 1, 4)),
            date(2022, 12, 29)
        );
    }
}

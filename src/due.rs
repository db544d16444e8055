use std::fmt::Write;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Weekday};

use crate::error::{GradeError, Result};
use crate::models::{DueDateGroups, DueDateStatus, DueStatus, HasDueDate};

pub const DATE_FORMAT: &str = "%b %d, %Y";
pub const DATE_TIME_FORMAT: &str = "%b %d, %Y %-I:%M %p";
const SHORT_DATE_FORMAT: &str = "%b %d";

fn local_date_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Result<DateTime<Tz>> {
    tz.timestamp_millis_opt(timestamp)
        .single()
        .ok_or(GradeError::InvalidTimestamp(timestamp))
}

fn calendar_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Result<NaiveDate> {
    Ok(local_date_time(timestamp, tz)?.date_naive())
}

/// Whole calendar days from `now`'s date to the due date, in `now`'s zone.
pub fn days_until<Tz: TimeZone>(due_timestamp: i64, now: &DateTime<Tz>) -> Result<i64> {
    let due = calendar_date(due_timestamp, &now.timezone())?;
    Ok((due - now.date_naive()).num_days())
}

pub fn classify(day_offset: i64) -> DueStatus {
    match day_offset {
        i64::MIN..=-1 => DueStatus::Overdue,
        0 => DueStatus::Today,
        1 => DueStatus::Tomorrow,
        2..=7 => DueStatus::ThisWeek,
        _ => DueStatus::Future,
    }
}

/// Urgency bucket of a due timestamp relative to `now`, at calendar-day
/// granularity: anything due on today's date is `Today` whatever the hour.
pub fn due_date_status<Tz: TimeZone>(
    due_timestamp: i64,
    now: &DateTime<Tz>,
) -> Result<DueDateStatus> {
    Ok(classify(days_until(due_timestamp, now)?).into())
}

/// Stable ascending sort by due timestamp; the input is left untouched.
pub fn sort_by_due_date<T: HasDueDate + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|item| item.due_timestamp());
    sorted
}

/// Buckets every item by its status against a single `now`, keeping input
/// order within each bucket. `Future` items land in `later`.
pub fn group_by_due_date<T: HasDueDate + Clone, Tz: TimeZone>(
    items: &[T],
    now: &DateTime<Tz>,
) -> Result<DueDateGroups<T>> {
    let mut groups = DueDateGroups::default();

    for item in items {
        let bucket = match classify(days_until(item.due_timestamp(), now)?) {
            DueStatus::Overdue => &mut groups.overdue,
            DueStatus::Today => &mut groups.today,
            DueStatus::Tomorrow => &mut groups.tomorrow,
            DueStatus::ThisWeek => &mut groups.this_week,
            DueStatus::Future => &mut groups.later,
        };
        bucket.push(item.clone());
    }

    Ok(groups)
}

fn week_start(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(back))
}

/// Display label: Today, Tomorrow, Overdue, the weekday name when the date
/// falls in the current calendar week, or a short date otherwise.
pub fn relative_date<Tz: TimeZone>(
    timestamp: i64,
    now: &DateTime<Tz>,
    first_day: Weekday,
) -> Result<String> {
    let due = local_date_time(timestamp, &now.timezone())?.naive_local();
    let today = now.date_naive();

    let label = match (due.date() - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        offset if offset < 0 => "Overdue".to_string(),
        _ if week_start(due.date(), first_day) == week_start(today, first_day) => {
            due.format("%A").to_string()
        }
        _ => due.format(SHORT_DATE_FORMAT).to_string(),
    };
    Ok(label)
}

/// Items whose due timestamp falls on `date` in `tz`, in input order.
pub fn assignments_on<T: HasDueDate + Clone, Tz: TimeZone>(
    items: &[T],
    date: NaiveDate,
    tz: &Tz,
) -> Result<Vec<T>> {
    let mut matched = Vec::new();
    for item in items {
        if calendar_date(item.due_timestamp(), tz)? == date {
            matched.push(item.clone());
        }
    }
    Ok(matched)
}

/// First and last day of the grid showing `month`: whole weeks starting on
/// `first_day`, padded with the neighbouring months' days.
pub fn month_grid_range(
    year: i32,
    month: u32,
    first_day: Weekday,
) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || GradeError::InvalidMonth { year, month };
    let month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let month_end = next_month - Duration::days(1);

    let grid_start = week_start(month_start, first_day);
    let grid_end = week_start(month_end, first_day) + Duration::days(6);
    Ok((grid_start, grid_end))
}

/// Every grid day of `month` paired with the items due that day.
pub fn month_calendar<T: HasDueDate + Clone, Tz: TimeZone>(
    items: &[T],
    year: i32,
    month: u32,
    tz: &Tz,
    first_day: Weekday,
) -> Result<Vec<(NaiveDate, Vec<T>)>> {
    let (start, end) = month_grid_range(year, month, first_day)?;
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| Ok((day, assignments_on(items, day, tz)?)))
        .collect()
}

/// Renders a timestamp in `tz` with a strftime-style pattern.
pub fn format_date<Tz: TimeZone>(timestamp: i64, tz: &Tz, pattern: &str) -> Result<String> {
    let local = local_date_time(timestamp, tz)?.naive_local();
    let mut out = String::new();
    write!(out, "{}", local.format(pattern))
        .map_err(|_| GradeError::InvalidFormat(pattern.to_string()))?;
    Ok(out)
}

pub fn format_date_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Result<String> {
    format_date(timestamp, tz, DATE_TIME_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    use crate::models::AssignmentDue;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    // Wednesday.
    fn now_at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        utc().with_ymd_and_hms(2026, 3, 11, hour, minute, 0).unwrap()
    }

    fn millis(day: u32, hour: u32, minute: u32) -> i64 {
        utc()
            .with_ymd_and_hms(2026, 3, day, hour, minute, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn assignment(id: i64, due_timestamp: i64) -> AssignmentDue {
        AssignmentDue {
            id,
            course_id: 1,
            title: format!("assignment {id}"),
            due_timestamp,
            status: "pending".to_string(),
            priority: "medium".to_string(),
        }
    }

    #[test]
    fn late_tonight_is_still_today() {
        let status = due_date_status(millis(11, 23, 59), &now_at(0, 1)).unwrap();
        assert_eq!(status.status, DueStatus::Today);
        assert_eq!(status.status.as_str(), "today");
        assert_eq!(status.label, "Due Today");
        assert_eq!(status.color, "warning");
    }

    #[test]
    fn earlier_today_is_not_overdue() {
        let status = due_date_status(millis(11, 8, 0), &now_at(23, 58)).unwrap();
        assert_eq!(status.status, DueStatus::Today);
    }

    #[test]
    fn yesterday_late_is_overdue() {
        let status = due_date_status(millis(10, 23, 59), &now_at(0, 1)).unwrap();
        assert_eq!(status.status, DueStatus::Overdue);
        assert_eq!(status.label, "Overdue");
    }

    #[test]
    fn day_ladder_boundaries() {
        let now = now_at(12, 0);
        assert_eq!(due_date_status(millis(12, 0, 0), &now).unwrap().status, DueStatus::Tomorrow);
        assert_eq!(due_date_status(millis(13, 0, 0), &now).unwrap().status, DueStatus::ThisWeek);
        assert_eq!(due_date_status(millis(18, 23, 59), &now).unwrap().status, DueStatus::ThisWeek);
        let future = due_date_status(millis(19, 0, 0), &now).unwrap();
        assert_eq!(future.status, DueStatus::Future);
        assert_eq!(future.label, "Upcoming");
    }

    #[test]
    fn calendar_follows_now_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2026, 3, 12, 8, 0, 0).unwrap();
        // 23:00 UTC on the 11th is 01:00 on the 12th at +02:00.
        let status = due_date_status(millis(11, 23, 0), &now).unwrap();
        assert_eq!(status.status, DueStatus::Today);

        let same_instant_utc = now.with_timezone(&utc());
        let status = due_date_status(millis(11, 23, 0), &same_instant_utc).unwrap();
        assert_eq!(status.status, DueStatus::Overdue);
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        assert_eq!(
            due_date_status(i64::MAX, &now_at(0, 0)),
            Err(GradeError::InvalidTimestamp(i64::MAX))
        );
    }

    #[test]
    fn sort_is_stable_and_leaves_input_alone() {
        let input = vec![
            assignment(1, millis(14, 0, 0)),
            assignment(2, millis(12, 0, 0)),
            assignment(3, millis(14, 0, 0)),
            assignment(4, millis(9, 0, 0)),
        ];
        let sorted = sort_by_due_date(&input);
        let ids: Vec<i64> = sorted.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
        assert_eq!(input[0].id, 1);
        assert_eq!(sort_by_due_date(&sorted), sorted);
    }

    #[test]
    fn grouping_partitions_every_item() {
        let now = now_at(9, 0);
        let input = vec![
            assignment(1, millis(20, 0, 0)),
            assignment(2, millis(10, 12, 0)),
            assignment(3, millis(11, 23, 0)),
            assignment(4, millis(12, 1, 0)),
            assignment(5, millis(16, 0, 0)),
            assignment(6, millis(1, 0, 0)),
            assignment(7, millis(11, 1, 0)),
        ];
        let groups = group_by_due_date(&input, &now).unwrap();
        let ids = |bucket: &[AssignmentDue]| bucket.iter().map(|a| a.id).collect::<Vec<_>>();

        assert_eq!(ids(&groups.overdue), vec![2, 6]);
        assert_eq!(ids(&groups.today), vec![3, 7]);
        assert_eq!(ids(&groups.tomorrow), vec![4]);
        assert_eq!(ids(&groups.this_week), vec![5]);
        assert_eq!(ids(&groups.later), vec![1]);
        assert_eq!(groups.len(), input.len());
    }

    #[test]
    fn grouping_accepts_borrowed_items() {
        let owned = vec![assignment(1, millis(11, 10, 0))];
        let borrowed: Vec<&AssignmentDue> = owned.iter().collect();
        let groups = group_by_due_date(&borrowed, &now_at(9, 0)).unwrap();
        assert_eq!(groups.today.len(), 1);
    }

    #[test]
    fn relative_labels() {
        let now = now_at(10, 0);
        let label = |ts| relative_date(ts, &now, Weekday::Sun).unwrap();
        assert_eq!(label(millis(11, 22, 0)), "Today");
        assert_eq!(label(millis(12, 9, 0)), "Tomorrow");
        assert_eq!(label(millis(9, 9, 0)), "Overdue");
        assert_eq!(label(millis(13, 9, 0)), "Friday");
        assert_eq!(label(millis(14, 9, 0)), "Saturday");
        assert_eq!(label(millis(15, 9, 0)), "Mar 15");
        assert_eq!(relative_date(millis(15, 9, 0), &now, Weekday::Mon).unwrap(), "Sunday");
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn month_grid_pads_to_whole_weeks() {
        // March 2026 starts on a Sunday and ends on a Tuesday.
        assert_eq!(
            month_grid_range(2026, 3, Weekday::Sun).unwrap(),
            (date(2026, 3, 1), date(2026, 4, 4))
        );
        assert_eq!(
            month_grid_range(2026, 3, Weekday::Mon).unwrap(),
            (date(2026, 2, 23), date(2026, 4, 5))
        );
        assert_eq!(
            month_grid_range(2026, 2, Weekday::Sun).unwrap(),
            (date(2026, 2, 1), date(2026, 2, 28))
        );
        assert_eq!(
            month_grid_range(2026, 12, Weekday::Sun).unwrap(),
            (date(2026, 11, 29), date(2027, 1, 2))
        );
        assert_eq!(
            month_grid_range(2026, 13, Weekday::Sun),
            Err(GradeError::InvalidMonth { year: 2026, month: 13 })
        );
    }

    #[test]
    fn assignments_on_uses_local_calendar_day() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        // 15:30 UTC on the 11th is 00:30 on the 12th in Tokyo.
        let near_midnight = vec![assignment(1, millis(11, 15, 30))];

        assert!(assignments_on(&near_midnight, date(2026, 3, 11), &tokyo).unwrap().is_empty());
        assert_eq!(assignments_on(&near_midnight, date(2026, 3, 12), &tokyo).unwrap().len(), 1);
        assert_eq!(assignments_on(&near_midnight, date(2026, 3, 11), &utc()).unwrap().len(), 1);

        // 04:00 UTC on the 12th is 23:00 on the 11th in New York.
        let late_evening = vec![assignment(2, millis(12, 4, 0))];
        assert_eq!(assignments_on(&late_evening, date(2026, 3, 11), &new_york).unwrap().len(), 1);
        assert!(assignments_on(&late_evening, date(2026, 3, 12), &new_york).unwrap().is_empty());
    }

    #[test]
    fn month_calendar_places_items_on_their_days() {
        let items = vec![
            assignment(1, millis(11, 9, 0)),
            assignment(2, millis(1, 0, 0)),
            assignment(3, millis(11, 20, 0)),
            assignment(4, millis(31, 23, 0)),
        ];
        let days = month_calendar(&items, 2026, 3, &utc(), Weekday::Sun).unwrap();
        assert_eq!(days.len(), 35);
        assert_eq!(days[0].0, date(2026, 3, 1));

        let on = |d: NaiveDate| {
            days.iter()
                .find(|(day, _)| *day == d)
                .map(|(_, items)| items.iter().map(|a| a.id).collect::<Vec<_>>())
                .unwrap()
        };
        assert_eq!(on(date(2026, 3, 11)), vec![1, 3]);
        assert_eq!(on(date(2026, 3, 1)), vec![2]);
        assert_eq!(on(date(2026, 3, 31)), vec![4]);
        assert!(on(date(2026, 4, 4)).is_empty());

        let total: usize = days.iter().map(|(_, items)| items.len()).sum();
        assert_eq!(total, items.len());
    }

    #[test]
    fn formats_dates() {
        let ts = millis(5, 14, 30);
        assert_eq!(format_date(ts, &utc(), DATE_FORMAT).unwrap(), "Mar 05, 2026");
        assert_eq!(format_date_time(ts, &utc()).unwrap(), "Mar 05, 2026 2:30 PM");
        assert!(matches!(
            format_date(ts, &utc(), "%Q"),
            Err(GradeError::InvalidFormat(_))
        ));
    }
}

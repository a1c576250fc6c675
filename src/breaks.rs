use crate::models::{BreakMarker, Day, DayItem, HourRange, Session};
use crate::schedule::WeekSchedule;

/// Consecutive study hours after which a break is suggested.
pub const BREAK_AFTER_HOURS: u32 = 3;

/// Sorts each day by start hour and adds at most one break per day.
pub fn insert_breaks(schedule: &mut WeekSchedule, hours: HourRange) {
    for day in Day::ALL {
        let items = schedule.items_mut(day);
        insert_day_break(items, hours.start);
    }
}

fn insert_day_break(items: &mut Vec<DayItem>, min_hour: u8) {
    // a day that already carries a break was handled by an earlier pass
    if items.iter().any(|i| matches!(i, DayItem::Break(_))) {
        return;
    }

    let mut sessions: Vec<Session> = items
        .iter()
        .filter_map(|item| match item {
            DayItem::Session(s) => Some(s.clone()),
            DayItem::Break(_) => None,
        })
        .collect();
    sessions.sort_by_key(|s| s.start);

    let break_at = find_break(&sessions, min_hour);

    let mut rebuilt: Vec<DayItem> = Vec::with_capacity(sessions.len() + 1);
    for (i, session) in sessions.into_iter().enumerate() {
        if let Some((index, marker)) = break_at {
            if index == i {
                rebuilt.push(DayItem::Break(marker));
            }
        }
        rebuilt.push(DayItem::Session(session));
    }

    *items = rebuilt;
}

// Index of the session that gets a break in front of it.
// A run only earns a break when another session continues it.
fn find_break(sessions: &[Session], min_hour: u8) -> Option<(usize, BreakMarker)> {
    let mut run = 0;
    let mut run_end: Option<u8> = None;

    for (i, session) in sessions.iter().enumerate() {
        run = if run_end == Some(session.start) {
            run + session.duration()
        } else {
            session.duration()
        };
        run_end = Some(session.end);

        if run >= BREAK_AFTER_HOURS {
            if let Some(next) = sessions.get(i + 1) {
                if next.start == session.end {
                    let hour = session.end.saturating_sub(1).max(min_hour);
                    return Some((i + 1, BreakMarker { hour }));
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(subject: &str, start: u8, end: u8) -> Session {
        Session {
            subject: subject.to_string(),
            day: Day::Mon,
            start,
            end,
        }
    }

    fn rendered(schedule: &WeekSchedule, day: Day) -> Vec<String> {
        schedule.items(day).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn break_goes_before_the_session_that_extends_a_long_run() {
        let mut schedule = WeekSchedule::default();
        schedule.push_session(session("Math", 8, 10));
        schedule.push_session(session("Physics", 10, 11));
        schedule.push_session(session("Chem", 11, 13));

        insert_breaks(&mut schedule, HourRange::default());

        assert_eq!(
            rendered(&schedule, Day::Mon),
            vec![
                "Math 08:00-10:00",
                "Physics 10:00-11:00",
                "Break 10:45-11:00",
                "Chem 11:00-13:00",
            ]
        );
    }

    #[test]
    fn gaps_reset_the_run() {
        let mut schedule = WeekSchedule::default();
        schedule.push_session(session("Math", 8, 10));
        schedule.push_session(session("Physics", 11, 13));
        schedule.push_session(session("Chem", 14, 15));

        insert_breaks(&mut schedule, HourRange::default());

        assert!(schedule.items(Day::Mon).iter().all(|i| matches!(i, DayItem::Session(_))));
    }

    #[test]
    fn run_ending_the_day_gets_no_break() {
        let mut schedule = WeekSchedule::default();
        schedule.push_session(session("Math", 8, 10));
        schedule.push_session(session("Physics", 10, 11));

        insert_breaks(&mut schedule, HourRange::default());

        assert_eq!(schedule.items(Day::Mon).len(), 2);
    }

    #[test]
    fn only_the_first_qualifying_run_gets_a_break() {
        let mut schedule = WeekSchedule::default();
        for (start, end) in [(8, 10), (10, 12), (12, 14), (14, 16), (16, 18)] {
            schedule.push_session(session("Math", start, end));
        }

        insert_breaks(&mut schedule, HourRange::default());

        let breaks: Vec<_> = rendered(&schedule, Day::Mon)
            .into_iter()
            .filter(|i| i.starts_with("Break"))
            .collect();
        assert_eq!(breaks, vec!["Break 11:45-12:00"]);
    }

    #[test]
    fn sessions_are_sorted_by_start() {
        let mut schedule = WeekSchedule::default();
        schedule.push_session(session("Chem", 14, 15));
        schedule.push_session(session("Math", 9, 11));

        insert_breaks(&mut schedule, HourRange::default());

        assert_eq!(
            rendered(&schedule, Day::Mon),
            vec!["Math 09:00-11:00", "Chem 14:00-15:00"]
        );
    }

    #[test]
    fn running_twice_adds_nothing_new() {
        let mut schedule = WeekSchedule::default();
        schedule.push_session(session("Math", 8, 10));
        schedule.push_session(session("Physics", 10, 12));
        schedule.push_session(session("Chem", 12, 13));

        insert_breaks(&mut schedule, HourRange::default());
        let once = schedule.clone();
        insert_breaks(&mut schedule, HourRange::default());

        assert_eq!(once, schedule);

        let count = |s: &WeekSchedule| {
            s.items(Day::Mon)
                .iter()
                .filter(|i| matches!(i, DayItem::Break(_)))
                .count()
        };
        assert_eq!(count(&once), 1);
        assert_eq!(count(&schedule), 1);
    }
}

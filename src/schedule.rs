use std::collections::HashSet;

use crate::models::{Day, DayItem, DayPlan, Session, SlotKey};
use crate::priority::NameMatch;

/// Slots consumed so far in one allocation run.
#[derive(Debug, Clone, Default)]
pub struct UsedSlots(HashSet<SlotKey>);

impl UsedSlots {
    pub fn is_free(&self, key: SlotKey) -> bool {
        !self.0.contains(&key)
    }

    // Returns false if the slot was already taken
    pub fn mark(&mut self, key: SlotKey) -> bool {
        self.0.insert(key)
    }
}

/// Items per day, indexed by `Day::index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekSchedule {
    days: [Vec<DayItem>; 7],
}

impl WeekSchedule {
    pub fn items(&self, day: Day) -> &[DayItem] {
        &self.days[day.index()]
    }

    pub fn items_mut(&mut self, day: Day) -> &mut Vec<DayItem> {
        &mut self.days[day.index()]
    }

    pub fn push_session(&mut self, session: Session) {
        self.days[session.day.index()].push(DayItem::Session(session));
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.days.iter().flatten().filter_map(|item| match item {
            DayItem::Session(s) => Some(s),
            DayItem::Break(_) => None,
        })
    }

    pub fn sessions_on(&self, day: Day) -> impl Iterator<Item = &Session> {
        self.items(day).iter().filter_map(|item| match item {
            DayItem::Session(s) => Some(s),
            DayItem::Break(_) => None,
        })
    }

    pub fn has_subject_on(&self, day: Day, subject: &str, matching: NameMatch) -> bool {
        self.sessions_on(day)
            .any(|s| matching.matches(&s.subject, subject))
    }

    pub fn hours_for(&self, subject: &str, matching: NameMatch) -> u32 {
        self.sessions()
            .filter(|s| matching.matches(&s.subject, subject))
            .map(Session::duration)
            .sum()
    }

    pub fn hours_on(&self, day: Day) -> u32 {
        self.sessions_on(day).map(Session::duration).sum()
    }

    pub fn hours_scheduled(&self) -> u32 {
        self.sessions().map(Session::duration).sum()
    }

    /// Always seven entries, Mon..Sun.
    pub fn to_day_plans(&self) -> Vec<DayPlan> {
        Day::ALL
            .into_iter()
            .map(|day| DayPlan {
                day,
                items: self.items(day).iter().map(ToString::to_string).collect(),
            })
            .collect()
    }
}

/// Mutable state threaded through every placement call.
#[derive(Debug, Clone, Default)]
pub struct PlacementState {
    pub used: UsedSlots,
    pub schedule: WeekSchedule,
}

impl PlacementState {
    pub fn place(&mut self, subject: &str, day: Day, start: u8, len: u8) {
        for hour in start..start + len {
            let key = SlotKey::new(day, hour);
            let fresh = self.used.mark(key);
            debug_assert!(fresh, "slot {key} booked twice");
        }
        self.schedule.push_session(Session {
            subject: subject.to_string(),
            day,
            start,
            end: start + len,
        });
    }
}

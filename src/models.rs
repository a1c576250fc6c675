use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Day of the week, in fixed weekly order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    #[serde(alias = "Pzt", alias = "Monday")]
    Mon,
    #[serde(alias = "Sal", alias = "Tuesday")]
    Tue,
    #[serde(alias = "Çar", alias = "Wednesday")]
    Wed,
    #[serde(alias = "Per", alias = "Thursday")]
    Thu,
    #[serde(alias = "Cum", alias = "Friday")]
    Fri,
    #[serde(alias = "Cmt", alias = "Saturday")]
    Sat,
    #[serde(alias = "Paz", alias = "Sunday")]
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = String;

    // Accepts the same labels as the serde aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim() {
            "Mon" | "Pzt" | "Monday" => Day::Mon,
            "Tue" | "Sal" | "Tuesday" => Day::Tue,
            "Wed" | "Çar" | "Wednesday" => Day::Wed,
            "Thu" | "Per" | "Thursday" => Day::Thu,
            "Fri" | "Cum" | "Friday" => Day::Fri,
            "Sat" | "Cmt" | "Saturday" => Day::Sat,
            "Sun" | "Paz" | "Sunday" => Day::Sun,
            other => return Err(format!("unknown day label: {other}")),
        };
        Ok(day)
    }
}

// Preference level of a slot.
// Declared low-to-high so the derived ordering gives High > Medium > Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[serde(alias = "red")]
    Low,
    #[serde(alias = "yellow")]
    Medium,
    #[serde(alias = "green")]
    High,
}

impl Tier {
    /// Order in which placement consumes tiers.
    pub const PLACEMENT_ORDER: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One hour of the week, addressed as `"Mon-9"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotKey {
    pub day: Day,
    pub hour: u8,
}

impl SlotKey {
    pub fn new(day: Day, hour: u8) -> Self {
        Self { day, hour }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.hour)
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, hour) = s
            .rsplit_once('-')
            .ok_or_else(|| format!("invalid slot key: {s}"))?;
        let day: Day = day.parse()?;
        let hour: u8 = hour
            .trim()
            .parse()
            .map_err(|_| format!("invalid hour in slot key: {s}"))?;
        if hour > 23 {
            return Err(format!("hour out of range in slot key: {s}"));
        }
        Ok(SlotKey { day, hour })
    }
}

impl TryFrom<String> for SlotKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

/// Inclusive range of hour slots offered each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start: u8,
    pub end: u8, // last slot, covers end..end+1
}

impl HourRange {
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u8) -> bool {
        (self.start..=self.end).contains(&hour)
    }

    pub fn hours(&self) -> impl Iterator<Item = u8> {
        self.start..=self.end
    }
}

impl Default for HourRange {
    fn default() -> Self {
        Self { start: 8, end: 21 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDemand {
    pub name: String,
    pub hours: u32,
}

impl SubjectDemand {
    pub fn new(name: impl Into<String>, hours: u32) -> Self {
        Self {
            name: name.into(),
            hours,
        }
    }
}

// Placed study block. end - start is 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub day: Day,
    pub start: u8,
    pub end: u8,
}

impl Session {
    pub fn duration(&self) -> u32 {
        u32::from(self.end - self.start)
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotKey> + '_ {
        (self.start..self.end).map(|h| SlotKey::new(self.day, h))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00-{:02}:00", self.subject, self.start, self.end)
    }
}

/// 15-minute break ending on the hour after `hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakMarker {
    pub hour: u8,
}

impl fmt::Display for BreakMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Break {:02}:45-{:02}:00", self.hour, self.hour + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayItem {
    Session(Session),
    Break(BreakMarker),
}

impl fmt::Display for DayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayItem::Session(s) => s.fmt(f),
            DayItem::Break(b) => b.fmt(f),
        }
    }
}

// Allocation input, as posted by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub subjects: Vec<SubjectDemand>,
    #[serde(default)]
    pub available_days: Vec<Day>,
    #[serde(default)]
    pub slot_overrides: HashMap<SlotKey, Tier>,
    #[serde(default)]
    pub day_overrides: HashMap<Day, Tier>,
    #[serde(default)]
    pub weak_subject_names: Vec<String>,
    #[serde(default)]
    pub allow_low_tier: bool,
}

/// One day of a rendered schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: Day,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSchedule {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<FixedOffset>,
    pub schedule: Vec<DayPlan>,
    pub hours_needed: u32,
    pub hours_scheduled: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Db {
    #[serde(default)]
    pub schedules: Vec<SavedSchedule>,
}

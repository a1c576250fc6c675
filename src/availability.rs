/*
Availability resolution.
Turns per-slot / per-day tier overrides into a tiered slot pool.
*/

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Day, HourRange, SlotKey, Tier};

// Default heuristic when nothing is overridden:
//     prime hours           -> High
//     other daytime hours   -> Medium
//     everything else       -> Low
const PRIME_HOURS: [u8; 4] = [9, 10, 14, 15];
const DAYTIME_START: u8 = 8;
const DAYTIME_END: u8 = 17;

pub fn default_tier(hour: u8) -> Tier {
    if PRIME_HOURS.contains(&hour) {
        Tier::High
    } else if (DAYTIME_START..=DAYTIME_END).contains(&hour) {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Slots partitioned by tier, each partition in weekly day order then ascending hour.
#[derive(Debug, Clone, Default)]
pub struct SlotPool {
    tiers: [Vec<SlotKey>; 3],
}

impl SlotPool {
    pub fn slots(&self, tier: Tier) -> &[SlotKey] {
        &self.tiers[tier.index()]
    }

    // Hours of one day inside one tier, ascending
    pub fn hours_on(&self, tier: Tier, day: Day) -> impl Iterator<Item = u8> + '_ {
        self.slots(tier)
            .iter()
            .filter(move |k| k.day == day)
            .map(|k| k.hour)
    }

    pub fn contains(&self, tier: Tier, key: SlotKey) -> bool {
        self.slots(tier).contains(&key)
    }

    pub fn tier_of(&self, key: SlotKey) -> Option<Tier> {
        Tier::PLACEMENT_ORDER
            .into_iter()
            .find(|&t| self.contains(t, key))
    }

    pub fn capacity(&self, tier: Tier) -> u32 {
        self.slots(tier).len() as u32
    }

    pub fn capacity_summary(&self) -> Capacity {
        Capacity {
            high: self.capacity(Tier::High),
            medium: self.capacity(Tier::Medium),
            low: self.capacity(Tier::Low),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl Capacity {
    pub fn within(&self, tiers: &[Tier]) -> u32 {
        tiers
            .iter()
            .map(|t| match t {
                Tier::High => self.high,
                Tier::Medium => self.medium,
                Tier::Low => self.low,
            })
            .sum()
    }
}

/// Tiers handed to placement. Low is only used when explicitly allowed.
pub fn placement_tiers(allow_low: bool) -> Vec<Tier> {
    if allow_low {
        Tier::PLACEMENT_ORDER.to_vec()
    } else {
        vec![Tier::High, Tier::Medium]
    }
}

pub fn resolve_pool(
    available_days: &[Day],
    slot_overrides: &HashMap<SlotKey, Tier>,
    day_overrides: &HashMap<Day, Tier>,
    hours: HourRange,
) -> SlotPool {
    let mut pool = SlotPool::default();

    // weekly order, duplicates collapse
    let days = Day::ALL.into_iter().filter(|d| available_days.contains(d));

    for day in days {
        for hour in hours.hours() {
            let key = SlotKey::new(day, hour);
            let tier = slot_overrides
                .get(&key)
                .or_else(|| day_overrides.get(&day))
                .copied()
                .unwrap_or_else(|| default_tier(hour));
            pool.tiers[tier.index()].push(key);
        }
    }

    pool
}

/*
Weekly study-time allocation.
Module was independently written from HTTP / Axum for testing
*/

use serde::Serialize;
use tracing::{info, warn};

use crate::availability::{Capacity, placement_tiers, resolve_pool};
use crate::breaks::insert_breaks;
use crate::models::{AllocationRequest, Day, HourRange, SubjectDemand, Tier};
use crate::placement::Placer;
use crate::priority::{NameMatch, prioritize};
use crate::schedule::{PlacementState, WeekSchedule};

/// A day with at least this many back-to-back hours gets a warning.
pub const LONG_RUN_HOURS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlannerSettings {
    pub hours: HourRange,
    pub matching: NameMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Allocator,
    Strategy,
}

// Hours a subject is still missing after allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub subject: String,
    pub missing: u32,
}

#[derive(Debug, Clone)]
pub struct Allocation {
    pub schedule: WeekSchedule,
    pub hours_needed: u32,
    pub hours_scheduled: u32,
    pub shortfalls: Vec<Shortfall>,
    pub capacity: Capacity,
    pub warnings: Vec<String>,
    pub source: PlanSource,
}

/// Build the weekly schedule.
///
/// Process:
/// - Resolve the tiered slot pool once
/// - Order subjects (weak first, then by hours)
/// - Per subject: 2-hour blocks, then single hours
/// - Forced placement for whatever is left, then reconcile
/// - Insert breaks over the finished layout
///
/// Never fails: unmet demand is reported through `shortfalls`.
pub fn allocate(request: &AllocationRequest, settings: &PlannerSettings) -> Allocation {
    let pool = resolve_pool(
        &request.available_days,
        &request.slot_overrides,
        &request.day_overrides,
        settings.hours,
    );
    let tiers = placement_tiers(request.allow_low_tier);
    let placer = Placer::new(&pool, &tiers, settings.matching);

    let ordered = prioritize(
        &request.subjects,
        &request.weak_subject_names,
        settings.matching,
    );

    let mut state = PlacementState::default();
    let mut residual: Vec<(&str, u32)> = Vec::new();

    for subject in &ordered {
        let left = placer.place_blocks(&mut state, &subject.name, subject.hours);
        let left = placer.place_singles(&mut state, &subject.name, left);
        if left > 0 {
            residual.push((subject.name.as_str(), left));
        }
    }

    for (name, left) in residual {
        placer.place_forced(&mut state, name, left);
    }

    reconcile(&placer, &mut state, &ordered, settings.matching);

    let mut schedule = state.schedule;
    insert_breaks(&mut schedule, settings.hours);

    summarize(
        schedule,
        &request.subjects,
        pool.capacity_summary(),
        &tiers,
        PlanSource::Allocator,
    )
}

/// Recount each subject from the layout and force-place any shortfall.
pub fn reconcile(
    placer: &Placer<'_>,
    state: &mut PlacementState,
    subjects: &[SubjectDemand],
    matching: NameMatch,
) {
    for subject in subjects {
        let have = state.schedule.hours_for(&subject.name, matching);
        if have < subject.hours {
            placer.place_forced(state, &subject.name, subject.hours - have);
        }
    }
}

/// Totals, per-subject shortfalls and user-facing warnings for a finished schedule.
pub fn summarize(
    schedule: WeekSchedule,
    subjects: &[SubjectDemand],
    capacity: Capacity,
    tiers: &[Tier],
    source: PlanSource,
) -> Allocation {
    let hours_needed = total_hours(subjects);
    let hours_scheduled = schedule.hours_scheduled();

    let shortfalls: Vec<Shortfall> = subjects
        .iter()
        .filter_map(|s| {
            let have = schedule.hours_for(&s.name, NameMatch::Exact);
            (have < s.hours).then(|| Shortfall {
                subject: s.name.clone(),
                missing: s.hours - have,
            })
        })
        .collect();

    let warnings = build_warnings(&schedule, hours_needed, hours_scheduled, capacity, tiers);

    if hours_scheduled < hours_needed {
        warn!(hours_needed, hours_scheduled, "partial schedule");
    }
    info!(
        subjects = subjects.len(),
        hours_needed,
        hours_scheduled,
        ?source,
        "schedule ready"
    );

    Allocation {
        schedule,
        hours_needed,
        hours_scheduled,
        shortfalls,
        capacity,
        warnings,
        source,
    }
}

/// Total requested hours, saturating instead of overflowing.
pub fn total_hours(subjects: &[SubjectDemand]) -> u32 {
    subjects.iter().fold(0u32, |acc, s| acc.saturating_add(s.hours))
}

fn build_warnings(
    schedule: &WeekSchedule,
    hours_needed: u32,
    hours_scheduled: u32,
    capacity: Capacity,
    tiers: &[Tier],
) -> Vec<String> {
    let mut warnings = Vec::new();

    let usable = capacity.within(tiers);
    if hours_needed > usable {
        warnings.push(format!(
            "{hours_needed} hours requested but only {usable} available hours; add more availability"
        ));
    } else if hours_needed > capacity.high {
        warnings.push(format!(
            "high-preference hours are limited to {}; remaining hours use medium slots",
            capacity.high
        ));
    }

    if hours_scheduled < hours_needed {
        warnings.push(format!(
            "only {hours_scheduled}/{hours_needed} hours could be scheduled"
        ));
    }

    let long = long_run_days(schedule);
    if !long.is_empty() {
        let labels: Vec<&str> = long.iter().map(|d| d.label()).collect();
        warnings.push(format!(
            "{LONG_RUN_HOURS}+ consecutive study hours on {}; consider a break",
            labels.join(", ")
        ));
    }

    warnings
}

/// Days whose longest back-to-back stretch reaches `LONG_RUN_HOURS`.
pub fn long_run_days(schedule: &WeekSchedule) -> Vec<Day> {
    Day::ALL
        .into_iter()
        .filter(|&day| {
            let mut spans: Vec<(u8, u8)> =
                schedule.sessions_on(day).map(|s| (s.start, s.end)).collect();
            spans.sort_unstable();

            let mut longest = 0;
            let mut run = 0;
            let mut run_end = None;
            for (start, end) in spans {
                run = if run_end == Some(start) {
                    run + u32::from(end - start)
                } else {
                    u32::from(end - start)
                };
                run_end = Some(end);
                longest = longest.max(run);
            }
            longest >= LONG_RUN_HOURS
        })
        .collect()
}

//! Pluggable scheduling strategies.
//!
//! A strategy (typically a language-model call made elsewhere) proposes a
//! candidate schedule before the deterministic allocator runs. Candidates
//! pass through [`validate_candidate`]; anything that fails, times out or is
//! rejected falls back to [`crate::logic::allocate`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::availability::{SlotPool, placement_tiers, resolve_pool};
use crate::breaks::insert_breaks;
use crate::logic::{Allocation, PlanSource, PlannerSettings, allocate, summarize, total_hours};
use crate::models::{AllocationRequest, Day, SlotKey, Tier};
use crate::priority::NameMatch;
use crate::schedule::{PlacementState, WeekSchedule};

/// Raw schedule as produced by a strategy. Day labels and items are unchecked strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateSchedule {
    pub schedule: Vec<CandidateDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDay {
    pub day: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    #[error("strategy unavailable: {0}")]
    Unavailable(String),

    #[error("strategy failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ScheduleStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn propose(
        &self,
        request: &AllocationRequest,
    ) -> Result<CandidateSchedule, StrategyError>;
}

/// Why a candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateRejection {
    #[error("unknown day label: {0}")]
    UnknownDay(String),

    #[error("malformed item: {0}")]
    MalformedItem(String),

    #[error("session must last 1 or 2 hours: {0}")]
    InvalidDuration(String),

    #[error("session outside the daily hour range: {0}")]
    OutOfRange(String),

    #[error("subject was not requested: {0}")]
    UnknownSubject(String),

    #[error("slot is not available for study: {0}")]
    UnavailableSlot(SlotKey),

    #[error("slot booked twice: {0}")]
    DoubleBooked(SlotKey),

    #[error("{subject} scheduled for {scheduled}h but only {requested}h requested")]
    OverScheduled {
        subject: String,
        scheduled: u32,
        requested: u32,
    },

    #[error("only {scheduled}h of {needed}h covered, {required}h required")]
    InsufficientCoverage {
        scheduled: u32,
        needed: u32,
        required: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedItem {
    Session { subject: String, start: u8, end: u8 },
    Break,
}

/// Parse `"Math 09:00-11:00"` or `"Break 10:45-11:00"`.
pub fn parse_item(item: &str) -> Result<ParsedItem, CandidateRejection> {
    let malformed = || CandidateRejection::MalformedItem(item.to_string());

    let (name, range) = item.trim().rsplit_once(' ').ok_or_else(malformed)?;
    let (from, to) = range.split_once('-').ok_or_else(malformed)?;
    let (start, start_min) = parse_clock(from).ok_or_else(malformed)?;
    let (end, end_min) = parse_clock(to).ok_or_else(malformed)?;

    let name = name.trim();
    if name.eq_ignore_ascii_case("break") {
        return Ok(ParsedItem::Break);
    }
    if name.is_empty() || start_min != 0 || end_min != 0 {
        return Err(malformed());
    }

    Ok(ParsedItem::Session {
        subject: name.to_string(),
        start,
        end,
    })
}

// "HH:MM" -> (hour, minute)
fn parse_clock(s: &str) -> Option<(u8, u8)> {
    let (h, m) = s.trim().split_once(':')?;
    let h: u8 = h.parse().ok()?;
    let m: u8 = m.parse().ok()?;
    if h > 24 || m >= 60 {
        return None;
    }
    Some((h, m))
}

/// Turn a candidate into a schedule, or say why it cannot be used.
///
/// `min_coverage` is the fraction of requested hours the candidate must cover.
pub fn validate_candidate(
    candidate: &CandidateSchedule,
    request: &AllocationRequest,
    pool: &SlotPool,
    tiers: &[Tier],
    settings: &PlannerSettings,
    min_coverage: f64,
) -> Result<WeekSchedule, CandidateRejection> {
    let mut state = PlacementState::default();
    let mut placed: HashMap<&str, u32> = HashMap::new();

    for entry in &candidate.schedule {
        let day: Day = entry
            .day
            .parse()
            .map_err(|_| CandidateRejection::UnknownDay(entry.day.clone()))?;

        for item in &entry.items {
            let (subject, start, end) = match parse_item(item)? {
                ParsedItem::Break => continue,
                ParsedItem::Session {
                    subject,
                    start,
                    end,
                } => (subject, start, end),
            };

            if end <= start || end - start > 2 {
                return Err(CandidateRejection::InvalidDuration(item.clone()));
            }
            if !settings.hours.contains(start) || !settings.hours.contains(end - 1) {
                return Err(CandidateRejection::OutOfRange(item.clone()));
            }

            // an exact name wins over a looser policy match
            let requested = request
                .subjects
                .iter()
                .find(|s| NameMatch::Exact.matches(&s.name, &subject))
                .or_else(|| {
                    request
                        .subjects
                        .iter()
                        .find(|s| settings.matching.matches(&s.name, &subject))
                })
                .ok_or_else(|| CandidateRejection::UnknownSubject(subject.clone()))?;

            for hour in start..end {
                let key = SlotKey::new(day, hour);
                if !pool.tier_of(key).is_some_and(|t| tiers.contains(&t)) {
                    return Err(CandidateRejection::UnavailableSlot(key));
                }
                if !state.used.is_free(key) {
                    return Err(CandidateRejection::DoubleBooked(key));
                }
            }

            state.place(&requested.name, day, start, end - start);
            *placed.entry(requested.name.as_str()).or_default() += u32::from(end - start);
        }
    }

    for subject in &request.subjects {
        let scheduled = placed.get(subject.name.as_str()).copied().unwrap_or(0);
        if scheduled > subject.hours {
            return Err(CandidateRejection::OverScheduled {
                subject: subject.name.clone(),
                scheduled,
                requested: subject.hours,
            });
        }
    }

    let needed = total_hours(&request.subjects);
    let scheduled = state.schedule.hours_scheduled();
    let required = (f64::from(needed) * min_coverage).ceil() as u32;
    if scheduled < required {
        return Err(CandidateRejection::InsufficientCoverage {
            scheduled,
            needed,
            required,
        });
    }

    Ok(state.schedule)
}

/// Limits applied to a strategy before its candidate is trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyGate {
    pub timeout: Duration,
    pub min_coverage: f64,
}

impl Default for StrategyGate {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            min_coverage: 0.8,
        }
    }
}

/// Try the strategy (if any), fall back to the allocator.
pub async fn plan(
    request: &AllocationRequest,
    settings: &PlannerSettings,
    strategy: Option<&dyn ScheduleStrategy>,
    gate: &StrategyGate,
) -> Allocation {
    if let Some(strategy) = strategy {
        if let Some(allocation) = try_strategy(request, settings, strategy, gate).await {
            return allocation;
        }
    }
    allocate(request, settings)
}

async fn try_strategy(
    request: &AllocationRequest,
    settings: &PlannerSettings,
    strategy: &dyn ScheduleStrategy,
    gate: &StrategyGate,
) -> Option<Allocation> {
    let name = strategy.name();

    let candidate = match tokio::time::timeout(gate.timeout, strategy.propose(request)).await {
        Ok(Ok(candidate)) => candidate,
        Ok(Err(err)) => {
            warn!(strategy = name, error = %err, "strategy failed, using allocator");
            return None;
        }
        Err(_) => {
            warn!(strategy = name, timeout = ?gate.timeout, "strategy timed out, using allocator");
            return None;
        }
    };

    let pool = resolve_pool(
        &request.available_days,
        &request.slot_overrides,
        &request.day_overrides,
        settings.hours,
    );
    let tiers = placement_tiers(request.allow_low_tier);

    match validate_candidate(&candidate, request, &pool, &tiers, settings, gate.min_coverage) {
        Ok(mut schedule) => {
            info!(strategy = name, "strategy candidate accepted");
            insert_breaks(&mut schedule, settings.hours);
            Some(summarize(
                schedule,
                &request.subjects,
                pool.capacity_summary(),
                &tiers,
                PlanSource::Strategy,
            ))
        }
        Err(rejection) => {
            warn!(strategy = name, reason = %rejection, "strategy candidate rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourRange, SubjectDemand};

    struct FixedStrategy {
        candidate: CandidateSchedule,
    }

    #[async_trait]
    impl ScheduleStrategy for FixedStrategy {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn propose(
            &self,
            _request: &AllocationRequest,
        ) -> Result<CandidateSchedule, StrategyError> {
            Ok(self.candidate.clone())
        }
    }

    struct FailingStrategy;

    #[async_trait]
    impl ScheduleStrategy for FailingStrategy {
        fn name(&self) -> &str {
            "failing"
        }

        async fn propose(
            &self,
            _request: &AllocationRequest,
        ) -> Result<CandidateSchedule, StrategyError> {
            Err(StrategyError::Unavailable("no api key".into()))
        }
    }

    struct SlowStrategy;

    #[async_trait]
    impl ScheduleStrategy for SlowStrategy {
        fn name(&self) -> &str {
            "slow"
        }

        async fn propose(
            &self,
            _request: &AllocationRequest,
        ) -> Result<CandidateSchedule, StrategyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(CandidateSchedule::default())
        }
    }

    fn request() -> AllocationRequest {
        AllocationRequest {
            subjects: vec![SubjectDemand::new("Math", 3), SubjectDemand::new("Physics", 1)],
            available_days: vec![Day::Mon, Day::Tue],
            ..AllocationRequest::default()
        }
    }

    fn candidate(days: &[(&str, &[&str])]) -> CandidateSchedule {
        CandidateSchedule {
            schedule: days
                .iter()
                .map(|(day, items)| CandidateDay {
                    day: day.to_string(),
                    items: items.iter().map(|i| i.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn check(c: &CandidateSchedule) -> Result<WeekSchedule, CandidateRejection> {
        let req = request();
        let settings = PlannerSettings::default();
        let pool = resolve_pool(
            &req.available_days,
            &req.slot_overrides,
            &req.day_overrides,
            settings.hours,
        );
        validate_candidate(c, &req, &pool, &placement_tiers(false), &settings, 0.8)
    }

    #[test]
    fn parses_sessions_and_breaks() {
        assert_eq!(
            parse_item("Türk Dili 09:00-11:00").unwrap(),
            ParsedItem::Session {
                subject: "Türk Dili".into(),
                start: 9,
                end: 11
            }
        );
        assert_eq!(parse_item("Break 10:45-11:00").unwrap(), ParsedItem::Break);
        assert!(parse_item("Math").is_err());
        assert!(parse_item("Math 9-11").is_err());
        assert!(parse_item("Math 09:30-10:30").is_err());
        assert!(parse_item(" 09:00-10:00").is_err());
    }

    #[test]
    fn accepts_a_valid_candidate() {
        let c = candidate(&[
            ("Pzt", &["Math 09:00-11:00", "Physics 14:00-15:00"]),
            ("Sal", &["Math 09:00-10:00"]),
        ]);
        let schedule = check(&c).unwrap();
        assert_eq!(schedule.hours_scheduled(), 4);
        assert_eq!(schedule.hours_on(Day::Mon), 3);
    }

    #[test]
    fn rejects_unknown_day_labels() {
        let c = candidate(&[("Someday", &["Math 09:00-11:00"])]);
        assert_eq!(check(&c), Err(CandidateRejection::UnknownDay("Someday".into())));
    }

    #[test]
    fn rejects_double_booking() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00", "Physics 10:00-11:00", "Math 14:00-15:00"])]);
        assert_eq!(
            check(&c),
            Err(CandidateRejection::DoubleBooked(SlotKey::new(Day::Mon, 10)))
        );
    }

    #[test]
    fn rejects_unavailable_and_out_of_range_slots() {
        // Wednesday was not offered
        let c = candidate(&[("Wed", &["Math 09:00-11:00"])]);
        assert_eq!(
            check(&c),
            Err(CandidateRejection::UnavailableSlot(SlotKey::new(Day::Wed, 9)))
        );

        // 19:00 is Low by default and Low was not allowed
        let c = candidate(&[("Mon", &["Math 19:00-20:00"])]);
        assert!(matches!(check(&c), Err(CandidateRejection::UnavailableSlot(_))));

        let c = candidate(&[("Mon", &["Math 06:00-07:00"])]);
        assert!(matches!(check(&c), Err(CandidateRejection::OutOfRange(_))));
    }

    #[test]
    fn rejects_long_sessions_and_strangers() {
        let c = candidate(&[("Mon", &["Math 09:00-12:00"])]);
        assert!(matches!(check(&c), Err(CandidateRejection::InvalidDuration(_))));

        let c = candidate(&[("Mon", &["Music 09:00-10:00"])]);
        assert_eq!(check(&c), Err(CandidateRejection::UnknownSubject("Music".into())));
    }

    #[test]
    fn rejects_over_scheduling() {
        let c = candidate(&[
            ("Mon", &["Math 09:00-11:00", "Physics 14:00-15:00"]),
            ("Tue", &["Math 09:00-11:00"]),
        ]);
        assert!(matches!(
            check(&c),
            Err(CandidateRejection::OverScheduled { scheduled: 4, requested: 3, .. })
        ));
    }

    #[test]
    fn rejects_thin_coverage() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00"])]);
        assert_eq!(
            check(&c),
            Err(CandidateRejection::InsufficientCoverage {
                scheduled: 2,
                needed: 4,
                required: 4
            })
        );
    }

    fn check_substring(
        subjects: Vec<SubjectDemand>,
        c: &CandidateSchedule,
    ) -> Result<WeekSchedule, CandidateRejection> {
        let req = AllocationRequest {
            subjects,
            available_days: vec![Day::Mon],
            ..AllocationRequest::default()
        };
        let settings = PlannerSettings {
            matching: NameMatch::Substring,
            ..PlannerSettings::default()
        };
        let pool = resolve_pool(
            &req.available_days,
            &req.slot_overrides,
            &req.day_overrides,
            settings.hours,
        );
        validate_candidate(c, &req, &pool, &placement_tiers(false), &settings, 0.8)
    }

    #[test]
    fn exact_names_win_over_substring_matches() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00", "Mathematics 14:00-16:00"])]);
        let schedule = check_substring(
            vec![SubjectDemand::new("Mathematics", 2), SubjectDemand::new("Math", 2)],
            &c,
        )
        .unwrap();

        assert_eq!(schedule.hours_for("Math", NameMatch::Exact), 2);
        assert_eq!(schedule.hours_for("Mathematics", NameMatch::Exact), 2);
        assert_eq!(
            schedule.to_day_plans()[0].items,
            vec!["Math 09:00-11:00", "Mathematics 14:00-16:00"]
        );
    }

    #[test]
    fn exact_match_is_not_relabelled_as_a_longer_subject() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00"])]);
        let result = check_substring(
            vec![SubjectDemand::new("Mathematics", 2), SubjectDemand::new("Math", 0)],
            &c,
        );

        assert_eq!(
            result,
            Err(CandidateRejection::OverScheduled {
                subject: "Math".into(),
                scheduled: 2,
                requested: 0
            })
        );
    }

    #[test]
    fn loose_match_still_applies_without_an_exact_name() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00"])]);
        let schedule = check_substring(vec![SubjectDemand::new("Mathematics", 2)], &c).unwrap();
        assert_eq!(schedule.to_day_plans()[0].items, vec!["Mathematics 09:00-11:00"]);
    }

    #[test]
    fn coverage_check_survives_huge_demand() {
        let c = candidate(&[("Mon", &["Math 09:00-11:00"])]);
        let result = check_substring(
            vec![
                SubjectDemand::new("Math", 3_000_000_000),
                SubjectDemand::new("Physics", 3_000_000_000),
            ],
            &c,
        );
        assert!(matches!(
            result,
            Err(CandidateRejection::InsufficientCoverage { needed: u32::MAX, .. })
        ));
    }

    #[tokio::test]
    async fn accepted_candidate_is_returned_as_strategy_output() {
        let strategy = FixedStrategy {
            candidate: candidate(&[
                ("Mon", &["Math 09:00-11:00", "Physics 14:00-15:00"]),
                ("Tue", &["Math 10:00-11:00"]),
            ]),
        };
        let result = plan(
            &request(),
            &PlannerSettings::default(),
            Some(&strategy),
            &StrategyGate::default(),
        )
        .await;

        assert_eq!(result.source, PlanSource::Strategy);
        assert_eq!(result.hours_scheduled, 4);
        assert_eq!(result.schedule.to_day_plans()[1].items, vec!["Math 10:00-11:00"]);
    }

    #[tokio::test]
    async fn rejected_candidate_falls_back_to_allocator() {
        let strategy = FixedStrategy {
            candidate: candidate(&[("Mon", &["Math 09:00-11:00"])]),
        };
        let result = plan(
            &request(),
            &PlannerSettings::default(),
            Some(&strategy),
            &StrategyGate::default(),
        )
        .await;

        assert_eq!(result.source, PlanSource::Allocator);
        assert_eq!(result.hours_scheduled, 4);
    }

    #[tokio::test]
    async fn failing_strategy_falls_back_to_allocator() {
        let result = plan(
            &request(),
            &PlannerSettings::default(),
            Some(&FailingStrategy),
            &StrategyGate::default(),
        )
        .await;
        assert_eq!(result.source, PlanSource::Allocator);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_strategy_times_out() {
        let gate = StrategyGate {
            timeout: Duration::from_secs(5),
            ..StrategyGate::default()
        };
        let settings = PlannerSettings {
            hours: HourRange::new(8, 12),
            ..PlannerSettings::default()
        };
        let result = plan(&request(), &settings, Some(&SlowStrategy), &gate).await;
        assert_eq!(result.source, PlanSource::Allocator);
        assert_eq!(result.hours_scheduled, 4);
    }

    #[tokio::test]
    async fn no_strategy_means_allocator() {
        let result = plan(
            &request(),
            &PlannerSettings::default(),
            None,
            &StrategyGate::default(),
        )
        .await;
        assert_eq!(result.source, PlanSource::Allocator);
        assert_eq!(result.hours_needed, 4);
    }
}

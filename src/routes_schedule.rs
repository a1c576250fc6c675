// --------------------------------------------------
// Handles API endpoints that build weekly schedules.
//
// Responsibilities:
// - Validate allocation requests
// - Generate a schedule (strategy first, allocator fallback)
// - Preview the tiered availability pool
// -------------------------------------------------

use std::collections::HashSet;

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::info;

use crate::AppState;
use crate::availability::{Capacity, placement_tiers, resolve_pool};
use crate::error::{AppError, AppResult};
use crate::logic::{PlanSource, Shortfall, total_hours};
use crate::models::{AllocationRequest, DayPlan, SlotKey, Tier};
use crate::strategy;

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub schedule: Vec<DayPlan>,
    pub hours_needed: u32,
    pub hours_scheduled: u32,
    pub shortfalls: Vec<Shortfall>,
    pub capacity: Capacity,
    pub warnings: Vec<String>,
    pub source: PlanSource,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub high: Vec<SlotKey>,
    pub medium: Vec<SlotKey>,
    pub low: Vec<SlotKey>,
    pub capacity: Capacity,
    // hours the allocator may actually use (Low only when allowed)
    pub placement_capacity: u32,
}

// Hours in a week; no request can ask for more
const MAX_WEEKLY_HOURS: u32 = 7 * 24;

fn validate_request(req: &AllocationRequest) -> AppResult<()> {
    if req.subjects.is_empty() {
        return Err(AppError::validation("at least one subject is required"));
    }

    let mut seen = HashSet::new();
    for subject in &req.subjects {
        let key = subject.name.trim().to_lowercase();
        if key.is_empty() {
            return Err(AppError::validation("subject name required"));
        }
        if !seen.insert(key) {
            return Err(AppError::validation(format!(
                "duplicate subject: {}",
                subject.name.trim()
            )));
        }
        if subject.hours > MAX_WEEKLY_HOURS {
            return Err(AppError::validation(format!(
                "{} asks for {} hours, a week has {MAX_WEEKLY_HOURS}",
                subject.name.trim(),
                subject.hours
            )));
        }
    }

    let total = total_hours(&req.subjects);
    if total > MAX_WEEKLY_HOURS {
        return Err(AppError::validation(format!(
            "{total} hours requested in total, a week has {MAX_WEEKLY_HOURS}"
        )));
    }

    if req.available_days.is_empty() {
        return Err(AppError::validation("at least one available day is required"));
    }

    Ok(())
}

// -----------------------------
// POST /api/schedule
// Builds the weekly schedule for the requested subjects
// -----------------------------
pub async fn generate_schedule(
    State(state): State<AppState>,
    Json(req): Json<AllocationRequest>,
) -> AppResult<Json<ScheduleResponse>> {
    validate_request(&req)?;

    info!(
        subjects = req.subjects.len(),
        days = req.available_days.len(),
        "generating schedule"
    );

    let allocation = strategy::plan(
        &req,
        &state.config.planner(),
        state.strategy.as_deref(),
        &state.config.gate(),
    )
    .await;

    Ok(Json(ScheduleResponse {
        schedule: allocation.schedule.to_day_plans(),
        hours_needed: allocation.hours_needed,
        hours_scheduled: allocation.hours_scheduled,
        shortfalls: allocation.shortfalls,
        capacity: allocation.capacity,
        warnings: allocation.warnings,
        source: allocation.source,
    }))
}

// -----------------------------
// POST /api/schedule/availability
// Returns the resolved slot pool without placing anything
// -----------------------------
pub async fn preview_availability(
    State(state): State<AppState>,
    Json(req): Json<AllocationRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    if req.available_days.is_empty() {
        return Err(AppError::validation("at least one available day is required"));
    }

    let pool = resolve_pool(
        &req.available_days,
        &req.slot_overrides,
        &req.day_overrides,
        state.config.hours,
    );
    let capacity = pool.capacity_summary();

    Ok(Json(AvailabilityResponse {
        high: pool.slots(Tier::High).to_vec(),
        medium: pool.slots(Tier::Medium).to_vec(),
        low: pool.slots(Tier::Low).to_vec(),
        capacity,
        placement_capacity: capacity.within(&placement_tiers(req.allow_low_tier)),
    }))
}

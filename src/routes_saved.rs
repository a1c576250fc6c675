// --------------------------------------------------
// Handles API endpoints for saved schedules.
//
// Responsibilities:
// - Save a generated schedule to db.json
// - Fetch the latest / list all saved schedules
// - Delete a saved schedule
// -------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DayPlan, SavedSchedule};
use crate::store;

const DEFAULT_TITLE: &str = "CurrentSchedule";

#[derive(Debug, Deserialize)]
pub struct SaveScheduleInput {
    pub title: Option<String>,
    pub schedule: Vec<DayPlan>,
    #[serde(default)]
    pub hours_needed: u32,
    #[serde(default)]
    pub hours_scheduled: u32,
}

// -----------------------------
// POST /api/schedule/save
// Stores a schedule with a fresh id and timestamp
// -----------------------------
pub async fn save_schedule(
    State(state): State<AppState>,
    Json(input): Json<SaveScheduleInput>,
) -> AppResult<Json<SavedSchedule>> {
    if input.schedule.is_empty() {
        return Err(AppError::validation("schedule required"));
    }

    let title = input
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let saved = SavedSchedule {
        id: Uuid::new_v4(),
        title,
        created_at: chrono::Local::now().fixed_offset(),
        schedule: input.schedule,
        hours_needed: input.hours_needed,
        hours_scheduled: input.hours_scheduled,
    };

    let _guard = state.store_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;
    db.schedules.push(saved.clone());
    store::save_db(&state.config.db_path, &db)?;

    info!(id = %saved.id, title = %saved.title, "schedule saved");
    Ok(Json(saved))
}

// -----------------------------
// GET /api/schedule/save
// Returns the most recently saved schedule
// -----------------------------
pub async fn latest_schedule(State(state): State<AppState>) -> AppResult<Json<SavedSchedule>> {
    let _guard = state.store_lock.lock().await;
    let db = store::load_db(&state.config.db_path)?;

    db.schedules
        .into_iter()
        .max_by_key(|s| s.created_at)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("saved schedule".into()))
}

// -----------------------------
// GET /api/schedule/saved
// Returns all saved schedules, newest first
// -----------------------------
pub async fn list_schedules(State(state): State<AppState>) -> AppResult<Json<Vec<SavedSchedule>>> {
    let _guard = state.store_lock.lock().await;
    let mut schedules = store::load_db(&state.config.db_path)?.schedules;

    // equal timestamps keep the later save on top
    schedules.sort_by_key(|s| s.created_at);
    schedules.reverse();

    Ok(Json(schedules))
}

// -----------------------------
// DELETE /api/schedule/saved/:id
// Removes one saved schedule
// -----------------------------
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::validation("invalid id"))?;

    let _guard = state.store_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    let before = db.schedules.len();
    db.schedules.retain(|s| s.id != id);
    if db.schedules.len() == before {
        return Err(AppError::NotFound("saved schedule".into()));
    }

    store::save_db(&state.config.db_path, &db)?;

    info!(%id, "schedule deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

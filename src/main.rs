// Define data modules
mod availability; // Tiered slot pool (high / medium / low)
mod breaks; // Break markers between long runs
mod config; // Environment-driven settings
mod error; // AppError and its HTTP mapping
mod logic; // Allocation pipeline and summary
mod models; // Data structures (Day, Tier, Session, Db, etc.)
mod placement; // Block, single-hour and forced placers
mod priority; // Subject ordering and name matching
mod routes_saved; // HTTP handlers for saved schedules
mod routes_schedule; // HTTP handlers for generate / availability
mod schedule; // Week layout and used-slot tracking
mod store; // Persistent storage (load/save db.json)
mod strategy; // Pluggable strategies behind a validator gate

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::strategy::ScheduleStrategy;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub strategy: Option<Arc<dyn ScheduleStrategy>>,
    // serializes read-modify-write on db.json
    pub store_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, strategy: Option<Arc<dyn ScheduleStrategy>>) -> Self {
        Self {
            config: Arc::new(config),
            strategy,
            store_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // schedule
        .route("/schedule", post(routes_schedule::generate_schedule))
        .route(
            "/schedule/availability",
            post(routes_schedule::preview_availability),
        )
        // saved schedules
        .route(
            "/schedule/save",
            get(routes_saved::latest_schedule).post(routes_saved::save_schedule),
        )
        .route("/schedule/saved", get(routes_saved::list_schedules))
        .route("/schedule/saved/:id", delete(routes_saved::delete_schedule));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,study_planner=debug")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;

    // No strategy is wired in; every request goes to the allocator
    let app = build_router(AppState::new(config, None));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Print the link to the server
    info!("Server running at http://{}", addr);
    info!("API base:     http://{}/api", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

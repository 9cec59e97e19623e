use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::JwtConfig;
use crate::authz::{AuthzEngine, PolicyTable};
use crate::config::Settings;
use crate::errors::AppError;
use crate::holidays::HolidayCalendar;
use crate::orgs::OrgTree;
use crate::routes::{datasets, orgs, representatives, tasks};
use crate::tasks::{EscalationScheduler, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub tree: OrgTree,
    pub engine: AuthzEngine,
    pub scheduler: EscalationScheduler,
    pub tasks: TaskStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, settings: &Settings) -> Self {
        let tree = OrgTree::new(pool.clone());
        let engine = AuthzEngine::new(pool.clone(), tree.clone(), PolicyTable::portal_defaults());
        let calendar = HolidayCalendar::new(pool.clone());
        let scheduler = EscalationScheduler::new(
            pool.clone(),
            calendar,
            settings.task_raise_1,
            settings.task_raise_2,
        );
        let tasks = TaskStore::new(pool.clone());

        Self {
            pool,
            jwt: Arc::new(jwt),
            tree,
            engine,
            scheduler,
            tasks,
        }
    }
}

pub async fn create_app(pool: SqlitePool, settings: &Settings) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config, settings);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let org_routes = Router::new()
        .route("/", post(orgs::create_root))
        .route("/rebuild", post(orgs::rebuild))
        .route("/:id", get(orgs::get))
        .route("/:id", put(orgs::update))
        .route("/:id/children", get(orgs::children))
        .route("/:id/children", post(orgs::create_child))
        .route("/:id/ancestors", get(orgs::ancestors))
        .route("/:id/move", post(orgs::move_to));

    let representative_routes = Router::new()
        .route("/", post(representatives::invite))
        .route("/:id/confirm", post(representatives::confirm));

    let dataset_routes = Router::new()
        .route("/", post(datasets::create))
        .route("/:id", put(datasets::update))
        .route("/:id", delete(datasets::delete))
        .route("/:id/distributions", post(datasets::add_distribution))
        .route("/:id/structures", post(datasets::add_structure));

    let task_routes = Router::new()
        .route("/", get(tasks::inbox))
        .route("/", post(tasks::create))
        .route("/:id/assign", post(tasks::assign))
        .route("/:id/close", post(tasks::close));

    let router = Router::new()
        .nest("/organizations", org_routes)
        .nest("/representatives", representative_routes)
        .nest("/datasets", dataset_routes)
        .nest("/tasks", task_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

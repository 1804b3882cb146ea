//! In-memory stand-in for the fleet back-office backend.
//!
//! Reproduces the contract the client depends on: repository routes that
//! answer in HAL+JSON, controller routes that answer with plain JSON,
//! bearer-token auth, a PATCH endpoint that can refuse `application/json`,
//! assignment creation with path-encoded keys, and a dedicated report
//! endpoint that can be switched off.

pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};

use crate::store::Store;

pub use crate::store::Caller;

pub type Db = Arc<RwLock<Store>>;

/// How `POST /rapport/create/forAffectation/{id}` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEndpoint {
    Enabled,
    Forbidden,
    Missing,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Prefix of the `_links` hrefs.
    pub base_url: String,
    /// Refuse PATCH bodies sent as `application/json` with 415.
    pub merge_patch_only: bool,
    pub report_endpoint: ReportEndpoint,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            merge_patch_only: true,
            report_endpoint: ReportEndpoint::Forbidden,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub options: Arc<Options>,
}

pub fn app() -> Router {
    app_with(Options::default())
}

pub fn app_with(options: Options) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        options: Arc::new(options),
    };

    let protected = Router::new()
        .route("/auth/test", post(handlers::test_auth))
        .route("/profile", get(handlers::profile))
        // controller routes
        .route("/mission/getall", get(handlers::all_missions))
        .route("/mission/get/{id}", get(handlers::get_mission))
        .route("/mission/create/{agent_id}", post(handlers::create_mission))
        .route("/mission/update/{id}", put(handlers::replace_mission))
        .route("/mission/delete/{id}", delete(handlers::delete_mission))
        .route("/admin/validateMission/{id}", put(handlers::validate_mission))
        .route("/admin/deleteMission/{id}", delete(handlers::delete_mission_as_admin))
        .route("/vehicule/getall", get(handlers::all_vehicules))
        .route("/vehicule/get/{id}", get(handlers::get_vehicule))
        .route("/vehicule/create", post(handlers::create_vehicule))
        .route("/vehicule/update/{id}", put(handlers::replace_vehicule))
        .route("/chef/getAffectations", get(handlers::all_affectations))
        .route("/chef/getAffectation/{id}", get(handlers::get_affectation))
        .route(
            "/chef/createAffectation/{chef}/{chauffeur}/{vehicule}/{mission}",
            post(handlers::create_affectation),
        )
        .route("/chef/deleteAffectation/{id}", delete(handlers::delete_affectation))
        .route("/rapport/create/forAffectation/{id}", post(handlers::create_rapport_for))
        // repository routes
        .route(
            "/{collection}",
            get(handlers::list).post(handlers::create_in_repository),
        )
        .route(
            "/{collection}/{id}",
            get(handlers::get_entity)
                .patch(handlers::patch_entity)
                .delete(handlers::delete_entity),
        )
        .route("/{collection}/search/{finder}", get(handlers::search))
        .route("/{collection}/{id}/{rel}", get(handlers::relation))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/register/{kind}", post(handlers::register))
        .merge(protected)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, options: Options) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

/// Resolve `Authorization: Bearer <token>` to a `Caller` extension, or
/// answer 401.
async fn require_token(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let caller = state.db.read().await.caller(token).ok_or(StatusCode::UNAUTHORIZED)?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

//! plotbench - CSV upload and visualisation service
//!
//! A browser uploads a metadata CSV and an annotation CSV. The service
//! runs a fixed filter-and-chart routine over them, stores the resulting
//! charts per session, and serves them back as PNGs alongside a summary
//! count. Every response is marked uncacheable so the browser always
//! shows the charts from the most recent upload.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use time::Duration;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

pub mod api;
pub mod error;
pub mod figure;
pub mod flash;
pub mod store;
pub mod table;
pub mod viz;

use crate::store::FigureStore;
use crate::viz::{StandardVisualiser, Visualiser};

/// Upload size cap; axum's 2 MB default is tight for CSV files
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// How long an idle session survives
const SESSION_IDLE_MINUTES: i64 = 30;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Per-session figure storage
    pub figures: FigureStore,
    /// The filtering and visualisation collaborator
    pub visualiser: Arc<dyn Visualiser>,
}

impl AppState {
    /// State with the production visualiser
    pub fn new() -> Self {
        Self::with_visualiser(Arc::new(StandardVisualiser))
    }

    /// State with a caller-supplied visualiser
    pub fn with_visualiser(visualiser: Arc<dyn Visualiser>) -> Self {
        Self {
            figures: FigureStore::new(),
            visualiser,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build application router
///
/// Sessions live in an in-process memory store and expire on inactivity.
/// The three cache-defeating headers wrap the whole stack, so redirects,
/// error responses, and images carry them too.
pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(SESSION_IDLE_MINUTES)));

    Router::new()
        .route("/", get(api::home_page).post(api::home_submit))
        .route("/results", get(api::results_page).post(api::results_submit))
        .route("/data", get(api::data_page).post(api::data_submit))
        .route("/plot1.png", get(api::plot1))
        .route("/plot2.png", get(api::plot2))
        .merge(api::health_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(no_cache(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .layer(no_cache(header::PRAGMA, "no-cache"))
        .layer(no_cache(header::EXPIRES, "0"))
}

fn no_cache(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Unknown routes flash a notice and land on the home page instead of a
/// bare 404.
async fn not_found(session: Session) -> Result<Redirect, error::AppError> {
    flash::flash(
        &session,
        "The URL you entered does not exist; you have been redirected to the home page.",
    )
    .await?;
    Ok(Redirect::to("/"))
}

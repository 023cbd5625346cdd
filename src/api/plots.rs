//! Plot image endpoints
//!
//! Each endpoint rasterizes one of the session's stored figures to PNG on
//! demand. A session with no stored figures gets a plain 404, which is
//! what the results page's <img> tags surface as a broken image rather
//! than an error page.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::home::FIGURE_KEY;
use crate::error::AppResult;
use crate::figure::{PLOT_HEIGHT, PLOT_WIDTH};
use crate::AppState;

/// GET /plot1.png
pub async fn plot1(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    serve_plot(&state, &session, 0).await
}

/// GET /plot2.png
pub async fn plot2(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    serve_plot(&state, &session, 1).await
}

async fn serve_plot(state: &AppState, session: &Session, index: usize) -> AppResult<Response> {
    let stored = match session.get::<Uuid>(FIGURE_KEY).await? {
        Some(key) => state.figures.figure(key, index).await,
        None => None,
    };

    let Some(figure) = stored else {
        return Ok((StatusCode::NOT_FOUND, "No plot available").into_response());
    };

    let png = figure.render_png(PLOT_WIDTH, PLOT_HEIGHT)?;
    Ok((StatusCode::OK, [("content-type", "image/png")], png).into_response())
}

//! Results page and the input-format description page

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::home::{FIGURE_KEY, FILTERED_NUM_KEY};
use crate::api::pages;
use crate::error::AppResult;
use crate::flash::take_flashes;
use crate::AppState;

/// Marker value the go-back button carries
const GO_BACK_MARKER: &str = "go_back";

/// Navigation form body
#[derive(Debug, Deserialize)]
pub struct NavForm {
    submit_button: Option<String>,
}

/// GET /results
///
/// Without a stored result the page redirects home instead of rendering
/// empty, so a bookmarked or stale URL lands somewhere useful.
pub async fn results_page(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    let Some(filtered_num) = session.get::<u64>(FILTERED_NUM_KEY).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    Ok(render(&state, &session, filtered_num).await?.into_response())
}

/// POST /results
///
/// The go-back button returns to the home page; anything else re-renders
/// the results, guarded the same way as GET.
pub async fn results_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NavForm>,
) -> AppResult<Response> {
    let Some(filtered_num) = session.get::<u64>(FILTERED_NUM_KEY).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    if form.submit_button.as_deref() == Some(GO_BACK_MARKER) {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(render(&state, &session, filtered_num).await?.into_response())
}

async fn render(
    state: &AppState,
    session: &Session,
    filtered_num: u64,
) -> AppResult<Html<String>> {
    let captions = figure_captions(state, session).await?;
    let flashes = take_flashes(session).await?;
    Ok(Html(pages::render_results(filtered_num, &captions, &flashes)))
}

/// Caption each embedded chart with its stored title; fall back to plain
/// numbering when the figures are gone (expired or evicted).
async fn figure_captions(state: &AppState, session: &Session) -> AppResult<[String; 2]> {
    let mut captions = ["Plot 1".to_string(), "Plot 2".to_string()];
    if let Some(key) = session.get::<Uuid>(FIGURE_KEY).await? {
        for (index, caption) in captions.iter_mut().enumerate() {
            if let Some(figure) = state.figures.figure(key, index).await {
                *caption = figure.title().to_string();
            }
        }
    }
    Ok(captions)
}

/// GET /data
///
/// Static description of what the two input files look like.
pub async fn data_page(session: Session) -> AppResult<Html<String>> {
    let flashes = take_flashes(&session).await?;
    Ok(Html(pages::render_data(&flashes)))
}

/// POST /data
pub async fn data_submit(session: Session, Form(form): Form<NavForm>) -> AppResult<Response> {
    if form.submit_button.as_deref() == Some(GO_BACK_MARKER) {
        return Ok(Redirect::to("/").into_response());
    }
    let flashes = take_flashes(&session).await?;
    Ok(Html(pages::render_data(&flashes)).into_response())
}

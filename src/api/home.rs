//! Home page: the upload form and its submission handler

use axum::extract::{Multipart, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::pages;
use crate::error::AppResult;
use crate::flash::{flash, take_flashes};
use crate::table::Table;
use crate::viz::VisualisationSet;
use crate::AppState;

/// Session key holding the filtered row count
pub const FILTERED_NUM_KEY: &str = "filtered_num";
/// Session key holding this session's figure-store key
pub const FIGURE_KEY: &str = "figure_key";

/// Marker value the upload form's submit button carries
const SUBMIT_MARKER: &str = "submit_data";

/// GET /
///
/// A visit to the home page discards the session's previous result and
/// figures before showing the upload form, so stale charts can never leak
/// into the next run.
pub async fn home_page(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Html<String>> {
    clear_results(&state, &session).await?;
    let flashes = take_flashes(&session).await?;
    Ok(Html(pages::render_home(&flashes)))
}

/// Remove the session's result fields and its figure-store entry
async fn clear_results(state: &AppState, session: &Session) -> AppResult<()> {
    session.remove::<u64>(FILTERED_NUM_KEY).await?;
    if let Some(key) = session.remove::<Uuid>(FIGURE_KEY).await? {
        state.figures.remove(key).await;
        debug!("Cleared figures for session key {}", key);
    }
    Ok(())
}

/// POST /
///
/// Multipart submission carrying the `metadata` and `annotation` files and
/// a `submit_button=submit_data` marker. A valid upload runs the
/// visualisation routine, stores the charts, and redirects to the results
/// page. Invalid input flashes the reason and redirects back here; only
/// transport-level failures surface as error responses.
pub async fn home_submit(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut metadata: Option<Vec<u8>> = None;
    let mut annotation: Option<Vec<u8>> = None;
    let mut submit_button: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("metadata") => metadata = Some(field.bytes().await?.to_vec()),
            Some("annotation") => annotation = Some(field.bytes().await?.to_vec()),
            Some("submit_button") => submit_button = Some(field.text().await?),
            _ => {}
        }
    }

    if submit_button.as_deref() != Some(SUBMIT_MARKER) {
        // Not the upload form. Render the page like a plain visit, but
        // leave any existing result alone.
        let flashes = take_flashes(&session).await?;
        return Ok(Html(pages::render_home(&flashes)).into_response());
    }

    match process_upload(&state, metadata, annotation) {
        Ok(set) => {
            // Replace any figures this session already owned
            if let Some(previous) = session.remove::<Uuid>(FIGURE_KEY).await? {
                state.figures.remove(previous).await;
            }
            let key = Uuid::new_v4();
            state.figures.insert(key, set.figures).await;
            session.insert(FIGURE_KEY, key).await?;
            session.insert(FILTERED_NUM_KEY, set.filtered_count).await?;
            info!("Upload processed: {} annotation rows retained", set.filtered_count);
            Ok(Redirect::to("/results").into_response())
        }
        Err(message) => {
            debug!("Upload rejected: {}", message);
            flash(&session, message).await?;
            Ok(Redirect::to("/").into_response())
        }
    }
}

/// Decode, parse, and visualise one upload. Any failure comes back as the
/// message to flash.
fn process_upload(
    state: &AppState,
    metadata: Option<Vec<u8>>,
    annotation: Option<Vec<u8>>,
) -> Result<VisualisationSet, String> {
    let metadata = metadata.ok_or_else(|| "The metadata file is missing from the submission.".to_string())?;
    let annotation = annotation.ok_or_else(|| "The annotation file is missing from the submission.".to_string())?;

    let metadata = Table::from_bytes("metadata", &metadata).map_err(|e| e.to_string())?;
    let annotation = Table::from_bytes("annotation", &annotation).map_err(|e| e.to_string())?;

    state
        .visualiser
        .make_all_visualisations(&metadata, &annotation)
        .map_err(|e| e.to_string())
}

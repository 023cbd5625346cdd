//! One-shot flash messages
//!
//! Notices queue in the session and drain into the next rendered page.
//! The unknown-route fallback and upload validation both report through
//! here.

use tower_sessions::Session;

use crate::error::AppError;

/// Session key holding pending flash messages
const FLASHES_KEY: &str = "_flashes";

/// Queue a notice for the next rendered page
pub async fn flash(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    let mut pending: Vec<String> = session.get(FLASHES_KEY).await?.unwrap_or_default();
    pending.push(message.into());
    session.insert(FLASHES_KEY, pending).await?;
    Ok(())
}

/// Drain pending notices for rendering; a second call comes back empty
pub async fn take_flashes(session: &Session) -> Result<Vec<String>, AppError> {
    Ok(session
        .remove::<Vec<String>>(FLASHES_KEY)
        .await?
        .unwrap_or_default())
}

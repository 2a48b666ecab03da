//! `/api/threads/{board}`: create, list, report and delete threads.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use domains::{BoardName, ThreadId, ThreadView};

use super::{delete_outcome, AppState, REPORTED};
use crate::dto::{DeleteThreadForm, NewThreadForm, ThreadRef};
use crate::error::ApiError;
use crate::extract::ValidatedInput;

/// POST: starts a thread and redirects to the board page.
pub async fn create_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<NewThreadForm>,
) -> Result<Redirect, ApiError> {
    let board = BoardName::parse(&board)?;
    state
        .service
        .create_thread(&board, &form.text, &form.delete_password)
        .await?;
    Ok(Redirect::to(&format!("/b/{board}/")))
}

/// GET: the most recently bumped threads with their reply previews.
pub async fn list_threads(
    State(state): State<AppState>,
    Path(board): Path<String>,
) -> Result<Json<Vec<ThreadView>>, ApiError> {
    let board = BoardName::parse(&board)?;
    let threads = state.service.list_recent_threads(&board).await?;
    Ok(Json(threads))
}

/// PUT: flags a thread for moderators.
pub async fn report_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<ThreadRef>,
) -> Result<&'static str, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&form.thread_id)?;
    state.service.report_thread(&board, &thread_id).await?;
    Ok(REPORTED)
}

/// DELETE: removes a thread and its replies when the password matches.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<DeleteThreadForm>,
) -> Result<&'static str, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&form.thread_id)?;
    delete_outcome(
        state
            .service
            .delete_thread(&board, &thread_id, &form.delete_password)
            .await,
    )
}

//! `/api/replies/{board}`: create, view, report and redact replies.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use domains::{BoardName, ReplyId, ThreadId, ThreadView};

use super::{delete_outcome, AppState, REPORTED};
use crate::dto::{DeleteReplyForm, NewReplyForm, ReplyRef, ThreadRef};
use crate::error::ApiError;
use crate::extract::ValidatedInput;

/// POST: replies to a thread, bumps it, and redirects to the thread page.
pub async fn create_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<NewReplyForm>,
) -> Result<Redirect, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&form.thread_id)?;
    state
        .service
        .create_reply(&board, &thread_id, &form.text, &form.delete_password)
        .await?;
    Ok(Redirect::to(&format!("/b/{board}/{thread_id}")))
}

/// GET `?thread_id=`: one thread with every reply.
pub async fn show_thread(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(query): ValidatedInput<ThreadRef>,
) -> Result<Json<ThreadView>, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&query.thread_id)?;
    let thread = state.service.get_thread(&board, &thread_id).await?;
    Ok(Json(thread))
}

/// PUT: flags a reply for moderators.
pub async fn report_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<ReplyRef>,
) -> Result<&'static str, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&form.thread_id)?;
    let reply_id = ReplyId::parse(&form.reply_id)?;
    state
        .service
        .report_reply(&board, &thread_id, &reply_id)
        .await?;
    Ok(REPORTED)
}

/// DELETE: replaces the reply text with `[deleted]` when the password matches.
pub async fn delete_reply(
    State(state): State<AppState>,
    Path(board): Path<String>,
    ValidatedInput(form): ValidatedInput<DeleteReplyForm>,
) -> Result<&'static str, ApiError> {
    let board = BoardName::parse(&board)?;
    let thread_id = ThreadId::parse(&form.thread_id)?;
    let reply_id = ReplyId::parse(&form.reply_id)?;
    delete_outcome(
        state
            .service
            .delete_reply(&board, &thread_id, &reply_id, &form.delete_password)
            .await,
    )
}

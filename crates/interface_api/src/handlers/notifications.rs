//! Notification inbox handlers
//!
//! Every route works on the caller's own notifications only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use core_kernel::{Identity, NotificationId};

use crate::dto::notifications::{InboxParams, MarkedReadResponse, NotificationResponse};
use crate::{error::ApiError, AppState};

/// Newest first; `?unread=true` hides acknowledged ones
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<InboxParams>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = state.inbox.notifications(&identity, params.unread).await?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, ApiError> {
    state.inbox.mark_read(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MarkedReadResponse>, ApiError> {
    let marked = state.inbox.mark_all_read(&identity).await?;
    Ok(Json(MarkedReadResponse { marked }))
}

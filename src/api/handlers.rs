use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{BlendResult, UserDataset, Username},
    services::{self, ingest::ImportSummary},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct BlendQuery {
    pub user1: Option<String>,
    pub user2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub summary: ImportSummary,
}

#[derive(Debug, Serialize)]
pub struct BlendResponse {
    pub success: bool,
    pub user1: Username,
    pub user2: Username,
    pub blend: BlendResult,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub username: Username,
    pub data: UserDataset,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Film Blend API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/upload", "/blend", "/users", "/delete", "/user/{username}"],
    }))
}

/// Accepts a multipart upload with a `username` field and a `file` field holding a
/// ZIP export, and replaces that user's stored dataset
pub async fn upload(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut username = None;
    let mut archive = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => username = Some(field.text().await?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_ascii_lowercase();
                if !file_name.ends_with(".zip") {
                    return Err(AppError::InvalidInput(
                        "File must be a ZIP archive".to_string(),
                    ));
                }
                archive = Some(field.bytes().await?.to_vec());
            }
            _ => tracing::debug!(request_id = %request_id, field = %name, "Ignoring form field"),
        }
    }

    let username = Username::parse(username.as_deref().unwrap_or_default())?;
    let archive =
        archive.ok_or_else(|| AppError::InvalidInput("A ZIP file is required".to_string()))?;

    tracing::info!(
        request_id = %request_id,
        user = %username,
        bytes = archive.len(),
        "Processing upload"
    );

    let summary = services::ingest::import_export(state.store.as_ref(), &username, archive).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Data uploaded successfully for user: {}", username),
        summary,
    }))
}

/// Compares two stored users
pub async fn blend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<BlendQuery>,
) -> AppResult<Json<BlendResponse>> {
    let (Some(user1), Some(user2)) = (params.user1, params.user2) else {
        return Err(AppError::InvalidInput(
            "Both usernames are required".to_string(),
        ));
    };
    let user1 = Username::parse(&user1)?;
    let user2 = Username::parse(&user2)?;

    let (data1, data2) = tokio::try_join!(state.store.get(&user1), state.store.get(&user2))?;
    let data1 = data1.ok_or_else(|| AppError::NotFound(format!("User not found: {}", user1)))?;
    let data2 = data2.ok_or_else(|| AppError::NotFound(format!("User not found: {}", user2)))?;

    let result = services::blend(&data1, &data2);

    tracing::info!(
        request_id = %request_id,
        user1 = %user1,
        user2 = %user2,
        common = result.stats.total_common_watched,
        favorites = result.stats.total_common_favorites,
        "Blend computed"
    );

    Ok(Json(BlendResponse {
        success: true,
        user1,
        user2,
        blend: result,
    }))
}

/// Lists every user with a stored dataset
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<UsersResponse>> {
    let users = state.store.list().await?;
    Ok(Json(UsersResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// Deletes a user's stored dataset
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<DeleteQuery>,
) -> AppResult<Json<DeleteResponse>> {
    let username = Username::parse(params.username.as_deref().unwrap_or_default())?;

    if !state.store.delete(&username).await? {
        return Err(AppError::NotFound(format!("User not found: {}", username)));
    }

    tracing::info!(request_id = %request_id, user = %username, "User deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("User deleted: {}", username),
    }))
}

/// Returns a user's stored dataset
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let username = Username::parse(&username)?;
    let data = state
        .store
        .get(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", username)))?;

    Ok(Json(UserResponse {
        success: true,
        username,
        data,
    }))
}

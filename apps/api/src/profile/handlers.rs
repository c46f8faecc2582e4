use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::profile::ProfileEntity;
use crate::state::AppState;

/// GET /api/profile/:user_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.get_profile(&user_id).await?))
}

/// PUT /api/profile/:user_id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.update_profile(&user_id, profile).await?))
}

/// DELETE /api/profile/:user_id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.profiles.delete_profile(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// The collection handlers are generic over the entity type; the router mounts
// one instance per collection (`/jobs`, `/skills`, `/projects`, `/accomplishments`).

/// GET /api/profile/:user_id/{collection}/:id
pub async fn handle_get_entity<E: ProfileEntity>(
    State(state): State<AppState>,
    Path((user_id, entity_id)): Path<(String, String)>,
) -> Result<Json<E>, AppError> {
    Ok(Json(state.profiles.get_entity::<E>(&user_id, &entity_id).await?))
}

/// POST /api/profile/:user_id/{collection}
pub async fn handle_add_entity<E: ProfileEntity>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(entity): Json<E>,
) -> Result<(StatusCode, Json<E>), AppError> {
    let added = state.profiles.add_entity(&user_id, entity).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PUT /api/profile/:user_id/{collection}/:id
pub async fn handle_update_entity<E: ProfileEntity>(
    State(state): State<AppState>,
    Path((user_id, entity_id)): Path<(String, String)>,
    Json(entity): Json<E>,
) -> Result<Json<E>, AppError> {
    let updated = state
        .profiles
        .update_entity(&user_id, &entity_id, entity)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/profile/:user_id/{collection}/:id
pub async fn handle_delete_entity<E: ProfileEntity>(
    State(state): State<AppState>,
    Path((user_id, entity_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .profiles
        .delete_entity::<E>(&user_id, &entity_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

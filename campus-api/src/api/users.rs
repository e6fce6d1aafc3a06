//! Profile and leaderboard handlers

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use campus_common::rank::Rank;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::AppState;

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let user = db::users::find_by_guid(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(json!({
        "guid": user.guid,
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "bio": user.bio,
        "photo_path": user.photo_path,
        "xp": user.xp,
        "rank": Rank::from_xp(user.xp).title(),
        "xp_to_next_rank": Rank::xp_to_next(user.xp),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub photo_path: Option<String>,
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    db::users::update_profile(&state.db, &user.id, req.bio.as_deref(), req.photo_path.as_deref())
        .await?;

    let updated = db::users::find_by_guid(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(json!({
        "guid": updated.guid,
        "username": updated.username,
        "bio": updated.bio,
        "photo_path": updated.photo_path,
    })))
}

/// GET /api/users/leaderboard
pub async fn leaderboard(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let size: i64 = campus_common::db::get_setting_or(&state.db, "leaderboard_size", "20")
        .await?
        .parse()
        .unwrap_or(20);

    let users = db::users::leaderboard(&state.db, size).await?;

    let entries: Vec<Value> = users
        .iter()
        .enumerate()
        .map(|(i, u)| {
            json!({
                "position": i + 1,
                "username": u.username,
                "xp": u.xp,
                "rank": Rank::from_xp(u.xp).title(),
            })
        })
        .collect();

    Ok(Json(json!({ "leaderboard": entries })))
}

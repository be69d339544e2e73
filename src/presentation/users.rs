use crate::domain::user::{SignUpRequest, UpdateUserRequest, UserView};
use crate::presentation::handlers::{ApiError, AppState, MessageResponse};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
struct UserResponse {
    message: String,
    user: UserView,
}

#[instrument(skip(state))]
pub async fn get_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.user_service.list_users().await.map_err(|e| {
        error!(error = %e, "Failed to list users");
        e
    })?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    info!(count = views.len(), "Users listed");
    Ok(HttpResponse::Ok().json(views))
}

#[instrument(skip(state, req))]
pub async fn add_user(
    state: web::Data<AppState>,
    req: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .auth_service
        .register_user(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to add user");
            e
        })?;
    info!(user_id = %user.id, "User added");
    Ok(HttpResponse::Created().json(UserResponse {
        message: "User added successfully".to_string(),
        user: UserView::from(&user),
    }))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.user_service.delete_user(&path).await.map_err(|e| {
        error!(error = %e, "Failed to delete user");
        e
    })?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state, req), fields(user_id = %*path))]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .user_service
        .update_user(&path, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update user");
            e
        })?;
    Ok(HttpResponse::Ok().json(UserResponse {
        message: "User updated successfully".to_string(),
        user: UserView::from(&user),
    }))
}

use crate::application::auth_service::AuthService;
use crate::application::entry_service::EntryService;
use crate::application::user_service::UserService;
use crate::domain::entry::{EntryKind, EntryRequest, EntryView};
use crate::domain::error::DomainError;
use crate::domain::repository::{EntryRepository, UserRepository};
use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: UserService,
    pub income_service: EntryService,
    pub expense_service: EntryService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        incomes: Arc<dyn EntryRepository>,
        expenses: Arc<dyn EntryRepository>,
        jwt_secret: String,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt_secret)),
            user_service: UserService::new(users.clone()),
            income_service: EntryService::new(EntryKind::Income, users.clone(), incomes),
            expense_service: EntryService::new(EntryKind::Expense, users, expenses),
        }
    }

    pub fn entries(&self, kind: EntryKind) -> &EntryService {
        match kind {
            EntryKind::Income => &self.income_service,
            EntryKind::Expense => &self.expense_service,
        }
    }
}

/// Body of every error response.
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },
    #[error("Invalid user ID")]
    InvalidIdentifier,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidIdentifier => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal details are logged, never returned.
        let (message, field) = match self {
            ApiError::Validation { field, message } => (message.clone(), field.clone()),
            ApiError::Internal(detail) => {
                error!(error = %detail, status = %status, "Internal error");
                (INTERNAL_ERROR_MESSAGE.to_string(), None)
            }
            other => (other.to_string(), None),
        };

        if status.is_client_error() {
            warn!(error = %message, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(ErrorResponse { message, field })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(v)) => ApiError::Validation {
                field: Some(v.field.to_string()),
                message: v.message.clone(),
            },
            Some(DomainError::InvalidIdentifier) => ApiError::InvalidIdentifier,
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Conflict(msg)) => ApiError::Conflict(msg.clone()),
            Some(DomainError::InvalidCredentials) => ApiError::InvalidCredentials,
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

/// JSON extractor settings: malformed bodies become `{message}` 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::Deserialize(e) => e.to_string(),
            other => other.to_string(),
        };
        ApiError::Validation {
            field: None,
            message,
        }
        .into()
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[derive(Serialize)]
struct EntryUpdatedResponse {
    message: String,
    entry: EntryView,
}

async fn add_entry(
    state: &AppState,
    kind: EntryKind,
    user_id: &str,
    req: EntryRequest,
) -> Result<HttpResponse, ApiError> {
    info!(user_id = user_id, kind = %kind, "Adding entry");
    let entry = state
        .entries(kind)
        .add_entry(user_id, req)
        .await
        .map_err(|e| {
            error!(user_id = user_id, error = %e, "Failed to add entry");
            e
        })?;
    tracing::Span::current().record("entry_id", entry.id.to_hex().as_str());
    Ok(HttpResponse::Created().json(MessageResponse::new(format!("{} added successfully", kind))))
}

async fn list_entries(
    state: &AppState,
    kind: EntryKind,
    user_id: &str,
) -> Result<HttpResponse, ApiError> {
    let entries = state.entries(kind).list_entries(user_id).await?;
    let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();
    info!(user_id = user_id, kind = %kind, count = views.len(), "Entries retrieved");
    Ok(HttpResponse::Ok().json(views))
}

async fn delete_entry(
    state: &AppState,
    kind: EntryKind,
    user_id: &str,
    entry_id: &str,
) -> Result<HttpResponse, ApiError> {
    state
        .entries(kind)
        .delete_entry(user_id, entry_id)
        .await
        .map_err(|e| {
            error!(user_id = user_id, entry_id = entry_id, error = %e, "Failed to delete entry");
            e
        })?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("{} deleted successfully", kind))))
}

async fn update_entry(
    state: &AppState,
    kind: EntryKind,
    user_id: &str,
    entry_id: &str,
    req: EntryRequest,
) -> Result<HttpResponse, ApiError> {
    let entry = state
        .entries(kind)
        .update_entry(user_id, entry_id, req)
        .await
        .map_err(|e| {
            error!(user_id = user_id, entry_id = entry_id, error = %e, "Failed to update entry");
            e
        })?;
    Ok(HttpResponse::Ok().json(EntryUpdatedResponse {
        message: format!("{} updated successfully", kind),
        entry: EntryView::from(&entry),
    }))
}

#[instrument(skip(state, req), fields(user_id = %*path, entry_id))]
pub async fn add_expense(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<EntryRequest>,
) -> Result<HttpResponse, ApiError> {
    add_entry(&state, EntryKind::Expense, &path, req.into_inner()).await
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn get_expenses(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    list_entries(&state, EntryKind::Expense, &path).await
}

#[instrument(skip(state))]
pub async fn delete_expense(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (user_id, expense_id) = path.into_inner();
    delete_entry(&state, EntryKind::Expense, &user_id, &expense_id).await
}

#[instrument(skip(state, req))]
pub async fn update_expense(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<EntryRequest>,
) -> Result<HttpResponse, ApiError> {
    let (user_id, expense_id) = path.into_inner();
    update_entry(
        &state,
        EntryKind::Expense,
        &user_id,
        &expense_id,
        req.into_inner(),
    )
    .await
}

#[instrument(skip(state, req), fields(user_id = %*path, entry_id))]
pub async fn add_income(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<EntryRequest>,
) -> Result<HttpResponse, ApiError> {
    add_entry(&state, EntryKind::Income, &path, req.into_inner()).await
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn get_incomes(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    list_entries(&state, EntryKind::Income, &path).await
}

#[instrument(skip(state))]
pub async fn delete_income(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (user_id, income_id) = path.into_inner();
    delete_entry(&state, EntryKind::Income, &user_id, &income_id).await
}

#[instrument(skip(state, req))]
pub async fn update_income(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<EntryRequest>,
) -> Result<HttpResponse, ApiError> {
    let (user_id, income_id) = path.into_inner();
    update_entry(
        &state,
        EntryKind::Income,
        &user_id,
        &income_id,
        req.into_inner(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases: Vec<(DomainError, StatusCode)> = vec![
            (
                ValidationError::new("amount", "Amount must be greater than 0").into(),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::InvalidIdentifier, StatusCode::BAD_REQUEST),
            (
                DomainError::Conflict("Username already exists".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (
                DomainError::NotFound("User not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::Unauthorized("Invalid or expired token".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                DomainError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (domain, expected) in cases {
            let api = ApiError::from(anyhow::Error::from(domain));
            assert_eq!(api.status_code(), expected, "{api:?}");
        }
    }

    #[test]
    fn test_unknown_errors_become_internal() {
        let api = ApiError::from(anyhow::anyhow!("connection reset"));
        assert!(matches!(api, ApiError::Internal(_)));
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_internal_error_body_hides_details() {
        let response = ApiError::Internal("secret driver detail".to_string()).error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_validation_error_body_names_field() {
        let api = ApiError::from(anyhow::Error::from(DomainError::from(ValidationError::new(
            "tag",
            "Invalid tag",
        ))));
        let body = actix_web::body::to_bytes(api.error_response().into_body())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Invalid tag");
        assert_eq!(json["field"], "tag");
    }
}

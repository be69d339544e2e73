use crate::application::auth_service::Session;
use crate::domain::user::{SignInRequest, SignUpRequest, User, UserView};
use crate::infrastructure::security::TOKEN_TTL_SECONDS;
use crate::presentation::handlers::{ApiError, AppState, MessageResponse};
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::{error, info, instrument};

pub const SESSION_COOKIE: &str = "token";

#[derive(Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub user: UserView,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(TOKEN_TTL_SECONDS))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

fn session_response(session: Session, message: &str) -> HttpResponse {
    HttpResponse::Created()
        .cookie(session_cookie(session.token))
        .json(SessionResponse {
            message: message.to_string(),
            user: UserView::from(&session.user),
        })
}

#[instrument(skip(state, req))]
pub async fn sign_up(
    state: web::Data<AppState>,
    req: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(username = ?req.username, "Sign-up request received");

    let session = state
        .auth_service
        .sign_up(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign up");
            ApiError::from(e)
        })?;

    info!(user_id = %session.user.id, "User signed up");
    Ok(session_response(session, "User created successfully"))
}

#[instrument(skip(state, req))]
pub async fn sign_in(
    state: web::Data<AppState>,
    req: web::Json<SignInRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(username = ?req.username, "Sign-in request received");

    let session = state
        .auth_service
        .sign_in(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign in");
            ApiError::from(e)
        })?;

    info!(user_id = %session.user.id, "User signed in");
    Ok(session_response(session, "Signed in successfully"))
}

/// Stateless: there is no server-side session to revoke.
#[instrument]
pub async fn log_out() -> HttpResponse {
    info!("Log-out request received");
    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(MessageResponse::new("Logged out successfully"))
}

/// The user named by a valid `token` cookie.
pub struct SessionUser(pub User);

impl FromRequest for SessionUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                ApiError::Internal("Application state is not configured".to_string())
            })?;
            let token = token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;
            let user = state.auth_service.authenticate(&token).await?;
            Ok(SessionUser(user))
        })
    }
}

#[instrument(skip(session))]
pub async fn me(session: SessionUser) -> HttpResponse {
    let SessionUser(user) = session;
    info!(user_id = %user.id, "Session user retrieved");
    HttpResponse::Ok().json(UserView::from(&user))
}

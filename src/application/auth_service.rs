use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{SignInRequest, SignUpRequest, User};
use crate::domain::validation::{validate_sign_in, validate_sign_up, validate_user_id};
use crate::infrastructure::security::{
    SessionClaims, generate_token, hash_password, validate_token, verify_password,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
        }
    }

    /// Validates, checks uniqueness, hashes and stores a new user.
    /// Shared by sign-up and the admin add-user route.
    #[instrument(skip(self, req))]
    pub async fn register_user(&self, req: SignUpRequest) -> Result<User> {
        trace!("Starting user registration");
        let new_user = validate_sign_up(req).map_err(DomainError::from)?;

        if self
            .user_repository
            .find_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            warn!(username = %new_user.username, "Username already exists");
            return Err(DomainError::Conflict("Username already exists".to_string()).into());
        }
        if self
            .user_repository
            .find_user_by_email(&new_user.email)
            .await?
            .is_some()
        {
            warn!(email = %new_user.email, "Email already exists");
            return Err(DomainError::Conflict("Email already exists".to_string()).into());
        }

        let password_hash = hash_password(&new_user.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = User::new(new_user, password_hash);
        debug!(user_id = %user.id, username = %user.username, "Saving user to repository");
        self.user_repository.insert_user(user.clone()).await?;

        info!(user_id = %user.id, username = %user.username, "User registered successfully");
        Ok(user)
    }

    #[instrument(skip(self, req))]
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<Session> {
        let user = self.register_user(req).await?;
        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    #[instrument(skip(self, req))]
    pub async fn sign_in(&self, req: SignInRequest) -> Result<Session> {
        trace!("Starting sign-in");
        let credentials = validate_sign_in(req).map_err(DomainError::from)?;

        let user = self
            .user_repository
            .find_user_by_username(&credentials.username)
            .await?
            .ok_or_else(|| {
                warn!(username = %credentials.username, "Unknown username during sign-in");
                DomainError::InvalidCredentials
            })?;

        let is_valid = verify_password(&credentials.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during sign-in");
            return Err(DomainError::InvalidCredentials.into());
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, username = %user.username, "Sign-in successful");
        Ok(Session { user, token })
    }

    /// Decodes a session token and loads the user it names.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.decode_token(token)?;
        let user_id = validate_user_id(&claims.id)
            .map_err(|_| DomainError::Unauthorized("Invalid token".to_string()))?;

        self.user_repository
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()).into())
    }

    pub fn decode_token(&self, token: &str) -> Result<SessionClaims> {
        validate_token(token, &self.jwt_secret).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            DomainError::Unauthorized("Invalid or expired token".to_string()).into()
        })
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        generate_token(&user.id.to_hex(), &user.username, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e)).into()
        })
    }
}

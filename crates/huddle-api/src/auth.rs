use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use huddle_chat::Chat;
use huddle_db::{Database, InsertOutcome, UserRow, timestamp_now};
use huddle_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::validation;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub chat: Chat,
    pub jwt_secret: String,
    /// Lifetime of issued access tokens, in seconds.
    pub token_ttl_secs: i64,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: String, token_ttl_secs: i64) -> AppState {
        Arc::new(Self {
            chat: Chat::new(db.clone()),
            db,
            jwt_secret,
            token_ttl_secs,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::registration(&req)?;

    let user = blocking(move || {
        // hashing is CPU-bound, so it runs here with the insert
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            email: req.email.trim().to_string(),
            display_name: req.display_name.trim().to_string(),
            password: password_hash,
            created_at: timestamp_now(),
        };

        match state.db.create_user(&row)? {
            InsertOutcome::Inserted => Ok(row.into_user()),
            InsertOutcome::Duplicate => Err(ApiError::Conflict("Email already registered".into())),
            InsertOutcome::MissingParent => {
                Err(anyhow::anyhow!("users table has no parent constraint").into())
            }
        }
    })
    .await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let ttl = state.token_ttl_secs;
    let secret = state.jwt_secret.clone();

    let user = blocking(move || {
        let row = state
            .db
            .get_user_by_email(req.email.trim())?
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

        let parsed_hash = PasswordHash::new(&row.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {}", e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

        Ok(row.into_user())
    })
    .await?;

    let access_token = create_token(&secret, &user.id, &user.email, ttl)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ttl,
        user,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user = blocking(move || {
        state
            .db
            .get_user_by_id(&claims.sub)?
            .map(UserRow::into_user)
            .ok_or_else(|| ApiError::NotFound(format!("User not found with id: {}", claims.sub)))
    })
    .await?;

    Ok(Json(user))
}

pub(crate) fn create_token(
    secret: &str,
    user_id: &str,
    email: &str,
    ttl_secs: i64,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthData, AuthResponse, LoginRequest, MeData, MeResponse, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::is_unique_violation,
        repo_types::{User, UserCredentials},
        services::{evaluate_duplicate, validate_login, validate_register, DuplicateOutcome},
    },
    error::{ApiError, ApiResult, ACCOUNT_EXISTS_LOGIN, ACCOUNT_EXISTS_WRONG_PASSWORD},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_register(&mut payload)?;

    let existing = UserCredentials::find_by_email(&state.db, &payload.email).await?;
    let Some(existing) = existing else {
        return create_account(&state, payload).await;
    };

    match evaluate_duplicate(&existing, &payload)? {
        DuplicateOutcome::MissingPassword => {
            warn!(email = %payload.email, "duplicate registration without password");
            Err(ApiError::AccountExists(ACCOUNT_EXISTS_LOGIN))
        }
        DuplicateOutcome::WrongPassword => {
            warn!(email = %payload.email, "duplicate registration with wrong password");
            Err(ApiError::AccountExists(ACCOUNT_EXISTS_WRONG_PASSWORD))
        }
        DuplicateOutcome::Recognized(backfill) => {
            let user = if backfill.is_empty() {
                existing.user
            } else {
                User::backfill_contact(&state.db, existing.user.id, &backfill).await?
            };

            let token = JwtKeys::from_ref(&state).sign(user.id)?;
            info!(user_id = %user.id, "existing patient recognized on register");
            Ok((
                StatusCode::OK,
                Json(AuthResponse {
                    success: true,
                    message: "Existing patient recognized, welcome back".into(),
                    data: AuthData {
                        user: user.into(),
                        token,
                    },
                }),
            ))
        }
    }
}

async fn create_account(
    state: &AppState,
    payload: RegisterRequest,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Some(password) = payload.password.as_deref() else {
        return Err(ApiError::Validation("Password is required".into()));
    };
    let hash = hash_password(password)?;

    let user = match User::create(
        &state.db,
        &payload.name,
        &payload.email,
        &hash,
        payload.phone.as_deref(),
        payload.age,
        payload.gender.as_deref(),
    )
    .await
    {
        Ok(u) => u,
        // A concurrent registration won the unique index; answer as if the
        // account had existed all along.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "registration lost creation race");
            return Err(ApiError::AccountExists(ACCOUNT_EXISTS_LOGIN));
        }
        Err(e) => return Err(e.into()),
    };

    let token = JwtKeys::from_ref(state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created".into(),
            data: AuthData {
                user: user.into(),
                token,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (email, password) = validate_login(payload)?;

    // Unknown email and wrong password take the same exit so the response
    // never reveals whether the account exists.
    let Some(existing) = UserCredentials::find_by_email(&state.db, &email).await? else {
        warn!("login with unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&password, &existing.password_hash)? {
        warn!(user_id = %existing.user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let user = existing.user;
    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        data: AuthData {
            user: user.into(),
            token,
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(MeResponse {
        success: true,
        data: MeData { user: user.into() },
    }))
}

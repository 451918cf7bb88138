use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the configured basic-auth credentials.
///
/// Add this as the first handler parameter to protect a route; public
/// routes simply omit it.
pub struct Authenticated {
    pub username: String,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(credentials)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::CredentialsMissing
                    } else {
                        AppError::InvalidCredentials
                    }
                })?;

        if !verify(&state.config.auth, &credentials) {
            tracing::debug!(username = credentials.username(), "Rejected credentials");
            return Err(AppError::InvalidCredentials);
        }

        Ok(Authenticated {
            username: credentials.username().to_owned(),
        })
    }
}

fn verify(expected: &AuthConfig, credentials: &Basic) -> bool {
    // Evaluate both comparisons so timing does not reveal which one failed.
    let user_ok = constant_time_eq(expected.username.as_bytes(), credentials.username().as_bytes());
    let pass_ok = constant_time_eq(expected.password.as_bytes(), credentials.password().as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

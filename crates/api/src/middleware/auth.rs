//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hookroom_core::error::CoreError;
use hookroom_core::room::Caller;

use crate::auth::jwt::{validate_token, ROLE_ADMIN};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id in the issuing service (from `claims.sub`).
    pub user_id: String,
    /// The user's role name (`"admin"` or `"user"`).
    pub role: String,
    /// The user's capture retention preference, if any.
    pub webhook_ttl: Option<i64>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// This user as the actor of a room mutation.
    pub fn caller(&self) -> Caller<'_> {
        Caller {
            user_id: &self.user_id,
            is_admin: self.is_admin(),
        }
    }

    /// Owners and admins may manage a room; everyone else is rejected with 403.
    pub fn ensure_can_manage(&self, owner_id: &str) -> Result<(), AppError> {
        if self.caller().can_manage(owner_id) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(
                "Only the room owner or an admin may do this".into(),
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            webhook_ttl: claims.webhook_ttl,
        })
    }
}

//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the `X-API-Key` header
//! 2. Ask the key service whether it grants access
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "X-API-Key";

const BEARER_SCHEME: &str = "Bearer";

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key
    pub api_key_id: i64,

    /// Name of the authenticated API key, used in audit logs
    pub api_key_name: String,
}

/// Pull the presented key out of the header value.
///
/// Surrounding whitespace and an optional `Bearer ` prefix are removed.
fn normalize_credential(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix(BEARER_SCHEME) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => trimmed,
    }
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Read `X-API-Key` from the request
/// 2. Strip whitespace and an optional `Bearer ` prefix
/// 3. Validate through `ApiKeyService::validate` (hash, lookup, active/expiry check)
/// 4. If valid: inject `AuthContext` into request, call next handler
/// 5. Otherwise: return 401 without running the handler
///
/// # Headers
///
/// ```text
/// X-API-Key: sk-4f1c...
/// X-API-Key: Bearer sk-4f1c...
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::CredentialRequired)` if the header is absent or blank
/// - `Err(AppError::InvalidCredential)` if the key is unknown, inactive or expired
/// - `Err(AppError::Database)` if the lookup itself failed (returns 500)
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let presented = match request.headers().get(API_KEY_HEADER) {
        None => "",
        Some(value) => match value.to_str() {
            Ok(value) => normalize_credential(value),
            Err(_) => {
                tracing::warn!(path = %path, "Rejected non-UTF-8 API key header");
                return Err(AppError::InvalidCredential);
            }
        },
    };

    let api_key = match state.api_keys.validate(presented).await {
        Ok(api_key) => api_key,
        Err(e @ (AppError::CredentialRequired | AppError::InvalidCredential)) => {
            tracing::warn!(path = %path, reason = %e, "Rejected API key");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(
        api_key_id = api_key.id,
        api_key_name = %api_key.name,
        "API key validated"
    );

    request.extensions_mut().insert(AuthContext {
        api_key_id: api_key.id,
        api_key_name: api_key.name,
    });

    Ok(next.run(request).await)
}

// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Claims, User},
};

/// Valida o token emitido pelo provedor de identidade (HS256).
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;
    let claims = decode_claims(token, &app_state.jwt_secret).map_err(|e| e.to_api_error(&locale))?;

    let user = app_state
        .user_repo
        .find_by_id(&app_state.db_pool, claims.sub)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

    if !user.is_active() {
        tracing::warn!("Usuário {} inativo tentou acessar a API", user.id);
        return Err(AppError::Forbidden.to_api_error(&locale));
    }
    // O papel do banco prevalece sobre o do token
    if claims.role != user.role {
        tracing::warn!("Token do usuário {} com papel desatualizado", user.id);
    }

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims { sub: 7, role: Role::Staff, exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("encode")
    }

    fn in_one_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn valid_token_yields_claims() {
        let claims = decode_claims(&token("segredo", in_one_hour()), "segredo").expect("valid token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Staff);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        assert!(matches!(
            decode_claims(&token("segredo", in_one_hour()), "outro"),
            Err(AppError::InvalidToken)
        ));
        assert!(decode_claims(&token("segredo", 1_000), "segredo").is_err());
        assert!(decode_claims("not-a-jwt", "segredo").is_err());
    }
}

// src/middleware/rbac.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{Role, User},
};

/// 1. O Trait que define quais papéis passam
pub trait RoleRequirement: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Entrega o usuário já autorizado.
pub struct RequireRole<T>(pub User, PhantomData<T>);

impl<T> RequireRole<T> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|u| u.0.clone())
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        if !T::allows(user.role) {
            tracing::warn!("Usuário {} ({:?}) sem permissão para a rota", user.id, user.role);
            return Err(AppError::Forbidden.to_api_error(&locale));
        }

        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

/// Recepção: funcionários e administradores.
pub struct StaffDesk;
impl RoleRequirement for StaffDesk {
    fn allows(role: Role) -> bool {
        matches!(role, Role::Staff | Role::Admin)
    }
}

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allows(role: Role) -> bool {
        role == Role::Admin
    }
}

/// Reserva e pagamento online pelo hóspede.
pub struct OnlineBooker;
impl RoleRequirement for OnlineBooker {
    fn allows(role: Role) -> bool {
        matches!(role, Role::Guest | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_requirements() {
        assert!(StaffDesk::allows(Role::Staff));
        assert!(StaffDesk::allows(Role::Admin));
        assert!(!StaffDesk::allows(Role::Guest));

        assert!(AdminOnly::allows(Role::Admin));
        assert!(!AdminOnly::allows(Role::Staff));

        assert!(OnlineBooker::allows(Role::Guest));
        assert!(OnlineBooker::allows(Role::Admin));
        assert!(!OnlineBooker::allows(Role::Staff));
    }
}

// src/models/auth.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Staff,
    Admin,
}

impl Role {
    // Quem pode abrir, encerrar ou receber um turno
    pub fn works_shifts(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

// Usuário vindo do banco (hóspede com conta, recepcionista ou administrador)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Nguyễn Văn An")]
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    // Pode receber um turno repassado?
    pub fn is_eligible_successor(&self) -> bool {
        self.is_active() && self.role.works_shifts()
    }
}

// Resumo do funcionário para a lista de sucessores disponíveis
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: i32,
    pub full_name: String,
    pub role: Role,
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor de identidade
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,   // Subject (ID do usuário)
    pub role: Role, // Papel no momento da emissão
    pub exp: usize, // Expiration time
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, status: UserStatus) -> User {
        User {
            id: 1,
            full_name: "Trần Thị Bình".into(),
            email: None,
            phone: None,
            role,
            status,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn only_active_staff_or_admin_can_receive_a_shift() {
        assert!(user(Role::Staff, UserStatus::Active).is_eligible_successor());
        assert!(user(Role::Admin, UserStatus::Active).is_eligible_successor());
        assert!(!user(Role::Guest, UserStatus::Active).is_eligible_successor());
        assert!(!user(Role::Staff, UserStatus::Inactive).is_eligible_successor());
    }
}

// src/models/guest.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Hóspede identificado pelo número do documento (único)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: i32,
    pub full_name: String,
    #[schema(example = "CCCD")]
    pub document_type: String,
    #[schema(example = "079201001234")]
    pub document_number: String,
    pub address: Option<String>,
    pub nationality: Option<String>,
}

// Dados do hóspede já normalizados (trim) para o upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestInput {
    pub full_name: String,
    pub document_type: String,
    pub document_number: String,
    pub address: Option<String>,
    pub nationality: Option<String>,
}

impl GuestInput {
    pub fn normalized(
        full_name: &str,
        document_type: &str,
        document_number: &str,
        address: Option<&str>,
        nationality: Option<&str>,
    ) -> Self {
        let optional = |v: Option<&str>| {
            v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
        };
        Self {
            full_name: full_name.trim().to_string(),
            document_type: document_type.trim().to_string(),
            document_number: document_number.trim().to_string(),
            address: optional(address),
            nationality: optional(nationality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_fields_are_trimmed() {
        let input = GuestInput::normalized(
            "  Lê Văn Cường ",
            "CCCD ",
            " 079201001234",
            Some("   "),
            Some(" Việt Nam "),
        );
        assert_eq!(input.full_name, "Lê Văn Cường");
        assert_eq!(input.document_type, "CCCD");
        assert_eq!(input.document_number, "079201001234");
        assert_eq!(input.address, None);
        assert_eq!(input.nationality.as_deref(), Some("Việt Nam"));
    }
}

//! User Management wire types

use serde::{Deserialize, Serialize};

/// A WorkOS user as returned by the authenticate endpoint.
///
/// Timestamps are kept as the ISO-8601 strings the API sends; nothing in the
/// session flow does arithmetic on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Present when a WorkOS admin is impersonating the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impersonator {
    pub email: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_deserializes_api_payload() {
        let json = r#"{
            "object": "user",
            "id": "user_01E4ZCR3C56J083X43JQXF3JK5",
            "email": "marcelina.davis@example.com",
            "first_name": "Marcelina",
            "last_name": "Davis",
            "email_verified": true,
            "profile_picture_url": null,
            "created_at": "2021-06-25T19:07:33.155Z",
            "updated_at": "2021-06-25T19:07:33.155Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "user_01E4ZCR3C56J083X43JQXF3JK5");
        assert_eq!(user.first_name.as_deref(), Some("Marcelina"));
        assert!(user.email_verified);
        assert!(user.profile_picture_url.is_none());
    }

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let json = r#"{"id":"user_1","email":"a@b.c","created_at":"t","updated_at":"t"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.first_name.is_none());
        assert!(!user.email_verified);
    }
}

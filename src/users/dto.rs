use serde::{Deserialize, Serialize};

use super::repo::User;

/// Registration reply. The activation code is returned in the payload —
/// there is no mail delivery channel in this system.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub message: String,
    pub code: i32,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub email: String,
    pub code: i32,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload under `data` after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: User,
    pub token: String,
}

/// Profile payload: the user record plus a short-lived presigned URL for
/// the stored image, when one exists.
#[derive(Debug, Serialize)]
pub struct ProfileData {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            address: Some("12 Analytical St".into()),
            image: Some("avatars/key.png".into()),
            activation_code: 654321,
            verified: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn login_data_exposes_token_but_no_secrets() {
        let data = LoginData {
            user: sample_user(),
            token: "jwt-token".into(),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""token":"jwt-token""#));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("654321"));
    }

    #[test]
    fn profile_data_flattens_user_and_adds_image_url() {
        let data = ProfileData {
            user: sample_user(),
            image_url: Some("https://store/avatars/key.png".into()),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""email":"ada@x.com""#));
        assert!(json.contains(r#""image_url""#));

        let without = ProfileData {
            user: sample_user(),
            image_url: None,
        };
        let json = serde_json::to_string(&without).unwrap();
        assert!(!json.contains("image_url"));
    }
}

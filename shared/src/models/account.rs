//! Login, contact and Telegram opt-in payloads

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login form; forwarded to the backend's session endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Contact form submission from the marketing site
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Message must be at least 10 characters"))]
    pub message: String,
}

/// Account returned by the backend after a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Telegram delivery settings as the backend reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Body of `POST /api/telegram/enable`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableTelegramRequest {
    pub chat_id: String,
}

/// Generic `{success, message}` reply of the Telegram endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_validation() {
        let ok = LoginForm {
            email: "farmer@example.com".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginForm {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_contact_validation() {
        let form = ContactForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            subject: None,
            message: "Interested in a pilot for 40 ha of wheat.".into(),
        };
        assert!(form.validate().is_ok());

        let short = ContactForm {
            message: "hi".into(),
            ..form
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_telegram_settings_payload() {
        let settings: TelegramSettings =
            serde_json::from_str(r#"{"enabled": true, "chatId": "123456789"}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.chat_id.as_deref(), Some("123456789"));

        let empty: TelegramSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, TelegramSettings::default());
    }
}

// Normalizes error payloads from the hosted auth and database services into
// strings that are safe to show end users.

use serde_json::Value;

/// Provider error codes with a friendlier wording than the raw provider message
const FRIENDLY_MESSAGES: &[(&str, &str)] = &[
    ("invalid_credentials", "Invalid email or password"),
    ("email_not_confirmed", "Please confirm your email address before signing in"),
    ("user_not_found", "No account exists for this email address"),
    ("bad_jwt", "Your session is invalid. Please sign in again"),
    ("session_not_found", "Your session has expired. Please sign in again"),
    ("session_expired", "Your session has expired. Please sign in again"),
    ("over_email_send_rate_limit", "Too many emails sent. Please wait a moment and try again"),
    ("23505", "A record with these details already exists"),
    ("23503", "This record is still referenced by other data"),
];

/// Look up the friendly text for a provider code, falling back to the raw message
pub fn friendly_message(code: &str, fallback: &str) -> String {
    FRIENDLY_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// An error reported by the identity provider, whatever shape its body took
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    /// GoTrue has answered with `{code, msg}`, `{error_code, msg}`,
    /// `{error, error_description}` and `{message}` across versions.
    pub fn from_body(status: u16, body: &Value) -> Self {
        let code = ["error_code", "code", "error"]
            .iter()
            .find_map(|key| match body.get(*key) {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            });

        let message = ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        Self { status, code, message }
    }

    pub fn user_message(&self) -> String {
        match &self.code {
            Some(code) => friendly_message(code, &self.message),
            None => self.message.clone(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({}): {}", self.status, code, self.message),
            None => write!(f, "{}: {}", self.status, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_codes_get_friendly_text() {
        assert_eq!(friendly_message("invalid_credentials", "raw"), "Invalid email or password");
        assert_eq!(friendly_message("something_else", "raw text"), "raw text");
    }

    #[test]
    fn normalizes_gotrue_code_and_msg() {
        let err = ProviderError::from_body(400, &json!({"code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed"}));
        assert_eq!(err.code.as_deref(), Some("email_not_confirmed"));
        assert_eq!(err.message, "Email not confirmed");
        assert_eq!(err.user_message(), "Please confirm your email address before signing in");
    }

    #[test]
    fn normalizes_oauth_style_errors() {
        let err = ProviderError::from_body(401, &json!({"error": "invalid_grant", "error_description": "Token expired"}));
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
        assert_eq!(err.user_message(), "Token expired");
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        let err = ProviderError::from_body(503, &json!({}));
        assert_eq!(err.code, None);
        assert_eq!(err.user_message(), "Request failed with status 503");
    }
}

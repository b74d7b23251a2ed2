use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const REFERENCE_PREFIX: &str = "pm:";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub method_type: String,
    pub label: String,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub is_visible: bool,
    pub is_default: bool,
    pub qr_image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodInput {
    pub method_type: String,
    pub label: String,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_default: bool,
    pub qr_image_path: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PaymentMethod {
    /// Text embedded in a withdrawal's status notes to point back at this method
    pub fn notes_reference(&self) -> String {
        format!("Payment method: {} ({}{})", self.label, REFERENCE_PREFIX, self.id)
    }
}

/// Find the payment method a withdrawal's notes refer to.
///
/// Notes written by this service carry a `pm:<uuid>` token. Older notes only
/// mention the method label, so fall back to the longest label that appears
/// in the text.
pub fn resolve_reference<'a>(notes: &str, methods: &'a [PaymentMethod]) -> Option<&'a PaymentMethod> {
    let by_token = notes
        .match_indices(REFERENCE_PREFIX)
        .filter_map(|(idx, _)| {
            let start = idx + REFERENCE_PREFIX.len();
            notes.get(start..start + 36).and_then(|s| Uuid::parse_str(s).ok())
        })
        .find_map(|id| methods.iter().find(|m| m.id == id));

    if by_token.is_some() {
        return by_token;
    }

    let haystack = notes.to_lowercase();
    methods
        .iter()
        .filter(|m| !m.label.is_empty() && haystack.contains(&m.label.to_lowercase()))
        .max_by_key(|m| m.label.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(label: &str) -> PaymentMethod {
        PaymentMethod {
            id: Uuid::new_v4(),
            method_type: "bank".to_string(),
            label: label.to_string(),
            account_name: None,
            account_number: None,
            is_visible: true,
            is_default: false,
            qr_image_path: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolves_embedded_token() {
        let methods = vec![method("Bank"), method("GCash")];
        let notes = format!("{} | approved by finance", methods[1].notes_reference());
        assert_eq!(resolve_reference(&notes, &methods).map(|m| m.id), Some(methods[1].id));
    }

    #[test]
    fn falls_back_to_longest_label_match() {
        let methods = vec![method("Bank"), method("Bank BCA"), method("OVO")];
        let resolved = resolve_reference("send to bank bca please", &methods).unwrap();
        assert_eq!(resolved.label, "Bank BCA");
    }

    #[test]
    fn token_for_unknown_method_falls_back_to_label() {
        let methods = vec![method("OVO")];
        let notes = format!("pm:{} via OVO", Uuid::new_v4());
        assert_eq!(resolve_reference(&notes, &methods).map(|m| m.label.as_str()), Some("OVO"));
        assert!(resolve_reference("pm:not-a-uuid", &methods).is_none());
    }
}

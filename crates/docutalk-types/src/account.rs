//! User profile and chatbot catalog entries.
//!
//! Only the fields the client actually consumes are modelled; unknown
//! fields in the profile document are ignored.

use serde::{Deserialize, Serialize};

/// A chatbot the user owns or has been granted access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub user_role: String,
    #[serde(default)]
    pub suggested_prompts: Vec<String>,
}

/// The authenticated user's profile (`GET /api/auth/user`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub friendly_name: String,
    /// Dollar allowance per billing period.
    #[serde(default)]
    pub period_dollar_amount: f64,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub chatbots: Vec<ChatbotSummary>,
}

impl UserProfile {
    /// Look up a chatbot in the user's catalog.
    pub fn chatbot(&self, id: &str) -> Option<&ChatbotSummary> {
        self.chatbots.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses_with_unknown_fields() {
        let json = r#"{
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "friendly_name": "Ada",
            "period_dollar_amount": 2.5,
            "terms_of_use_displayed": true,
            "is_guest": false,
            "id": "u-1",
            "timestamp": "2024-01-01T00:00:00",
            "chatbots": [
                {"id": "bot-1", "title": "Manuals", "description": "d", "icon": "aGk=",
                 "access": "private", "user_role": "Admin",
                 "suggested_prompts": ["a", "b"], "documents": [], "accesses": []}
            ]
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.friendly_name, "Ada");
        assert!((profile.period_dollar_amount - 2.5).abs() < f64::EPSILON);
        let bot = profile.chatbot("bot-1").unwrap();
        assert_eq!(bot.title, "Manuals");
        assert_eq!(bot.suggested_prompts, vec!["a", "b"]);
        assert!(profile.chatbot("missing").is_none());
    }

    #[test]
    fn profile_defaults_missing_allowance() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"x@y.z"}"#).unwrap();
        assert_eq!(profile.period_dollar_amount, 0.0);
        assert!(profile.chatbots.is_empty());
    }
}

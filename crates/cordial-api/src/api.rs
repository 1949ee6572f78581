//! Wire types of the rewriting service.

use cordial_protocols::UserIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `POST /generate-reply`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateReplyResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub credits_remaining: Option<u32>,
}

impl GenerateReplyResponse {
    /// The rewritten text, unless missing or blank.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UserPayload<'a> {
    pub user: &'a UserIdentity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreditsResponse {
    pub credits: u32,
}

/// Body of the claim and add-credits endpoints, successful or not.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClaimResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub credits_added: Option<u32>,
    #[serde(default)]
    pub new_total: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub already_claimed: bool,
}

/// What the server decided about a credit grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted { credits_added: u32, new_total: u32 },
    AlreadyClaimed { message: String },
    Rejected { message: String },
}

impl ClaimResponse {
    pub(crate) fn into_outcome(self) -> ClaimOutcome {
        if self.already_claimed {
            return ClaimOutcome::AlreadyClaimed {
                message: self
                    .error
                    .unwrap_or_else(|| "Daily credits already claimed today".to_string()),
            };
        }
        match (self.success, self.credits_added, self.new_total) {
            (true, Some(credits_added), Some(new_total)) => ClaimOutcome::Granted {
                credits_added,
                new_total,
            },
            _ => ClaimOutcome::Rejected {
                message: self
                    .error
                    .unwrap_or_else(|| "Failed to claim credits".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckoutRequest<'a> {
    pub email: &'a str,
    pub credits: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutResponse {
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else is returned verbatim.
pub(crate) fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| match &v["error"] {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => v["error"]["message"].as_str().map(String::from),
            _ => v["message"].as_str().map(String::from),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_filters_blank() {
        let blank = GenerateReplyResponse {
            response: Some("  \n".to_string()),
            credits_remaining: None,
        };
        assert_eq!(blank.text(), None);
        assert_eq!(GenerateReplyResponse::default().text(), None);

        let ok = GenerateReplyResponse {
            response: Some("Hello".to_string()),
            credits_remaining: Some(4),
        };
        assert_eq!(ok.text(), Some("Hello"));
    }

    #[test]
    fn test_claim_outcomes() {
        let granted: ClaimResponse =
            serde_json::from_str(r#"{"success": true, "credits_added": 3, "new_total": 8}"#)
                .unwrap();
        assert_eq!(
            granted.into_outcome(),
            ClaimOutcome::Granted {
                credits_added: 3,
                new_total: 8
            }
        );

        let claimed: ClaimResponse =
            serde_json::from_str(r#"{"error": "Already claimed today", "already_claimed": true}"#)
                .unwrap();
        assert_eq!(
            claimed.into_outcome(),
            ClaimOutcome::AlreadyClaimed {
                message: "Already claimed today".to_string()
            }
        );

        let rejected: ClaimResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(
            rejected.into_outcome(),
            ClaimOutcome::Rejected {
                message: "Failed to claim credits".to_string()
            }
        );
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"error": "User not found"}"#), "User not found");
        assert_eq!(
            error_message(r#"{"error": {"message": "Bad tone", "type": "invalid"}}"#),
            "Bad tone"
        );
        assert_eq!(error_message(r#"{"message": "Nope"}"#), "Nope");
        assert_eq!(error_message("Internal Server Error\n"), "Internal Server Error");
    }
}

use super::*;
use crate::error::RewriteError;

#[test]
fn test_tone_serializes_lowercase() {
    let json = serde_json::to_value(Tone::Friendly).unwrap();
    assert_eq!(json, "friendly");
}

#[test]
fn test_tone_from_str_is_case_insensitive() {
    assert_eq!("Formal".parse::<Tone>().unwrap(), Tone::Formal);
    assert_eq!(" concise ".parse::<Tone>().unwrap(), Tone::Concise);
}

#[test]
fn test_tone_from_str_rejects_unknown() {
    let err = "sarcastic".parse::<Tone>().unwrap_err();
    assert!(err.contains("sarcastic"));
}

#[test]
fn test_tone_default_is_professional() {
    assert_eq!(Tone::default(), Tone::Professional);
    assert_eq!(Tone::ALL.len(), 4);
}

#[test]
fn test_session_record_defaults_on_deserialize() {
    let json = r#"{"email":"a@example.com"}"#;
    let record: SessionRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.email, "a@example.com");
    assert!(!record.authenticated);
    assert_eq!(record.credits, DEFAULT_STARTING_CREDITS);
    assert!(record.last_daily_claim.is_none());
}

#[test]
fn test_session_record_ignores_unknown_fields() {
    let json = r#"{"email":"a@example.com","authenticated":true,"credits":4,"locale":"en"}"#;
    let record: SessionRecord = serde_json::from_str(json).unwrap();
    assert!(record.authenticated);
    assert_eq!(record.credits, 4);
}

#[test]
fn test_session_record_rejects_negative_credits() {
    let json = r#"{"email":"a@example.com","credits":-1}"#;
    assert!(serde_json::from_str::<SessionRecord>(json).is_err());
}

#[test]
fn test_session_record_from_identity() {
    let mut identity = UserIdentity::new("b@example.com");
    identity.name = Some("B".to_string());
    let record = SessionRecord::authenticated(identity.clone());
    assert!(record.authenticated);
    assert_eq!(record.identity(), identity);
}

#[test]
fn test_rewrite_request_skips_missing_user() {
    let request = RewriteRequest {
        message: "hello".to_string(),
        tone: Tone::Concise,
        user: None,
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["tone"], "concise");
    assert!(json.get("user").is_none());
}

#[test]
fn test_rewrite_result_failure_carries_message() {
    let result = RewriteResult::failure(RewriteError::DraftTooShort);
    assert!(!result.is_success());
    assert_eq!(result.error(), Some(&RewriteError::DraftTooShort));
    match result {
        RewriteResult::Failure { message, .. } => assert!(message.contains("more content")),
        RewriteResult::Success { .. } => panic!("expected failure"),
    }
}

#[test]
fn test_rewrite_result_from_result() {
    let ok: RewriteResult = Ok(("done".to_string(), Some(3))).into();
    assert_eq!(ok, RewriteResult::success("done", Some(3)));
    let err: RewriteResult = Err(RewriteError::EmptyServerResponse).into();
    assert_eq!(err.error(), Some(&RewriteError::EmptyServerResponse));
}

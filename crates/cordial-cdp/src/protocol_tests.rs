use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Runtime.evaluate".to_string(),
        params: Some(serde_json::json!({"expression": "1 + 1"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["method"], "Runtime.evaluate");
    assert_eq!(json["sessionId"], "S1");
}

#[test]
fn test_request_without_session_omits_field() {
    let req = CdpRequest {
        id: 2,
        method: "Target.getTargets".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert!(json.get("sessionId").is_none());
    assert!(json.get("params").is_none());
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"result": {"type": "number", "value": 2}}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "Inbox",
        "url": "https://mail.google.com/mail/u/0/",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert!(info.is_tab());
}

#[test]
fn test_service_worker_is_not_a_tab() {
    let json = r#"{"id": "sw1", "type": "service_worker", "url": "chrome-extension://x/bg.js"}"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert!(!info.is_tab());
    assert_eq!(info.title, "");
}

#[test]
fn test_binding_called_from_event() {
    let json = r#"{
        "method": "Runtime.bindingCalled",
        "params": {"name": "__cordialTrigger", "payload": "{\"tone\":\"friendly\"}", "executionContextId": 3},
        "sessionId": "S1"
    }"#;
    let event: CdpResponse = serde_json::from_str(json).unwrap();
    let call = BindingCalled::from_event(&event).unwrap();
    assert_eq!(call.name, "__cordialTrigger");
    assert_eq!(call.execution_context_id, 3);
}

#[test]
fn test_other_events_are_not_binding_calls() {
    let json = r#"{"method": "Page.frameNavigated", "params": {"frame": {}}}"#;
    let event: CdpResponse = serde_json::from_str(json).unwrap();
    assert!(BindingCalled::from_event(&event).is_none());
}

#[test]
fn test_exception_message_prefers_description() {
    let json = r#"{
        "text": "Uncaught",
        "exception": {"type": "object", "description": "Error: stale:7\n    at <anonymous>:1:1"}
    }"#;
    let details: ExceptionDetails = serde_json::from_str(json).unwrap();
    assert!(details.message().starts_with("Error: stale:7"));

    let bare: ExceptionDetails = serde_json::from_str(r#"{"text": "Uncaught"}"#).unwrap();
    assert_eq!(bare.message(), "Uncaught");
}

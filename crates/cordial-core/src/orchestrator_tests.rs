use super::*;
use async_trait::async_trait;
use cordial_dom::MemoryDocument;
use cordial_protocols::{
    KeyValueStore, NotificationKind, SessionRecord, StorageError, UserIdentity,
};
use cordial_storage::MemoryStore;
use serde_json::{Value, json};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

const DRAFT: &str = "hey can we meet tomorrow to talk about the project";

fn new_compose(draft: &str) -> String {
    format!(
        r#"<div class="M9" role="dialog">
  <input name="subjectbox" value="Project kickoff">
  <div class="Am Al editable" contenteditable="true" aria-label="Message Body">{draft}</div>
</div>"#
    )
}

fn reply_compose(draft: &str) -> String {
    format!(
        r#"<div class="adn"><div class="ii gt"><div class="a3s">Hi Pat, can you confirm the venue for Thursday?</div></div></div>
<div class="M9" role="dialog">
  <input name="subjectbox" value="Re: Thursday">
  <div class="Am Al editable" contenteditable="true">{draft}</div>
</div>"#
    )
}

fn signed_in() -> SessionRecord {
    SessionRecord::authenticated(UserIdentity::new("pat@example.com")).with_credits(10)
}

struct Harness {
    doc: Arc<MemoryDocument>,
    sessions: SessionStore,
    orchestrator: RewriteOrchestrator,
}

impl Harness {
    fn editor(&self) -> ElementHandle {
        self.doc.find(".Am.Al.editable").unwrap()
    }

    async fn editor_html(&self) -> String {
        self.doc.inner_html(self.editor()).await.unwrap()
    }
}

async fn harness(html: &str, server: &MockServer, session: Option<SessionRecord>) -> Harness {
    harness_with_store(html, server, session, Arc::new(MemoryStore::new())).await
}

async fn harness_with_store(
    html: &str,
    server: &MockServer,
    session: Option<SessionRecord>,
    store: Arc<dyn KeyValueStore>,
) -> Harness {
    let doc = Arc::new(MemoryDocument::from_html(html));
    let sessions = SessionStore::new(store);
    if let Some(record) = session {
        sessions.set_session(&record).await.unwrap();
    }
    let api = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let orchestrator = RewriteOrchestrator::new(
        &AttachedPage::from_shared(doc.clone()),
        Arc::new(SelectorRegistry::default()),
        sessions.clone(),
        api,
        OrchestratorOptions::default(),
    );
    Harness {
        doc,
        sessions,
        orchestrator,
    }
}

async fn no_network(server: &MockServer) {
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

async fn reply_with(server: &MockServer, status: u16, body: Value) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/generate-reply"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_no_compose_window() {
    let server = MockServer::start().await;
    no_network(&server).await;
    let h = harness("<div class=\"ii gt\">Inbox view</div>", &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::NoComposeWindow));
    assert_eq!(h.doc.last_notification().unwrap().kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_editor_not_found() {
    let server = MockServer::start().await;
    no_network(&server).await;
    let h = harness(
        "<div class=\"M9\"><div role=\"textbox\">read only</div></div>",
        &server,
        Some(signed_in()),
    )
    .await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::EditorNotFound));
}

#[tokio::test]
async fn test_empty_draft() {
    let server = MockServer::start().await;
    no_network(&server).await;
    let h = harness(&new_compose("   "), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::EmptyDraft));
    let notice = h.doc.last_notification().unwrap();
    assert_eq!(notice.kind, NotificationKind::Warning);
    assert_eq!(notice.message, "Please write some content in the email first!");
}

#[tokio::test]
async fn test_short_draft_makes_no_request() {
    let server = MockServer::start().await;
    no_network(&server).await;
    let h = harness(&new_compose("hi"), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::DraftTooShort));
    assert_eq!(h.editor_html().await, "hi");
}

#[tokio::test]
async fn test_unauthenticated_makes_no_request() {
    let server = MockServer::start().await;
    no_network(&server).await;

    let h = harness(&new_compose(DRAFT), &server, None).await;
    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::AuthRequired));

    let mut signed_out = signed_in();
    signed_out.authenticated = false;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_out)).await;
    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::AuthRequired));
    assert!(
        h.doc
            .notifications()
            .iter()
            .all(|n| n.message != IN_PROGRESS_MESSAGE)
    );
}

/// Store whose reads always fail.
struct UnreadableStore;

#[async_trait]
impl KeyValueStore for UnreadableStore {
    async fn get(&self, _: &str) -> Result<Option<Value>, StorageError> {
        Err(StorageError::Unavailable("disk gone".to_string()))
    }
    async fn set(&self, _: &str, _: Value) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk gone".to_string()))
    }
    async fn remove(&self, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk gone".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failure() {
    let server = MockServer::start().await;
    no_network(&server).await;
    let h = harness_with_store(&new_compose(DRAFT), &server, None, Arc::new(UnreadableStore)).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert!(matches!(
        result.error(),
        Some(RewriteError::StorageError(m)) if m.contains("disk gone")
    ));
}

#[tokio::test]
async fn test_new_email_success() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/generate-reply"))
        .and(matchers::body_json(json!({
            "message": build_prompt(DRAFT, "", Tone::Friendly),
            "tone": "friendly",
            "user": {"email": "pat@example.com"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Hi Sam,\nCould we meet tomorrow?",
            "credits_remaining": 9
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Friendly).await;
    assert_eq!(
        result,
        RewriteResult::success("Hi Sam,\nCould we meet tomorrow?", Some(9))
    );
    assert_eq!(h.editor_html().await, "Hi Sam,<br>Could we meet tomorrow?");

    let events: Vec<_> = h.doc.events().into_iter().map(|e| e.event_type).collect();
    assert_eq!(events, vec!["input", "change"]);

    let kinds: Vec<_> = h.doc.notifications().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Info, NotificationKind::Success]);

    assert_eq!(h.sessions.get_session().await.unwrap().unwrap().credits, 9);
}

#[tokio::test]
async fn test_reply_sends_thread_context() {
    let server = MockServer::start().await;
    let expected = build_prompt(
        DRAFT,
        "--- Message 1 ---\nHi Pat, can you confirm the venue for Thursday?",
        Tone::Professional,
    );
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/generate-reply"))
        .and(matchers::body_partial_json(json!({"message": expected, "tone": "professional"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Confirmed."})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&reply_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result, RewriteResult::success("Confirmed.", None));
    // No figure in the response leaves the cached balance alone.
    assert_eq!(h.sessions.get_session().await.unwrap().unwrap().credits, 10);
}

#[tokio::test]
async fn test_response_markup_is_escaped() {
    let server = MockServer::start().await;
    reply_with(
        &server,
        200,
        json!({"response": "Hello <script>alert('x')</script> & bye"}),
    )
    .await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    assert!(h.orchestrator.rewrite(Tone::Concise).await.is_success());
    let html = h.editor_html().await;
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("&amp; bye"));
    assert_eq!(h.doc.find("script"), None);
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_required() {
    let server = MockServer::start().await;
    reply_with(&server, 401, json!({"error": "Unauthorized"})).await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::AuthRequired));
}

#[tokio::test]
async fn test_payment_required_leaves_editor_untouched() {
    let server = MockServer::start().await;
    reply_with(&server, 402, json!({"error": "Insufficient credits"})).await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::InsufficientCredits));
    assert_eq!(h.editor_html().await, DRAFT);
    assert!(h.doc.events().is_empty());
    assert_eq!(h.doc.last_notification().unwrap().kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_other_status_is_server_error() {
    let server = MockServer::start().await;
    reply_with(&server, 503, json!({"error": "Overloaded"})).await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::ServerError(503)));
    match result {
        RewriteResult::Failure { message, .. } => assert!(message.contains("503")),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_response_is_empty_server_response() {
    let server = MockServer::start().await;
    reply_with(&server, 200, json!({"response": "   ", "credits_remaining": 3})).await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::EmptyServerResponse));
    assert_eq!(h.editor_html().await, DRAFT);
}

#[tokio::test]
async fn test_undecodable_success_body_is_empty_server_response() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/generate-reply"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;

    let result = h.orchestrator.rewrite(Tone::Professional).await;
    assert_eq!(result.error(), Some(&RewriteError::EmptyServerResponse));
    assert_eq!(h.editor_html().await, DRAFT);
}

#[tokio::test]
async fn test_network_failure() {
    let doc = Arc::new(MemoryDocument::from_html(&new_compose(DRAFT)));
    let sessions = SessionStore::new(Arc::new(MemoryStore::new()));
    sessions.set_session(&signed_in()).await.unwrap();
    let orchestrator = RewriteOrchestrator::new(
        &AttachedPage::from_shared(doc.clone()),
        Arc::new(SelectorRegistry::default()),
        sessions,
        ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap(),
        OrchestratorOptions::default(),
    );

    let result = orchestrator.rewrite(Tone::Professional).await;
    assert!(matches!(result.error(), Some(RewriteError::NetworkError(_))));
}

#[tokio::test]
async fn test_editor_replaced_during_request() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/generate-reply"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "Too late"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&new_compose(DRAFT), &server, Some(signed_in())).await;
    let editor = h.editor();

    let (result, _) = tokio::join!(h.orchestrator.rewrite(Tone::Professional), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.doc.remove(editor).unwrap();
    });

    assert_eq!(result.error(), Some(&RewriteError::EditorNotFound));
    assert!(h.doc.events().is_empty());
}

#[tokio::test]
async fn test_rewrite_when_ready_waits_for_editor() {
    let server = MockServer::start().await;
    reply_with(&server, 200, json!({"response": "Ready now."})).await;
    let h = harness("<div class=\"M9\"></div>", &server, Some(signed_in())).await;

    let doc = h.doc.clone();
    let (result, _) = tokio::join!(
        h.orchestrator
            .rewrite_when_ready(Tone::Professional, Duration::from_secs(5)),
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let dialog = doc.find(".M9").unwrap();
            doc.append_html(
                dialog,
                &format!("<div class=\"Am Al editable\" contenteditable=\"true\">{DRAFT}</div>"),
            )
            .unwrap();
        }
    );

    assert_eq!(result, RewriteResult::success("Ready now.", None));
}

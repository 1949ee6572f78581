use super::*;

const COMPOSE: &str = r#"
<div class="adn"><div class="a3s">Hi team, the launch moved to Friday.</div></div>
<div role="dialog">
  <input name="subjectbox" value="Re: Launch">
  <div class="Am Al editable" contenteditable="true" aria-label="Message Body">draft text</div>
</div>
"#;

#[tokio::test]
async fn test_query_selector_document_order() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let first = doc.query_selector("div").await.unwrap().unwrap();
    let all = doc.query_selector_all("div").await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0], first);
}

#[tokio::test]
async fn test_invalid_selector_matches_nothing() {
    let doc = MemoryDocument::from_html(COMPOSE);
    assert_eq!(doc.query_selector("div:has(p)").await.unwrap(), None);
    assert!(doc.query_selector_all("[[").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_editor_properties() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let editor = doc.find(".Am.Al.editable").unwrap();
    let dialog = doc.find("div[role=\"dialog\"]").unwrap();

    assert!(doc.is_content_editable(editor).await.unwrap());
    assert!(!doc.is_content_editable(dialog).await.unwrap());
    assert!(doc.has_editable_descendant(dialog).await.unwrap());
    assert_eq!(doc.inner_text(editor).await.unwrap(), "draft text");

    let subject = doc.find("input[name=\"subjectbox\"]").unwrap();
    assert_eq!(doc.value(subject).await.unwrap().as_deref(), Some("Re: Launch"));
    assert_eq!(doc.value(editor).await.unwrap(), None);
}

#[tokio::test]
async fn test_set_inner_html_replaces_children() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let editor = doc.find("[contenteditable=\"true\"]").unwrap();

    doc.set_inner_html(editor, "Dear Sam,<br><br>Thanks &amp; regards")
        .await
        .unwrap();

    assert_eq!(
        doc.inner_html(editor).await.unwrap(),
        "Dear Sam,<br><br>Thanks &amp; regards"
    );
    assert_eq!(
        doc.inner_text(editor).await.unwrap(),
        "Dear Sam,\n\nThanks & regards"
    );
}

#[tokio::test]
async fn test_set_text_content() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let editor = doc.find("[contenteditable=\"true\"]").unwrap();

    doc.set_text_content(editor, "<b>plain</b>").await.unwrap();
    assert_eq!(doc.inner_html(editor).await.unwrap(), "&lt;b&gt;plain&lt;/b&gt;");

    doc.set_text_content(editor, "").await.unwrap();
    assert_eq!(doc.inner_html(editor).await.unwrap(), "");
}

#[tokio::test]
async fn test_removed_element_is_disconnected() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let editor = doc.find("[contenteditable=\"true\"]").unwrap();
    assert!(doc.is_connected(editor).await.unwrap());

    doc.remove(editor).unwrap();
    assert!(!doc.is_connected(editor).await.unwrap());
    assert_eq!(doc.find("[contenteditable=\"true\"]"), None);
}

#[tokio::test]
async fn test_unknown_handle_is_stale() {
    let doc = MemoryDocument::new();
    let err = doc.is_connected(ElementHandle::new(500)).await.unwrap_err();
    assert_eq!(err, DomError::StaleElement(500));
}

#[tokio::test]
async fn test_mutations_broadcast() {
    let doc = MemoryDocument::new();
    let mut rx = doc.subscribe();

    doc.append_html(doc.body(), "<div class=\"M9\"></div>").unwrap();
    assert_eq!(rx.recv().await.unwrap(), DomMutation::ChildList);

    let dialog = doc.find(".M9").unwrap();
    doc.set_attribute(dialog, "role", "dialog").unwrap();
    assert_eq!(rx.recv().await.unwrap(), DomMutation::Attributes);
    assert!(doc.find("[role=dialog]").is_some());
}

#[tokio::test]
async fn test_events_recorded() {
    let doc = MemoryDocument::from_html(COMPOSE);
    let editor = doc.find("[contenteditable=\"true\"]").unwrap();

    doc.dispatch_event(editor, "input").await.unwrap();
    doc.dispatch_event(editor, "change").await.unwrap();

    let types: Vec<_> = doc.events().into_iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec!["input", "change"]);
    assert!(doc.events().iter().all(|e| e.target == editor));
}

#[tokio::test]
async fn test_notifications_recorded() {
    let doc = MemoryDocument::new();
    doc.notify(Notification::info("Rewriting your email...")).await;
    doc.notify(Notification::success("Done")).await;

    assert_eq!(doc.notifications().len(), 2);
    assert_eq!(doc.last_notification(), Some(Notification::success("Done")));
}

#[test]
fn test_to_html() {
    let doc = MemoryDocument::from_html("<p>a &amp; b</p>");
    assert_eq!(doc.to_html(), "<p>a &amp; b</p>");
}

use super::*;
use cordial_dom::MemoryDocument;
use cordial_protocols::DomError;

fn extractor(html: &str) -> ContextExtractor {
    let doc = Arc::new(MemoryDocument::from_html(html));
    ContextExtractor::new(doc, Arc::new(SelectorRegistry::default()))
}

#[tokio::test]
async fn test_new_email_without_prior_messages_or_prefix() {
    let ctx = extractor(
        r#"<div role="dialog"><input name="subjectbox" value="Quarterly plans"><div contenteditable="true">hello</div></div>"#,
    );
    assert!(!ctx.is_reply_context().await);
}

#[tokio::test]
async fn test_reply_prefix_without_prior_messages_is_reply() {
    for subject in ["Re: Launch", "RE: Launch", "Fwd: Launch", "fw: Launch"] {
        let ctx = extractor(&format!(
            r#"<input name="subjectbox" value="{subject}"><div contenteditable="true">x</div>"#
        ));
        assert!(ctx.is_reply_context().await, "subject {subject:?}");
    }
}

#[tokio::test]
async fn test_prior_message_makes_reply() {
    let ctx = extractor(
        r#"<div class="adn"><div class="a3s">Earlier message body</div></div><input name="subjectbox" value="Plans">"#,
    );
    assert!(ctx.is_reply_context().await);
}

#[tokio::test]
async fn test_prefix_must_lead_the_subject() {
    let ctx = extractor(r#"<input name="subjectbox" value="About re: the launch">"#);
    assert!(!ctx.is_reply_context().await);
}

#[tokio::test]
async fn test_thread_context_numbered_by_match_position() {
    let ctx = extractor(
        r#"
        <div class="ii gt">Thanks, see you at the offsite next week.</div>
        <div class="ii gt">Short one</div>
        <div class="ii gt">Could you send the agenda before Friday?</div>
        "#,
    );
    assert_eq!(
        ctx.extract_thread_context().await,
        "--- Message 1 ---\nThanks, see you at the offsite next week.\n\n\
         --- Message 3 ---\nCould you send the agenda before Friday?"
    );
}

#[tokio::test]
async fn test_first_matching_selector_wins() {
    // `.ii.gt` matches (only short text), so `.h7` is never consulted.
    let ctx = extractor(
        r#"
        <div class="ii gt">tiny</div>
        <div class="h7">This long message would otherwise be included.</div>
        <span class="hP">Team sync</span>
        "#,
    );
    assert_eq!(ctx.extract_thread_context().await, "Subject: Team sync");
}

#[tokio::test]
async fn test_editable_messages_excluded() {
    let ctx = extractor(
        r#"
        <div class="ii gt" contenteditable="true">This is the compose body, not context.</div>
        <div class="ii gt"><div contenteditable="true">A wrapper around the editor body</div></div>
        <div class="ii gt">A genuine earlier message in the thread.</div>
        "#,
    );
    assert_eq!(
        ctx.extract_thread_context().await,
        "--- Message 3 ---\nA genuine earlier message in the thread."
    );
}

#[tokio::test]
async fn test_minimum_length_boundary() {
    let ctx = extractor(
        r#"
        <div class="ii gt">  abcdefghijklmnopqrs  </div>
        <div class="ii gt">  abcdefghijklmnopqrst  </div>
        "#,
    );
    assert_eq!(
        ctx.extract_thread_context().await,
        "--- Message 2 ---\nabcdefghijklmnopqrst"
    );
}

#[tokio::test]
async fn test_all_short_messages_fall_back_to_subject_input() {
    let ctx = extractor(
        r#"
        <div class="ii gt"><div class="a3s">ok</div></div>
        <div class="ii gt"><div class="a3s">thanks!</div></div>
        <input name="subjectbox" value="  Re: Dinner  ">
        "#,
    );
    assert!(ctx.is_reply_context().await);
    assert_eq!(ctx.extract_thread_context().await, "Subject: Re: Dinner");
}

#[tokio::test]
async fn test_reply_subject_without_messages_falls_back_to_subject() {
    let ctx = extractor(r#"<input name="subjectbox" value="Re: Budget"><div contenteditable="true">draft</div>"#);
    assert!(ctx.is_reply_context().await);
    assert_eq!(ctx.extract_thread_context().await, "Subject: Re: Budget");
}

#[tokio::test]
async fn test_empty_when_nothing_found() {
    let ctx = extractor("<div>unrelated</div>");
    assert_eq!(ctx.extract_thread_context().await, "");
}

#[tokio::test]
async fn test_custom_minimum() {
    let doc = Arc::new(MemoryDocument::from_html(r#"<div class="ii gt">Short but fine</div>"#));
    let ctx = ContextExtractor::new(doc, Arc::new(SelectorRegistry::default())).with_min_message_chars(5);
    assert_eq!(
        ctx.extract_thread_context().await,
        "--- Message 1 ---\nShort but fine"
    );
}

#[test]
fn test_build_prompt_reply_template() {
    let prompt = build_prompt("see you then", "--- Message 1 ---\nLunch at noon?", Tone::Friendly);
    assert_eq!(
        prompt,
        "Email Thread Context:\n--- Message 1 ---\nLunch at noon?\n\n--- My Draft Reply ---\n\
         see you then\n\nPlease rewrite my draft reply to be more professional and \
         well-structured, taking into account the context of the email thread above."
    );
}

#[test]
fn test_build_prompt_new_template() {
    let prompt = build_prompt("hello there", "", Tone::Formal);
    assert!(prompt.starts_with("My draft email:\nhello there\n\n"));
    assert!(prompt.ends_with("appropriate for reaching out or initiating communication."));
    assert!(!prompt.contains("formal"));
}

/// Delegates to a [`MemoryDocument`] but fails the editability checks, the
/// way a live page does when an element goes stale mid-read.
struct FailingChecks {
    doc: MemoryDocument,
    fail_self: bool,
    fail_descendants: bool,
}

#[async_trait::async_trait]
impl DomQuery for FailingChecks {
    async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError> {
        self.doc.query_selector(selector).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
        self.doc.query_selector_all(selector).await
    }

    async fn is_connected(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.doc.is_connected(element).await
    }

    async fn is_content_editable(&self, element: ElementHandle) -> Result<bool, DomError> {
        if self.fail_self {
            return Err(DomError::StaleElement(element.id()));
        }
        self.doc.is_content_editable(element).await
    }

    async fn has_editable_descendant(&self, element: ElementHandle) -> Result<bool, DomError> {
        if self.fail_descendants {
            return Err(DomError::StaleElement(element.id()));
        }
        self.doc.has_editable_descendant(element).await
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<String, DomError> {
        self.doc.inner_text(element).await
    }

    async fn value(&self, element: ElementHandle) -> Result<Option<String>, DomError> {
        self.doc.value(element).await
    }

    async fn inner_html(&self, element: ElementHandle) -> Result<String, DomError> {
        self.doc.inner_html(element).await
    }

    async fn set_inner_html(&self, element: ElementHandle, html: &str) -> Result<(), DomError> {
        self.doc.set_inner_html(element, html).await
    }

    async fn set_text_content(&self, element: ElementHandle, text: &str) -> Result<(), DomError> {
        self.doc.set_text_content(element, text).await
    }

    async fn dispatch_event(&self, element: ElementHandle, event_type: &str) -> Result<(), DomError> {
        self.doc.dispatch_event(element, event_type).await
    }
}

const DRAFT_IN_THREAD: &str = r#"<div class="ii gt"><div contenteditable="true">my private unsent compose draft text</div></div>
<input name="subjectbox" value="Plans">"#;

#[tokio::test]
async fn test_failed_editable_checks_skip_the_message() {
    for (fail_self, fail_descendants) in [(true, true), (true, false), (false, true)] {
        let dom = FailingChecks {
            doc: MemoryDocument::from_html(DRAFT_IN_THREAD),
            fail_self,
            fail_descendants,
        };
        let ctx = ContextExtractor::new(Arc::new(dom), Arc::new(SelectorRegistry::default()));

        let context = ctx.extract_thread_context().await;
        assert!(!context.contains("unsent compose draft"), "leaked draft: {context:?}");
        assert_eq!(context, "Subject: Plans");
    }
}

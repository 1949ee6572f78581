//! Rewrite and watch subcommand handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use cordial_cdp::PageTrigger;
use cordial_core::popup::WRONG_HOST_MESSAGE;
use cordial_core::{
    OrchestratorOptions, PopupController, RewriteOrchestrator, SelectorRegistry, SessionStore,
    is_on_host,
};
use cordial_protocols::{AttachedPage, RewriteResult, TabBridge, Tone};

use crate::app::App;
use crate::snapshot::SnapshotTabs;
use crate::status::{finish, follow};

fn editor_wait(app: &App) -> Duration {
    Duration::from_millis(app.config.locator.wait_timeout_ms)
}

fn with_wait(app: &App, popup: PopupController, wait: bool) -> PopupController {
    if wait {
        popup.with_editor_wait(editor_wait(app))
    } else {
        popup
    }
}

/// Rewrite the draft once, in the active tab or in a saved snapshot.
pub(crate) async fn rewrite(
    app: &App,
    tone: Option<Tone>,
    html: Option<PathBuf>,
    output: Option<PathBuf>,
    wait: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tone = tone.unwrap_or(app.config.rewrite.default_tone);

    let Some(html) = html else {
        let popup = with_wait(app, app.popup(app.browser()), wait);
        let line = follow(&popup, popup.rewrite(tone)).await;
        return finish(line);
    };

    let snapshot = Arc::new(SnapshotTabs::new(&app.config.popup.host, &read_snapshot(&html).await?));
    let popup = with_wait(app, app.popup(snapshot.clone()), wait);
    let line = follow(&popup, popup.rewrite(tone)).await;
    if line.is_error() {
        return finish(line);
    }

    let rewritten = snapshot.document().to_html();
    match output {
        Some(path) => {
            tokio::fs::write(&path, rewritten).await?;
            info!("Wrote rewritten snapshot to {}", path.display());
        }
        None => println!("{}", rewritten),
    }
    finish(line)
}

async fn read_snapshot(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
}

/// Serve the rewrite button and shortcut of the active tab until Ctrl+C.
pub(crate) async fn watch(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let tabs = app.browser();
    let tab = tabs
        .active_tab()
        .await?
        .ok_or("Could not access current tab. Please try again.")?;

    if !is_on_host(&tab, &app.config.popup.host) {
        return Err(WRONG_HOST_MESSAGE.into());
    }

    let page = tabs.attach_page(&tab).await?;
    let mut triggers = page.enable_triggers().await?;
    let orchestrator = Arc::new(RewriteOrchestrator::new(
        &AttachedPage::from_shared(page.clone()),
        Arc::new(SelectorRegistry::from_config(&app.config.selectors)),
        SessionStore::new(app.store.clone()),
        app.api.clone(),
        OrchestratorOptions::from_config(&app.config),
    ));

    println!("Watching {} (Ctrl+C to stop)", tab.title);
    info!(tab = %tab.id, "Serving page triggers");

    loop {
        tokio::select! {
            received = triggers.recv() => match received {
                Ok(PageTrigger::Rewrite { tone, source }) => {
                    info!(tone = %tone, source = ?source, "Rewrite triggered from page");
                    let orchestrator = orchestrator.clone();
                    tokio::spawn(async move {
                        let result = orchestrator.rewrite(tone).await;
                        if let RewriteResult::Failure { message, .. } = result {
                            eprintln!("✕ {}", message);
                        }
                    });
                }
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} page triggers", skipped),
                Err(RecvError::Closed) => {
                    println!("Tab closed.");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped.");
                break;
            }
        }
    }
    Ok(())
}

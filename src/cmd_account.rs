//! Account and credit subcommand handlers.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use cordial_cdp::AuthFeed;
use cordial_core::{CreditLedger, CreditSource, PopupView, SessionStore, auth_channel};

use crate::app::App;
use crate::status::{finish, follow};

/// Sign in through a browser tab opened on the sign-in page.
pub(crate) async fn login(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let tabs = app.browser();
    let popup = app.popup(tabs.clone());

    let tab = tabs.open_tab(&popup.login_url()).await?;
    println!("Complete the sign-in in the browser tab that just opened.");

    let (sender, receiver) = auth_channel();
    let feed = AuthFeed::new();
    let (relayed, line) = tokio::join!(
        feed.relay(&tab, &sender, app.store.as_ref()),
        follow(&popup, popup.login(receiver)),
    );
    match relayed {
        Ok(user) => debug!(email = %user.email, "Sign-in tab reported a user"),
        Err(e) => debug!("Sign-in tab stopped reporting: {}", e),
    }

    if let Err(e) = tabs.close_tab(tab.target_id()).await {
        debug!("Could not close sign-in tab: {}", e);
    }
    finish(line)
}

pub(crate) async fn logout(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let popup = app.popup(app.browser());
    finish(popup.logout().await)
}

/// Print the signed-in account, balance and daily claim state.
pub(crate) async fn status(app: &App, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let popup = app.popup(app.browser());
    let view = popup.view(Utc::now()).await;

    if format == "json" {
        let value = match &view {
            PopupView::SignedOut => json!({ "signed_in": false }),
            PopupView::SignedIn { session, credits, claim } => json!({
                "signed_in": true,
                "email": session.email,
                "name": session.name,
                "credits": credits.credits,
                "low_credits": credits.low,
                "cached": credits.source == CreditSource::Cached,
                "claim_available": claim.is_enabled(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match view {
        PopupView::SignedOut => println!("Not signed in. Run `cordial login`."),
        PopupView::SignedIn { session, credits, claim } => {
            let name = session.name.as_deref().unwrap_or(&session.email);
            println!("Signed in as {} <{}>", name, session.email);
            println!("Credits: {}{}", credits.credits, balance_note(credits.low, &credits.source));
            println!("Daily claim: {}", claim.label());
        }
    }
    Ok(())
}

fn balance_note(low: bool, source: &CreditSource) -> &'static str {
    match (low, source) {
        (_, CreditSource::Cached) => " (cached)",
        (true, _) => " (running low)",
        _ => "",
    }
}

/// Print the balance, refreshed from the server when reachable.
pub(crate) async fn credits(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = CreditLedger::new(
        app.api.clone(),
        SessionStore::new(app.store.clone()),
        &app.config.popup,
    );
    let view = ledger.refresh().await;
    if view.source == CreditSource::SignedOut {
        return Err("User authentication required".into());
    }
    println!("{}{}", view.credits, balance_note(view.low, &view.source));
    Ok(())
}

pub(crate) async fn claim(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let popup = app.popup(app.browser());
    let line = follow(&popup, popup.claim(Utc::now())).await;
    finish(line)
}

/// Create a checkout session and open it in the browser when one is reachable.
pub(crate) async fn buy(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let tabs = app.browser();
    let popup = app.popup(tabs.clone());
    let checkout = follow(&popup, popup.buy()).await;
    let url = checkout.checkout_url.clone();
    finish(checkout.status)?;

    let Some(url) = url else {
        return Ok(());
    };
    match tabs.open_tab(&url).await {
        Ok(_) => info!("Opened checkout page"),
        Err(e) => {
            warn!("Could not open checkout page in the browser: {}", e);
            println!("Open {} to complete the purchase.", url);
        }
    }
    Ok(())
}

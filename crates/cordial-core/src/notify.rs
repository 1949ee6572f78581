//! Notification sink that writes to the log.

use async_trait::async_trait;
use cordial_protocols::{Notification, NotificationKind, Notifier};
use tracing::{error, info, warn};

/// Notifier for surfaces without a page, such as the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Info | NotificationKind::Success => {
                info!(kind = notification.kind.as_str(), "{}", notification.message)
            }
            NotificationKind::Warning => warn!("{}", notification.message),
            NotificationKind::Error => error!("{}", notification.message),
        }
    }
}

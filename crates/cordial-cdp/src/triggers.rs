//! Rewrite requests raised from inside the page.

use cordial_protocols::Tone;
use serde::Deserialize;
use tracing::warn;

/// What the user used to ask for a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Button,
    Shortcut,
}

/// A request raised by the floating button or the keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTrigger {
    Rewrite { tone: Tone, source: TriggerSource },
}

#[derive(Debug, Deserialize)]
struct TriggerPayload {
    #[serde(default)]
    tone: Option<String>,
    source: TriggerSource,
}

impl PageTrigger {
    /// Decode a trigger binding payload. Unknown tones fall back to the
    /// default tone.
    pub(crate) fn from_payload(payload: &str) -> Option<Self> {
        let payload: TriggerPayload = match serde_json::from_str(payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Ignoring malformed page trigger: {}", e);
                return None;
            }
        };
        let tone = match payload.tone.as_deref().map(str::parse::<Tone>) {
            Some(Ok(tone)) => tone,
            Some(Err(e)) => {
                warn!("{}; using default tone", e);
                Tone::default()
            }
            None => Tone::default(),
        };
        Some(Self::Rewrite {
            tone,
            source: payload.source,
        })
    }
}

//! Alert escalation coordinator

use dms::AlertEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::sink::{AlertIntensity, OutputSink};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Events needed to trigger a voice message (default: 3)
    pub escalation_event_count: u32,
    /// Minimum time between voice messages (milliseconds)
    pub escalation_cooldown_ms: u64,
    /// Intents sent to the voice backend, used in rotation
    pub voice_prompts: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            escalation_event_count: 3,
            escalation_cooldown_ms: 30_000,
            voice_prompts: vec![
                "pep talk".to_string(),
                "scary voice".to_string(),
                "motivation".to_string(),
            ],
        }
    }
}

/// What the coordinator did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Low-tier alert only; counter now at `count`
    Counted { count: u32 },
    /// Threshold reached and a voice message was requested
    VoiceRequested { prompt: String },
    /// Threshold reached, request attempted but the sink failed
    VoiceFailed { prompt: String },
    /// Threshold reached inside the cooldown window
    Suppressed { remaining_ms: u64 },
}

/// Accumulate-and-fire reducer over alert events
///
/// Every event plays a low-tier alert and bumps the counter. When the counter
/// reaches the configured count it resets, and a voice message goes out if
/// the cooldown allows it.
pub struct EscalationCoordinator<S: OutputSink> {
    /// Configuration
    config: AlertConfig,
    sink: S,
    /// Events since the last escalation
    counter: u32,
    /// Last voice-message attempt
    last_escalation_at: Option<u64>,
    /// Next prompt to use
    prompt_cursor: usize,
}

impl<S: OutputSink> EscalationCoordinator<S> {
    /// Create a new coordinator
    pub fn new(config: AlertConfig, sink: S) -> Self {
        info!("Creating escalation coordinator with config: {:?}", config);
        Self {
            config,
            sink,
            counter: 0,
            last_escalation_at: None,
            prompt_cursor: 0,
        }
    }

    /// Handle one alert event
    pub fn handle(&mut self, event: AlertEvent) -> EscalationOutcome {
        let now_ms = event.at_ms;
        self.counter += 1;
        metrics::counter!("snooze_alerts_total", "kind" => event.kind.as_str()).increment(1);

        let intensity = AlertIntensity::for_kind(event.kind);
        if let Err(e) = self.sink.fire_alert(event.kind, intensity) {
            metrics::counter!("snooze_sink_failures_total").increment(1);
            warn!("Low-tier alert for {} failed: {}", event.kind, e);
        }

        if self.counter < self.config.escalation_event_count.max(1) {
            debug!(
                "Alert {} counted ({}/{})",
                event.kind, self.counter, self.config.escalation_event_count
            );
            return EscalationOutcome::Counted {
                count: self.counter,
            };
        }

        self.counter = 0;

        if let Some(remaining_ms) = self.cooldown_remaining(now_ms) {
            metrics::counter!("snooze_escalations_suppressed_total").increment(1);
            info!("Escalation suppressed: {} ms of cooldown left", remaining_ms);
            return EscalationOutcome::Suppressed { remaining_ms };
        }

        let prompt = self.next_prompt();
        self.last_escalation_at = Some(now_ms);
        metrics::counter!("snooze_escalations_total").increment(1);

        match self.sink.request_voice_message(&prompt) {
            Ok(()) => {
                info!("Escalated to voice message: {}", prompt);
                EscalationOutcome::VoiceRequested { prompt }
            }
            Err(e) => {
                metrics::counter!("snooze_sink_failures_total").increment(1);
                warn!("Voice message request failed: {}", e);
                EscalationOutcome::VoiceFailed { prompt }
            }
        }
    }

    /// Handle events in order
    pub fn handle_all<I>(&mut self, events: I) -> Vec<EscalationOutcome>
    where
        I: IntoIterator<Item = AlertEvent>,
    {
        events.into_iter().map(|e| self.handle(e)).collect()
    }

    fn cooldown_remaining(&self, now_ms: u64) -> Option<u64> {
        let last = self.last_escalation_at?;
        let elapsed = now_ms.saturating_sub(last);
        (elapsed < self.config.escalation_cooldown_ms)
            .then(|| self.config.escalation_cooldown_ms - elapsed)
    }

    fn next_prompt(&mut self) -> String {
        if self.config.voice_prompts.is_empty() {
            return "stay awake".to_string();
        }
        let index = self.prompt_cursor % self.config.voice_prompts.len();
        let prompt = self.config.voice_prompts[index].clone();
        self.prompt_cursor = self.prompt_cursor.wrapping_add(1);
        prompt
    }

    /// Events counted toward the next escalation
    pub fn pending_count(&self) -> u32 {
        self.counter
    }

    pub fn last_escalation_at(&self) -> Option<u64> {
        self.last_escalation_at
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Clear counter and cooldown (session stop)
    pub fn reset(&mut self) {
        self.counter = 0;
        self.last_escalation_at = None;
        self.prompt_cursor = 0;
    }
}

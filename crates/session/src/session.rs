//! Session lifecycle
//!
//! A [`Session`] is the single reducer both pipelines feed. Video ticks go
//! through the [`DmsModule`], audio ticks through the [`AudioCueMachine`], and
//! every resulting event lands in the one [`EscalationCoordinator`]. Monitoring
//! state is rebuilt on every start and dropped on stop, so nothing can fire
//! after a stop.

use alerting::{AlertConfig, EscalationCoordinator, EscalationOutcome, OutputSink};
use dms::{AlertEvent, AudioCueMachine, AudioLabel, DmsAnalysis, DmsConfig, DmsModule};
use face_signals::LandmarkFrame;
use tracing::{debug, info, info_span, Span};
use uuid::Uuid;

use crate::provider::{AudioClassifier, LandmarkDetector};
use crate::SessionError;

/// Result of one video tick
#[derive(Debug, Clone)]
pub struct VideoTick {
    pub analysis: DmsAnalysis,
    pub outcomes: Vec<EscalationOutcome>,
}

/// Counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub video_ticks: u64,
    pub audio_ticks: u64,
    pub events: u64,
    pub voice_requests: u64,
}

struct ActiveSession {
    id: Uuid,
    dms: DmsModule,
    audio: AudioCueMachine,
    stats: SessionStats,
    span: Span,
}

/// One monitored subject, from start to stop
pub struct Session<S: OutputSink> {
    dms_config: DmsConfig,
    coordinator: EscalationCoordinator<S>,
    active: Option<ActiveSession>,
}

impl<S: OutputSink> Session<S> {
    /// Create a stopped session
    pub fn new(dms_config: DmsConfig, alert_config: AlertConfig, sink: S) -> Result<Self, SessionError> {
        dms_config.validate()?;
        Ok(Self {
            dms_config,
            coordinator: EscalationCoordinator::new(alert_config, sink),
            active: None,
        })
    }

    /// Start monitoring with fresh calibration and timers
    pub fn start(&mut self) -> Result<Uuid, SessionError> {
        if self.active.is_some() {
            self.stop();
        }

        let id = Uuid::new_v4();
        let span = info_span!("session", id = %id);
        span.in_scope(|| info!("Session started"));

        self.coordinator.reset();
        self.active = Some(ActiveSession {
            id,
            dms: DmsModule::new(self.dms_config.clone())?,
            audio: AudioCueMachine::new(self.dms_config.audio.clone()),
            stats: SessionStats::default(),
            span,
        });
        Ok(id)
    }

    /// Stop monitoring; all dwell, idle and escalation state is discarded
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.span.in_scope(|| {
                info!(
                    "Session stopped: {} video ticks, {} audio ticks, {} events, {} voice requests",
                    active.stats.video_ticks,
                    active.stats.audio_ticks,
                    active.stats.events,
                    active.stats.voice_requests
                )
            });
        }
        self.coordinator.reset();
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn stats(&self) -> Option<SessionStats> {
        self.active.as_ref().map(|a| a.stats)
    }

    /// Feed one video tick; ignored while stopped
    pub fn on_video_tick(&mut self, now_ms: u64, frame: Option<&LandmarkFrame>) -> Option<VideoTick> {
        let active = self.active.as_mut()?;
        let _entered = active.span.clone().entered();

        active.stats.video_ticks += 1;
        let analysis = active.dms.analyze(now_ms, frame);
        let outcomes = Self::escalate(&mut self.coordinator, &mut active.stats, &analysis.events);

        Some(VideoTick { analysis, outcomes })
    }

    /// Feed one classified audio buffer; ignored while stopped
    pub fn on_audio_tick(&mut self, now_ms: u64, labels: Option<&[AudioLabel]>) -> Vec<EscalationOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let _entered = active.span.clone().entered();

        active.stats.audio_ticks += 1;
        let events: Vec<AlertEvent> = active.audio.update(labels, now_ms).into_iter().collect();
        Self::escalate(&mut self.coordinator, &mut active.stats, &events)
    }

    /// Run a detector on raw input and feed its result
    pub fn process_video<D: LandmarkDetector>(
        &mut self,
        now_ms: u64,
        detector: &mut D,
        input: &D::Input,
    ) -> Option<VideoTick> {
        if !self.is_running() {
            return None;
        }
        let frame = detector.detect(input);
        self.on_video_tick(now_ms, frame.as_ref())
    }

    /// Run a classifier on an audio buffer and feed its result
    pub fn process_audio<C: AudioClassifier>(
        &mut self,
        now_ms: u64,
        classifier: &mut C,
        buffer: &[f32],
    ) -> Vec<EscalationOutcome> {
        if !self.is_running() {
            return Vec::new();
        }
        let labels = classifier.classify(buffer);
        self.on_audio_tick(now_ms, labels.as_deref())
    }

    /// Idle check on the polling cadence
    pub fn poll_idle(&mut self, now_ms: u64) -> Vec<EscalationOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let _entered = active.span.clone().entered();

        let events: Vec<AlertEvent> = active.dms.poll_idle(now_ms).into_iter().collect();
        Self::escalate(&mut self.coordinator, &mut active.stats, &events)
    }

    /// Relearn the pitch baseline
    pub fn recalibrate(&mut self) {
        if let Some(active) = self.active.as_mut() {
            let _entered = active.span.clone().entered();
            active.dms.recalibrate();
        }
    }

    pub fn coordinator(&self) -> &EscalationCoordinator<S> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut EscalationCoordinator<S> {
        &mut self.coordinator
    }

    fn escalate(
        coordinator: &mut EscalationCoordinator<S>,
        stats: &mut SessionStats,
        events: &[AlertEvent],
    ) -> Vec<EscalationOutcome> {
        events
            .iter()
            .map(|event| {
                debug!("Dispatching {} event at {} ms", event.kind, event.at_ms);
                stats.events += 1;
                let outcome = coordinator.handle(*event);
                if matches!(
                    outcome,
                    EscalationOutcome::VoiceRequested { .. } | EscalationOutcome::VoiceFailed { .. }
                ) {
                    stats.voice_requests += 1;
                }
                outcome
            })
            .collect()
    }
}

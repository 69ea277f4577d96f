//! Async session runtime
//!
//! Video and audio producers run at their own rates, possibly on different
//! tasks. Both send [`EngineMessage`]s into one channel, and a single task
//! owns the [`Session`], so every update reaches the coordinator in arrival
//! order. The same task polls the idle monitor on a fixed interval.

use std::time::Duration;

use alerting::OutputSink;
use dms::AudioLabel;
use face_signals::LandmarkFrame;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{RuntimeConfig, Session, SessionError};

/// Message delivered to the session task
#[derive(Debug, Clone)]
pub enum EngineMessage {
    /// Detection result for one video frame, stamped at capture
    Video {
        at_ms: u64,
        frame: Option<LandmarkFrame>,
    },
    /// Classification result for one audio buffer, stamped at capture
    Audio {
        at_ms: u64,
        labels: Option<Vec<AudioLabel>>,
    },
    /// Relearn the pitch baseline
    Recalibrate,
    /// Stop the session and end the task
    Stop,
}

/// Producer-side handle to a running session
pub struct SessionHandle<S: OutputSink> {
    tx: mpsc::Sender<EngineMessage>,
    clock: Instant,
    task: JoinHandle<Session<S>>,
}

impl<S: OutputSink + Send + 'static> SessionHandle<S> {
    /// Milliseconds since the session was spawned
    pub fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    /// Another sender for a producer running on its own task
    pub fn sender(&self) -> mpsc::Sender<EngineMessage> {
        self.tx.clone()
    }

    async fn send(&self, message: EngineMessage) -> Result<(), SessionError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Submit a detection result stamped with the current session time
    pub async fn video_tick(&self, frame: Option<LandmarkFrame>) -> Result<(), SessionError> {
        let at_ms = self.now_ms();
        self.send(EngineMessage::Video { at_ms, frame }).await
    }

    /// Submit a classification result stamped with the current session time
    pub async fn audio_tick(&self, labels: Option<Vec<AudioLabel>>) -> Result<(), SessionError> {
        let at_ms = self.now_ms();
        self.send(EngineMessage::Audio { at_ms, labels }).await
    }

    pub async fn recalibrate(&self) -> Result<(), SessionError> {
        self.send(EngineMessage::Recalibrate).await
    }

    /// Stop the session and get it back once the task has drained
    pub async fn stop(self) -> Result<Session<S>, SessionError> {
        // The task may already be gone if every sender was dropped.
        let _ = self.tx.send(EngineMessage::Stop).await;
        self.task
            .await
            .map_err(|e| SessionError::Task(e.to_string()))
    }
}

/// Start `session` and run it on a new task
pub fn spawn_session<S>(
    mut session: Session<S>,
    config: &RuntimeConfig,
) -> Result<SessionHandle<S>, SessionError>
where
    S: OutputSink + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel(config.channel_capacity.max(1));
    let clock = Instant::now();
    let poll_every = Duration::from_millis(config.idle_poll_interval_ms.max(1));

    session.start()?;

    let task = tokio::spawn(async move {
        let mut poll = tokio::time::interval(poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(EngineMessage::Video { at_ms, frame }) => {
                        session.on_video_tick(at_ms, frame.as_ref());
                    }
                    Some(EngineMessage::Audio { at_ms, labels }) => {
                        session.on_audio_tick(at_ms, labels.as_deref());
                    }
                    Some(EngineMessage::Recalibrate) => session.recalibrate(),
                    Some(EngineMessage::Stop) => {
                        debug!("Stop requested");
                        break;
                    }
                    None => {
                        warn!("All session senders dropped, stopping");
                        break;
                    }
                },
                _ = poll.tick() => {
                    let now_ms = clock.elapsed().as_millis() as u64;
                    session.poll_idle(now_ms);
                }
            }
        }

        session.stop();
        info!("Session task finished");
        session
    });

    Ok(SessionHandle { tx, clock, task })
}

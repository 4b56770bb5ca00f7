//! Sequential narration over a paragraph list.
//!
//! [`NarrationEngine`] is a handle to a driver task that owns all playback
//! state and feeds the speech synthesizer one utterance at a time. Commands
//! and utterance completions arrive over channels, so every transition is
//! processed in one place and interleavings (skip racing a completion, a new
//! `speak` racing an old utterance) cannot corrupt the sequence: each
//! utterance carries an id, and completions for a superseded id are ignored.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use vorleser_text::strip_invisible;
use vorleser_types::NarrationSettings;

use crate::error::{NarrationError, Result};
use crate::synth::{SpeechSynthesizer, Utterance, UtteranceOutcome, Voice};

/// Position and transport events delivered to the active subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    /// Narration moved to this paragraph index. Fired for skipped blank
    /// paragraphs too, so position displays never miss an index.
    Paragraph(usize),
    /// The end of the paragraph list was reached.
    Completed,
    /// Synthesis failed and narration went idle.
    Failed(String),
}

/// Snapshot of engine state for display polling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationSnapshot {
    pub is_playing: bool,
    pub is_paused: bool,
    pub current_index: usize,
    pub paragraph_count: usize,
}

/// Handle to the narration driver. One engine exists per process; it models
/// the single audio channel, so a new `speak` silently replaces whatever was
/// playing and the previous subscriber's event stream ends.
pub struct NarrationEngine {
    commands: mpsc::UnboundedSender<Command>,
    synth: Arc<dyn SpeechSynthesizer>,
    snapshot: watch::Receiver<NarrationSnapshot>,
}

enum Command {
    Speak {
        paragraphs: Vec<String>,
        start_index: usize,
        settings: NarrationSettings,
        events: mpsc::UnboundedSender<NarrationEvent>,
    },
    Pause,
    Resume {
        settings: NarrationSettings,
    },
    Stop,
    SkipNext,
    SkipPrevious,
    UpdateParagraphs {
        paragraphs: Vec<String>,
    },
}

struct UtteranceDone {
    id: u64,
    outcome: Result<UtteranceOutcome>,
}

impl NarrationEngine {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(NarrationSnapshot::default());
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            synth: synth.clone(),
            commands: command_rx,
            feedback: feedback_rx,
            feedback_tx,
            snapshot: snapshot_tx,
            phase: Phase::Idle,
            paragraphs: Vec::new(),
            index: 0,
            settings: NarrationSettings::default(),
            events: None,
            utterance_seq: 0,
        };
        tokio::spawn(driver.run());

        Self {
            commands: command_tx,
            synth,
            snapshot: snapshot_rx,
        }
    }

    /// Start speaking `paragraphs` from `start_index`, replacing any active
    /// playback and subscriber. Returns the event stream for this playback;
    /// the stream ends when a later `speak` takes over.
    pub fn speak(
        &self,
        paragraphs: Vec<String>,
        start_index: usize,
        settings: NarrationSettings,
    ) -> Result<mpsc::UnboundedReceiver<NarrationEvent>> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.send(Command::Speak {
            paragraphs,
            start_index,
            settings,
            events: events_tx,
        })?;
        Ok(events_rx)
    }

    /// Halt audio but keep the current position for a later `resume`.
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Restart the current paragraph from its beginning. Mid-utterance
    /// resume is not something synthesizers guarantee, so the whole
    /// paragraph is spoken again.
    pub fn resume(&self, settings: NarrationSettings) -> Result<()> {
        self.send(Command::Resume { settings })
    }

    /// Go idle, preserving the current index. Safe to call at any time,
    /// including when already idle.
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Jump to the next paragraph. No-op at the end of the list.
    pub fn skip_next(&self) -> Result<()> {
        self.send(Command::SkipNext)
    }

    /// Jump to the previous paragraph. No-op at index zero.
    pub fn skip_previous(&self) -> Result<()> {
        self.send(Command::SkipPrevious)
    }

    /// Replace the paragraph list without interrupting playback. Used when
    /// a continuous-reading session grows the buffer past the end the
    /// engine currently knows about.
    pub fn update_paragraphs(&self, paragraphs: Vec<String>) -> Result<()> {
        self.send(Command::UpdateParagraphs { paragraphs })
    }

    pub fn state(&self) -> NarrationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn voices(&self) -> Result<Vec<Voice>> {
        self.synth.voices().await
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| NarrationError::EngineStopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Speaking,
    Paused,
}

struct Driver {
    synth: Arc<dyn SpeechSynthesizer>,
    commands: mpsc::UnboundedReceiver<Command>,
    feedback: mpsc::UnboundedReceiver<UtteranceDone>,
    feedback_tx: mpsc::UnboundedSender<UtteranceDone>,
    snapshot: watch::Sender<NarrationSnapshot>,
    phase: Phase,
    paragraphs: Vec<String>,
    index: usize,
    settings: NarrationSettings,
    events: Option<mpsc::UnboundedSender<NarrationEvent>>,
    /// Id of the utterance currently expected. Bumped to invalidate
    /// whatever is in flight; completions with an older id are stale.
    utterance_seq: u64,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    // Engine handle dropped; any in-flight utterance task
                    // ends on its own.
                    None => break,
                },
                Some(done) = self.feedback.recv() => {
                    self.handle_utterance_done(done);
                }
            }
            self.publish();
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Speak {
                paragraphs,
                start_index,
                settings,
                events,
            } => {
                self.cut_audio().await;
                self.paragraphs = paragraphs;
                self.index = start_index;
                self.settings = settings;
                // Replacing the sender closes the previous subscriber's
                // stream; its callbacks are stale from here on.
                self.events = Some(events);
                self.phase = Phase::Speaking;
                self.begin_paragraph();
            }
            Command::Pause => {
                if self.phase == Phase::Speaking {
                    self.cut_audio().await;
                    self.phase = Phase::Paused;
                }
            }
            Command::Resume { settings } => {
                if self.phase == Phase::Paused {
                    self.settings = settings;
                    self.phase = Phase::Speaking;
                    self.begin_paragraph();
                }
            }
            Command::Stop => {
                if self.phase != Phase::Idle {
                    self.cut_audio().await;
                    self.phase = Phase::Idle;
                }
            }
            Command::SkipNext => {
                if self.phase != Phase::Idle && self.index + 1 < self.paragraphs.len() {
                    self.cut_audio().await;
                    self.index += 1;
                    self.phase = Phase::Speaking;
                    self.begin_paragraph();
                }
            }
            Command::SkipPrevious => {
                if self.phase != Phase::Idle && self.index > 0 {
                    self.cut_audio().await;
                    self.index -= 1;
                    self.phase = Phase::Speaking;
                    self.begin_paragraph();
                }
            }
            Command::UpdateParagraphs { paragraphs } => {
                self.paragraphs = paragraphs;
                if !self.paragraphs.is_empty() && self.index >= self.paragraphs.len() {
                    self.index = self.paragraphs.len() - 1;
                }
            }
        }
    }

    fn handle_utterance_done(&mut self, done: UtteranceDone) {
        if done.id != self.utterance_seq || self.phase != Phase::Speaking {
            return;
        }
        match done.outcome {
            Ok(UtteranceOutcome::Finished) => {
                self.index += 1;
                self.begin_paragraph();
            }
            // A cut utterance's successor was already decided by the
            // command that cut it.
            Ok(UtteranceOutcome::Cut) => {}
            Err(e) => {
                tracing::warn!("Speech synthesis failed: {}", e);
                self.phase = Phase::Idle;
                self.emit(NarrationEvent::Failed(e.to_string()));
            }
        }
    }

    /// Speak the paragraph at the current index, walking over blank
    /// paragraphs, or complete if the list is exhausted.
    fn begin_paragraph(&mut self) {
        while self.index < self.paragraphs.len() {
            self.emit(NarrationEvent::Paragraph(self.index));
            let text = strip_invisible(&self.paragraphs[self.index]);
            if text.is_empty() {
                self.index += 1;
                continue;
            }
            self.spawn_utterance(text);
            return;
        }

        self.phase = Phase::Idle;
        self.index = self.paragraphs.len().saturating_sub(1);
        self.emit(NarrationEvent::Completed);
    }

    fn spawn_utterance(&mut self, text: String) {
        self.utterance_seq += 1;
        let id = self.utterance_seq;
        let utterance = Utterance {
            text,
            settings: self.settings.clone(),
        };
        let synth = self.synth.clone();
        let feedback = self.feedback_tx.clone();
        tokio::spawn(async move {
            let outcome = synth.speak(utterance).await;
            let _ = feedback.send(UtteranceDone { id, outcome });
        });
    }

    /// Stop the synthesizer and invalidate the in-flight utterance.
    async fn cut_audio(&mut self) {
        self.utterance_seq += 1;
        self.synth.stop().await;
    }

    fn emit(&self, event: NarrationEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(NarrationSnapshot {
            is_playing: self.phase == Phase::Speaking,
            is_paused: self.phase == Phase::Paused,
            current_index: self.index,
            paragraph_count: self.paragraphs.len(),
        });
    }
}

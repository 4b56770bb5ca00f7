//! Text-to-speech narration engine.
//!
//! The engine walks a list of paragraphs and hands them to a
//! [`SpeechSynthesizer`] one at a time, exposing transport controls
//! (pause, resume, stop, skip) and a position event stream. Synthesizers
//! are pluggable; [`SilentSynthesizer`] paces itself by word count and is
//! what the CLI uses, since real audio output is platform territory.

pub mod engine;
pub mod error;
pub mod synth;

pub use engine::{NarrationEngine, NarrationEvent, NarrationSnapshot};
pub use error::{NarrationError, Result};
pub use synth::{SilentSynthesizer, SpeechSynthesizer, Utterance, UtteranceOutcome, Voice};

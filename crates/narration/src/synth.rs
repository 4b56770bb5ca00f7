//! Speech synthesizer contract and the built-in silent backend.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use vorleser_types::NarrationSettings;

use crate::error::Result;

/// One piece of text to synthesize, with the voice parameters to apply.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub settings: NarrationSettings,
}

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Played through to its natural end.
    Finished,
    /// Cut short by [`SpeechSynthesizer::stop`].
    Cut,
}

/// An available synthesizer voice.
#[derive(Debug, Clone)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Device speech backend.
///
/// At most one utterance is in flight at a time; `speak` resolves when the
/// utterance finishes or promptly after `stop` cuts it.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, utterance: Utterance) -> Result<UtteranceOutcome>;

    /// Cut the in-flight utterance, if any. Calling with nothing in flight
    /// is a no-op.
    async fn stop(&self);

    async fn voices(&self) -> Result<Vec<Voice>>;
}

/// Synthesizer that produces no audio, pacing itself by word count.
///
/// Stands in for a device backend on platforms without one (the CLI) and
/// in tests, where [`SilentSynthesizer::instant`] removes the pacing.
pub struct SilentSynthesizer {
    delay_per_word: Duration,
    cancel: Notify,
}

impl SilentSynthesizer {
    /// Paced at roughly 200 words per minute before the rate setting is
    /// applied.
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(300))
    }

    /// Completes every utterance without delay.
    pub fn instant() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay_per_word: Duration) -> Self {
        Self {
            delay_per_word,
            cancel: Notify::new(),
        }
    }

    fn utterance_duration(&self, utterance: &Utterance) -> Duration {
        let words = vorleser_text::count_words(&utterance.text).max(1) as f32;
        let rate = utterance.settings.rate.max(0.1);
        self.delay_per_word.mul_f32(words / rate)
    }
}

impl Default for SilentSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, utterance: Utterance) -> Result<UtteranceOutcome> {
        let duration = self.utterance_duration(&utterance);
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(UtteranceOutcome::Finished),
            _ = self.cancel.notified() => Ok(UtteranceOutcome::Cut),
        }
    }

    async fn stop(&self) {
        // Wakes current waiters only, so an utterance started later is not
        // affected by a stop that raced ahead of it.
        self.cancel.notify_waiters();
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        Ok(vec![Voice {
            id: "silent".to_string(),
            name: "Silent".to_string(),
            language: "en-US".to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn utterance(text: &str, rate: f32) -> Utterance {
        Utterance {
            text: text.to_string(),
            settings: NarrationSettings {
                rate,
                ..NarrationSettings::default()
            },
        }
    }

    #[tokio::test]
    async fn instant_synth_finishes() {
        let synth = SilentSynthesizer::instant();
        let outcome = synth.speak(utterance("hello world", 1.0)).await.unwrap();
        assert_eq!(outcome, UtteranceOutcome::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn paced_synth_scales_with_words_and_rate() {
        let synth = SilentSynthesizer::new();
        let start = tokio::time::Instant::now();
        synth.speak(utterance("one two three four", 2.0)).await.unwrap();
        // 4 words at 300ms each, halved by the doubled rate.
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cuts_in_flight_utterance() {
        let synth = Arc::new(SilentSynthesizer::new());
        let speaking = {
            let synth = synth.clone();
            tokio::spawn(async move { synth.speak(utterance("a very long paragraph", 1.0)).await })
        };

        // Let the utterance reach its select before cutting it.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        synth.stop().await;

        let outcome = speaking.await.unwrap().unwrap();
        assert_eq!(outcome, UtteranceOutcome::Cut);
    }

    #[tokio::test]
    async fn stop_with_nothing_in_flight_is_harmless() {
        let synth = SilentSynthesizer::instant();
        synth.stop().await;
        let outcome = synth.speak(utterance("still works", 1.0)).await.unwrap();
        assert_eq!(outcome, UtteranceOutcome::Finished);
    }
}

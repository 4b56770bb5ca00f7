//! Reading statistics and the session log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use vorleser_storage::KeyValueStore;
use vorleser_types::{ReadingStats, SessionRecord};

use crate::doc;
use crate::error::Result;

const STATS_KEY: &str = "vorleser.stats";

/// How many finished sessions the log keeps, newest first.
const SESSION_LOG_CAP: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsDoc {
    stats: ReadingStats,
    sessions: Vec<SessionRecord>,
}

/// Aggregates finished reading sessions into totals and day streaks.
pub struct Statistics {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<StatsDoc>,
}

impl Statistics {
    pub async fn open(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let document = doc::load_or_default(kv.as_ref(), STATS_KEY).await?;
        Ok(Self {
            kv,
            state: Mutex::new(document),
        })
    }

    /// Fold one finished session into the totals and the session log.
    ///
    /// Streaks move on the session's end date: a session on the day after
    /// the last recorded one extends the streak, a longer gap resets it,
    /// same-day sessions leave it unchanged.
    pub async fn record_session(&self, record: SessionRecord) -> Result<()> {
        let mut state = self.state.lock().await;

        let today = record.ended_at.date_naive();
        let yesterday = (today - chrono::Duration::days(1)).to_string();
        let today = today.to_string();

        let stats = &mut state.stats;
        stats.total_reading_time += record.minutes();
        stats.total_words_read += record.words_read;
        stats.total_chapters_read += u64::from(record.chapters_read);
        match &stats.last_read_date {
            Some(last) if *last == today => {}
            Some(last) if *last == yesterday => stats.current_streak += 1,
            _ => stats.current_streak = 1,
        }
        stats.longest_streak = stats.longest_streak.max(stats.current_streak);
        stats.last_read_date = Some(today);

        state.sessions.insert(0, record);
        state.sessions.truncate(SESSION_LOG_CAP);

        self.persist(&state).await
    }

    pub async fn stats(&self) -> ReadingStats {
        self.state.lock().await.stats.clone()
    }

    /// The session log, newest first.
    pub async fn sessions(&self) -> Vec<SessionRecord> {
        self.state.lock().await.sessions.clone()
    }

    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = StatsDoc::default();
        self.persist(&state).await
    }

    async fn persist(&self, document: &StatsDoc) -> Result<()> {
        doc::persist(self.kv.as_ref(), STATS_KEY, document).await?;
        Ok(())
    }
}

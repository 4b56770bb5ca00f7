//! One open reading context over a continuous paragraph buffer.
//!
//! A session resolves chapters through [`ContentSource`] into an append-only
//! buffer of paragraphs and keeps display position, narration and persisted
//! progress consistent while the buffer grows in either direction. Loads are
//! serialized through the session's state lock, so a position update and the
//! chapter load it triggers are atomic with respect to every other session
//! operation.
//!
//! Narration indices are translated through `narration_base`: the engine's
//! window is always `paragraphs[narration_base..]`, so appends only grow the
//! window's end and a prepend bumps the base without disturbing the engine's
//! own coordinates.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use vorleser_narration::{NarrationEngine, NarrationEvent};
use vorleser_text::count_words;
use vorleser_types::{ChapterStub, NovelId, ReadingProgress, SessionRecord};

use crate::error::{ReaderError, Result};
use crate::progress::ProgressTracker;
use crate::settings::SettingsStore;
use crate::source::ContentSource;
use crate::stats::Statistics;

/// How close to a buffer edge the position may get before the adjacent
/// chapter is loaded.
const PREFETCH_THRESHOLD: usize = 3;

/// Interval between automatic progress saves.
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Narration progress as seen by the session's consumer, in global buffer
/// indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Paragraph(usize),
    /// Narration reached the end of the last chapter.
    Finished,
    /// Narration stopped after a failure. The session stays open.
    Failed(String),
}

/// The collaborators a session works against.
#[derive(Clone)]
pub struct SessionServices {
    pub source: Arc<ContentSource>,
    pub engine: Arc<NarrationEngine>,
    pub progress: Arc<ProgressTracker>,
    pub stats: Arc<Statistics>,
    pub settings: Arc<SettingsStore>,
}

pub struct ReadingSession {
    shared: Arc<Shared>,
}

struct Shared {
    source: Arc<ContentSource>,
    engine: Arc<NarrationEngine>,
    progress: Arc<ProgressTracker>,
    stats: Arc<Statistics>,
    settings: Arc<SettingsStore>,
    state: Mutex<SessionState>,
}

/// One loaded chapter's stretch of the paragraph buffer, in buffer order.
struct ChapterSpan {
    chapter_index: usize,
    len: usize,
}

struct SessionState {
    novel_id: NovelId,
    novel_title: String,
    cover_image: Option<String>,
    /// The novel's full ordered chapter list.
    chapters: Vec<ChapterStub>,
    spans: Vec<ChapterSpan>,
    paragraphs: Vec<String>,
    /// Chapter-list indices of the first and last loaded chapters. The
    /// loaded range is always contiguous.
    first_loaded: usize,
    last_loaded: usize,
    position: usize,
    /// High-water position mark; paragraphs behind it count as read.
    furthest: usize,
    narration_base: usize,
    narrating: bool,
    words_read: u64,
    /// Chapter-list indices the position has touched.
    visited: HashSet<usize>,
    started_at: DateTime<Utc>,
    autosave: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
    closed: bool,
}

impl SessionState {
    /// Map a global paragraph index to its owning chapter and the offset
    /// within it.
    fn owning_chapter(&self, global: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for span in &self.spans {
            if global < start + span.len {
                return Some((span.chapter_index, global - start));
            }
            start += span.len;
        }
        None
    }

    fn note_position(&mut self, global: usize) {
        let clamped = global.min(self.paragraphs.len().saturating_sub(1));
        self.position = clamped;
        if clamped > self.furthest {
            let words: usize = self.paragraphs[self.furthest..clamped]
                .iter()
                .map(|p| count_words(p))
                .sum();
            self.words_read += words as u64;
            self.furthest = clamped;
        }
        if let Some((chapter_index, _)) = self.owning_chapter(clamped) {
            self.visited.insert(chapter_index);
        }
    }

    fn append_chapter(&mut self, chapter_index: usize, paragraphs: &[String]) {
        self.spans.push(ChapterSpan {
            chapter_index,
            len: paragraphs.len(),
        });
        self.paragraphs.extend_from_slice(paragraphs);
        self.last_loaded = chapter_index;
    }

    /// Prepend a chapter, shifting every global index by its length.
    fn prepend_chapter(&mut self, chapter_index: usize, paragraphs: &[String]) {
        let added = paragraphs.len();
        self.spans.insert(
            0,
            ChapterSpan {
                chapter_index,
                len: added,
            },
        );
        self.paragraphs.splice(0..0, paragraphs.iter().cloned());
        self.first_loaded = chapter_index;
        self.position += added;
        self.furthest += added;
        self.narration_base += added;
    }

    fn engine_window(&self) -> Vec<String> {
        self.paragraphs[self.narration_base..].to_vec()
    }

    fn progress_snapshot(&self) -> ReadingProgress {
        let (chapter_index, offset) = self
            .owning_chapter(self.position)
            .unwrap_or((self.first_loaded, 0));
        let stub = &self.chapters[chapter_index];
        ReadingProgress {
            novel_id: self.novel_id.clone(),
            novel_title: self.novel_title.clone(),
            chapter_id: stub.id.clone(),
            chapter_title: stub.title.clone(),
            chapter_index,
            paragraph_index: offset,
            cover_image: self.cover_image.clone(),
            updated_at: Utc::now(),
        }
    }

    fn session_record(&self) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            novel_id: self.novel_id.clone(),
            novel_title: self.novel_title.clone(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            words_read: self.words_read,
            chapters_read: self.visited.len().saturating_sub(1) as u32,
        }
    }
}

impl ReadingSession {
    /// Open a session on `chapters[start_chapter]`, resolving it as the
    /// first segment of the paragraph buffer. An out-of-range start chapter
    /// is clamped to the last one.
    pub async fn open(
        novel: NovelId,
        novel_title: impl Into<String>,
        cover_image: Option<String>,
        chapters: Vec<ChapterStub>,
        start_chapter: usize,
        services: SessionServices,
    ) -> Result<Self> {
        if chapters.is_empty() {
            return Err(ReaderError::NoChapters);
        }
        let start_chapter = start_chapter.min(chapters.len() - 1);
        let stub = chapters[start_chapter].clone();
        let resolved = services.source.resolve(&novel, &stub).await?;

        let novel_title = novel_title.into();
        tracing::info!(
            "Opened reading session for '{}' at chapter {} ({} paragraphs)",
            novel_title,
            stub.id,
            resolved.paragraphs.len()
        );

        let mut visited = HashSet::new();
        visited.insert(start_chapter);
        let state = SessionState {
            novel_id: novel,
            novel_title,
            cover_image,
            chapters,
            spans: vec![ChapterSpan {
                chapter_index: start_chapter,
                len: resolved.paragraphs.len(),
            }],
            paragraphs: resolved.paragraphs.clone(),
            first_loaded: start_chapter,
            last_loaded: start_chapter,
            position: 0,
            furthest: 0,
            narration_base: 0,
            narrating: false,
            words_read: 0,
            visited,
            started_at: Utc::now(),
            autosave: None,
            pump: None,
            closed: false,
        };

        let shared = Arc::new(Shared {
            source: services.source,
            engine: services.engine,
            progress: services.progress,
            stats: services.stats,
            settings: services.settings,
            state: Mutex::new(state),
        });

        let autosave = tokio::spawn(Self::autosave_loop(Arc::downgrade(&shared)));
        shared.state.lock().await.autosave = Some(autosave);

        Ok(Self { shared })
    }

    /// Report the consumer's position, in global buffer indices. Within
    /// [`PREFETCH_THRESHOLD`] of the buffer's end this loads and appends the
    /// next chapter; near the top it prepends the previous one, shifting
    /// every global index by the prepended length. Returns the position
    /// after any shift.
    ///
    /// A load failure leaves the position updated and the session usable;
    /// the error is the client's, so the caller can decide about retrying.
    pub async fn visible_paragraph(&self, index: usize) -> Result<usize> {
        let mut state = self.shared.state.lock().await;
        if state.closed {
            return Err(ReaderError::SessionClosed);
        }
        self.shared.advance_at(&mut state, index).await
    }

    /// Start narration at a global paragraph index, replacing any narration
    /// already playing. Narration advances the session position and extends
    /// the buffer exactly like visible scrolling does; when it runs off the
    /// end of a chapter it continues seamlessly into the next one.
    pub async fn narrate_from(&self, index: usize) -> Result<mpsc::UnboundedReceiver<SessionEvent>> {
        let settings = self.shared.settings.settings().await.narration;
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let mut state = self.shared.state.lock().await;
        if state.closed {
            return Err(ReaderError::SessionClosed);
        }
        let index = index.min(state.paragraphs.len().saturating_sub(1));
        state.narration_base = 0;
        state.narrating = true;
        state.note_position(index);

        let events = self
            .shared
            .engine
            .speak(state.paragraphs.clone(), index, settings)?;
        let pump = tokio::spawn(Shared::pump_events(
            Arc::clone(&self.shared),
            events,
            out_tx,
        ));
        if let Some(old) = state.pump.replace(pump) {
            old.abort();
        }
        Ok(out_rx)
    }

    /// Stop narration but keep the session open.
    pub async fn stop_narration(&self) -> Result<()> {
        self.shared.engine.stop()?;
        let mut state = self.shared.state.lock().await;
        state.narrating = false;
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
        Ok(())
    }

    /// Close the session: stop narration, save progress, record the
    /// session's statistics. Exactly once; later calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        self.shared.engine.stop()?;

        let (snapshot, record) = {
            let mut state = self.shared.state.lock().await;
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.narrating = false;
            if let Some(pump) = state.pump.take() {
                pump.abort();
            }
            if let Some(autosave) = state.autosave.take() {
                autosave.abort();
            }
            (state.progress_snapshot(), state.session_record())
        };

        let novel_title = record.novel_title.clone();
        self.shared.progress.record(snapshot).await?;
        self.shared.stats.record_session(record).await?;
        tracing::info!("Closed reading session for '{}'", novel_title);
        Ok(())
    }

    pub async fn position(&self) -> usize {
        self.shared.state.lock().await.position
    }

    pub async fn paragraph_count(&self) -> usize {
        self.shared.state.lock().await.paragraphs.len()
    }

    pub async fn paragraph(&self, index: usize) -> Option<String> {
        self.shared.state.lock().await.paragraphs.get(index).cloned()
    }

    /// The chapter owning a global paragraph index.
    pub async fn chapter_for(&self, index: usize) -> Option<(usize, ChapterStub)> {
        let state = self.shared.state.lock().await;
        state
            .owning_chapter(index)
            .map(|(chapter_index, _)| (chapter_index, state.chapters[chapter_index].clone()))
    }

    /// Chapter-list indices of the loaded range, inclusive.
    pub async fn loaded_chapters(&self) -> (usize, usize) {
        let state = self.shared.state.lock().await;
        (state.first_loaded, state.last_loaded)
    }

    async fn autosave_loop(shared: Weak<Shared>) {
        let mut interval = tokio::time::interval(AUTOSAVE_INTERVAL);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if let Err(e) = shared.save_progress().await {
                tracing::warn!("Failed to autosave reading progress: {}", e);
            }
        }
    }
}

impl Shared {
    /// Update the position and load adjacent chapters as needed. Loads run
    /// with the state lock held, which is what serializes them.
    async fn advance_at(&self, state: &mut SessionState, global: usize) -> Result<usize> {
        state.note_position(global);

        if state.position + PREFETCH_THRESHOLD >= state.paragraphs.len()
            && state.last_loaded + 1 < state.chapters.len()
        {
            let chapter_index = state.last_loaded + 1;
            let stub = state.chapters[chapter_index].clone();
            let novel = state.novel_id.clone();
            let resolved = self.source.resolve(&novel, &stub).await?;
            state.append_chapter(chapter_index, &resolved.paragraphs);
            tracing::debug!(
                "Appended chapter {} to the reading buffer ({} paragraphs)",
                stub.id,
                resolved.paragraphs.len()
            );
            if state.narrating {
                self.engine.update_paragraphs(state.engine_window())?;
            }
        } else if state.position < PREFETCH_THRESHOLD && state.first_loaded > 0 {
            let chapter_index = state.first_loaded - 1;
            let stub = state.chapters[chapter_index].clone();
            let novel = state.novel_id.clone();
            let resolved = self.source.resolve(&novel, &stub).await?;
            state.prepend_chapter(chapter_index, &resolved.paragraphs);
            tracing::debug!(
                "Prepended chapter {} to the reading buffer ({} paragraphs)",
                stub.id,
                resolved.paragraphs.len()
            );
            // A prepend leaves the engine window untouched.
        }

        Ok(state.position)
    }

    /// Position handling for a narrated paragraph. Load failures are logged
    /// and retried naturally on the next paragraph event.
    async fn narrated_paragraph(&self, engine_index: usize) -> usize {
        let mut state = self.state.lock().await;
        let global = state.narration_base + engine_index;
        if state.closed || !state.narrating {
            return global;
        }
        match self.advance_at(&mut state, global).await {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!("Failed to extend the reading buffer: {}", e);
                state.position
            }
        }
    }

    /// The engine finished its window. If more content is (or can be made)
    /// available, restart speech at the continuation point and hand back the
    /// new event stream; otherwise narration is over.
    async fn continue_after_completion(
        &self,
    ) -> Result<Option<mpsc::UnboundedReceiver<NarrationEvent>>> {
        let mut state = self.state.lock().await;
        if state.closed || !state.narrating {
            return Ok(None);
        }

        let next_global = state.position + 1;
        if next_global >= state.paragraphs.len() {
            if state.last_loaded + 1 >= state.chapters.len() {
                state.narrating = false;
                return Ok(None);
            }
            let chapter_index = state.last_loaded + 1;
            let stub = state.chapters[chapter_index].clone();
            let novel = state.novel_id.clone();
            let resolved = match self.source.resolve(&novel, &stub).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    state.narrating = false;
                    return Err(e);
                }
            };
            state.append_chapter(chapter_index, &resolved.paragraphs);
        }

        let settings = self.settings.settings().await.narration;
        let index = next_global - state.narration_base;
        let events = self.engine.speak(state.engine_window(), index, settings)?;
        Ok(Some(events))
    }

    async fn save_progress(&self) -> Result<()> {
        let snapshot = {
            let state = self.state.lock().await;
            if state.closed {
                return Ok(());
            }
            state.progress_snapshot()
        };
        self.progress.record(snapshot).await
    }

    async fn pump_events(
        shared: Arc<Shared>,
        mut events: mpsc::UnboundedReceiver<NarrationEvent>,
        out: mpsc::UnboundedSender<SessionEvent>,
    ) {
        loop {
            match events.recv().await {
                Some(NarrationEvent::Paragraph(index)) => {
                    let global = shared.narrated_paragraph(index).await;
                    let _ = out.send(SessionEvent::Paragraph(global));
                }
                Some(NarrationEvent::Completed) => {
                    match shared.continue_after_completion().await {
                        Ok(Some(next)) => events = next,
                        Ok(None) => {
                            let _ = out.send(SessionEvent::Finished);
                            break;
                        }
                        Err(e) => {
                            let _ = out.send(SessionEvent::Failed(e.to_string()));
                            break;
                        }
                    }
                }
                Some(NarrationEvent::Failed(message)) => {
                    shared.state.lock().await.narrating = false;
                    let _ = out.send(SessionEvent::Failed(message));
                    break;
                }
                // The engine was handed to a newer subscriber.
                None => break,
            }
        }
    }
}

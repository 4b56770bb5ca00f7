use eyre::Result;
use vorleser_client::ContentClient;
use vorleser_reader::{ReadingSession, SessionEvent, SessionServices};
use vorleser_types::{ChapterStub, NovelId};

use crate::App;

/// Handle the read command - open a reading session on one novel
///
/// The chapter list comes from the API when it is reachable; a fully
/// offline novel falls back to its downloaded chapters so reading keeps
/// working without a connection.
pub async fn handle_read_command(
    novel_id: String,
    chapter: Option<usize>,
    narrate: bool,
    app: &App,
) -> Result<()> {
    let novel = NovelId::from(novel_id.as_str());

    let (novel_title, cover_image, chapters) = match app.client.fetch_novel_info(&novel).await {
        Ok(info) => {
            let cover = if info.novel.cover_image.is_empty() {
                None
            } else {
                Some(info.novel.cover_image.clone())
            };
            (info.novel.title.clone(), cover, info.chapter_stubs())
        }
        Err(e) => match app.store.novel(&novel).await {
            Some(stored) => {
                tracing::warn!("Falling back to downloaded chapters: {}", e);
                let chapters = stored
                    .chapters
                    .iter()
                    .map(|c| ChapterStub::new(c.chapter_id.clone(), c.chapter_title.clone()))
                    .collect();
                (stored.novel_title, stored.cover_image, chapters)
            }
            None => return Err(e.into()),
        },
    };

    let saved = app.progress.latest(&novel).await;
    let (start_chapter, start_paragraph) = match (chapter, &saved) {
        (Some(number), _) => (number.saturating_sub(1), 0),
        (None, Some(progress)) => (progress.chapter_index, progress.paragraph_index),
        (None, None) => (0, 0),
    };

    let total_chapters = chapters.len();
    let services = SessionServices {
        source: app.source.clone(),
        engine: app.engine.clone(),
        progress: app.progress.clone(),
        stats: app.stats.clone(),
        settings: app.settings.clone(),
    };
    let session = ReadingSession::open(
        novel.clone(),
        novel_title.clone(),
        cover_image,
        chapters,
        start_chapter,
        services,
    )
    .await?;

    if narrate {
        narrate_session(&session, &novel_title, start_paragraph).await?;
    } else {
        print_chapter(&session, start_paragraph, total_chapters, &novel_id).await?;
    }

    session.close().await?;
    Ok(())
}

/// Narrate from the starting paragraph, printing each paragraph as it is
/// spoken, until the novel ends or narration fails.
async fn narrate_session(
    session: &ReadingSession,
    novel_title: &str,
    start_paragraph: usize,
) -> Result<()> {
    println!("🔊 Narrating '{}'...", novel_title);
    println!();

    let mut events = session.narrate_from(start_paragraph).await?;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Paragraph(index) => {
                if let Some(text) = session.paragraph(index).await {
                    println!("{}", text);
                    println!();
                }
            }
            SessionEvent::Finished => {
                println!("🎉 Reached the end of the novel");
                break;
            }
            SessionEvent::Failed(message) => {
                eprintln!("❌ Narration stopped: {}", message);
                break;
            }
        }
    }
    Ok(())
}

/// Print the opening chapter's paragraphs and leave the saved position at
/// its end.
async fn print_chapter(
    session: &ReadingSession,
    start_paragraph: usize,
    total_chapters: usize,
    novel_id: &str,
) -> Result<()> {
    let count = session.paragraph_count().await;
    let chapter_number = match session.chapter_for(0).await {
        Some((number, stub)) => {
            println!("📖 Chapter {}: {}", number + 1, stub.title);
            number
        }
        None => {
            println!("📖 (empty chapter)");
            0
        }
    };
    println!("{}", "=".repeat(50));

    if start_paragraph > 0 && start_paragraph < count {
        println!("⏭️ Resuming at paragraph {}", start_paragraph + 1);
        println!();
    }

    for index in start_paragraph.min(count)..count {
        if let Some(text) = session.paragraph(index).await {
            println!("{}", text);
            println!();
        }
    }

    // Mark the chapter as read; a failed prefetch of the next one is not
    // this command's problem.
    if count > 0 {
        if let Err(e) = session.visible_paragraph(count - 1).await {
            tracing::debug!("Next chapter not prefetched: {}", e);
        }
    }

    if chapter_number + 1 < total_chapters {
        println!(
            "💡 Continue with: vorleser read {} --chapter {}",
            novel_id,
            chapter_number + 2
        );
    }
    Ok(())
}

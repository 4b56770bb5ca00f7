use eyre::Result;
use vorleser_reader::DOWNLOADS_LIST_ID;
use vorleser_text::{count_words, reading_time_minutes};
use vorleser_types::NovelId;

use crate::App;
use crate::cli::LibraryCommands;
use crate::utils::{confirm, format_size};

/// Handle library subcommands over the offline store
pub async fn handle_library_command(command: LibraryCommands, app: &App) -> Result<()> {
    match command {
        LibraryCommands::List => {
            let summaries = app.store.summaries().await;
            if summaries.is_empty() {
                println!("📚 No downloaded novels.");
                println!("💡 Use 'vorleser download <novel-id>' to store chapters offline");
                return Ok(());
            }

            println!("📚 Offline library ({} novels):", summaries.len());
            for novel in &summaries {
                println!("  📖 {}", novel.novel_title);
                println!("     ID: {}", novel.novel_id);
                println!(
                    "     {} chapters, {}",
                    novel.chapter_count,
                    format_size(novel.total_size)
                );
                println!();
            }

            let limits = app.store.limits().await;
            println!(
                "📊 {} of {} chapters used, {} of {} MB",
                app.store.chapter_count().await,
                limits.max_chapters,
                format_size(app.store.total_size().await),
                limits.max_storage_mb
            );
        }

        LibraryCommands::Show { novel_id } => {
            let novel = NovelId::from(novel_id.as_str());
            match app.store.novel(&novel).await {
                Some(stored) => {
                    let words: usize = stored
                        .chapters
                        .iter()
                        .flat_map(|c| &c.paragraphs)
                        .map(|p| count_words(p))
                        .sum();
                    let minutes = reading_time_minutes(words, app.config.narration.wpm as usize);

                    println!("📖 {}", stored.novel_title);
                    println!(
                        "{} chapters, {} (about {} min of reading)",
                        stored.chapters.len(),
                        format_size(stored.total_size),
                        minutes
                    );
                    println!();
                    for chapter in &stored.chapters {
                        println!(
                            "  ✅ {} ({})",
                            chapter.chapter_title,
                            format_size(chapter.size)
                        );
                    }
                }
                None => {
                    println!("❌ No downloaded chapters for: {}", novel);
                }
            }
        }

        LibraryCommands::Remove { novel_id, force } => {
            let novel = NovelId::from(novel_id.as_str());
            let Some(stored) = app.store.novel(&novel).await else {
                println!("❌ No downloaded chapters for: {}", novel);
                return Ok(());
            };

            if !force
                && !confirm(&format!(
                    "Remove all downloaded chapters of '{}'?",
                    stored.novel_title
                ))?
            {
                println!("❌ Cancelled");
                return Ok(());
            }

            app.store.remove_novel(&novel).await?;
            app.lists.remove_novel(DOWNLOADS_LIST_ID, &novel).await?;
            println!(
                "✅ Removed {} chapters of '{}'",
                stored.chapters.len(),
                stored.novel_title
            );
        }

        LibraryCommands::Clear { force } => {
            let count = app.store.chapter_count().await;
            if count == 0 {
                println!("📚 The offline library is already empty");
                return Ok(());
            }

            if !force && !confirm(&format!("Remove all {} downloaded chapters?", count))? {
                println!("❌ Cancelled");
                return Ok(());
            }

            for summary in app.store.summaries().await {
                app.lists
                    .remove_novel(DOWNLOADS_LIST_ID, &summary.novel_id)
                    .await?;
            }
            app.store.clear().await?;
            println!("✅ Offline library cleared");
        }
    }

    Ok(())
}

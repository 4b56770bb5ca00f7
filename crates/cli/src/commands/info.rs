use eyre::Result;
use vorleser_client::ContentClient;
use vorleser_types::NovelId;

use crate::App;
use crate::utils::format_size;

/// Handle the info command - show a novel's metadata and local state
pub async fn handle_info_command(novel_id: String, show_chapters: bool, app: &App) -> Result<()> {
    let novel = NovelId::from(novel_id.as_str());
    let info = app.client.fetch_novel_info(&novel).await?;

    println!("📖 {}", info.novel.title);
    println!("Author: {}", info.novel.author);
    if !info.novel.status.is_empty() {
        println!("Status: {}", info.novel.status);
    }
    if !info.novel.genre.is_empty() {
        println!("Genre: {}", info.novel.genre);
    }
    if !info.novel.description.is_empty() {
        println!("Description: {}", info.novel.description);
    }
    println!("Chapters: {}", info.total_chapters);

    if let Some(downloaded) = app.store.novel(&novel).await {
        println!(
            "Downloaded: {} chapters ({})",
            downloaded.chapters.len(),
            format_size(downloaded.total_size)
        );
    }

    if let Some(progress) = app.progress.latest(&novel).await {
        println!(
            "Last read: {} (chapter {})",
            progress.chapter_title,
            progress.chapter_index + 1
        );
    }

    if show_chapters {
        println!();
        println!("📄 Chapters:");
        for (index, chapter) in info.chapters.iter().enumerate() {
            let marker = if app.store.is_downloaded(&novel, &chapter.id).await {
                "✅"
            } else {
                "⬜"
            };
            println!("  {} {:>4}. {}", marker, index + 1, chapter.title);
        }
    }

    Ok(())
}

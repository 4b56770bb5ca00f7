use eyre::Result;
use vorleser_client::ContentClient;
use vorleser_downloads::DownloadRequest;
use vorleser_reader::DOWNLOADS_LIST_ID;
use vorleser_types::NovelId;

use crate::App;
use crate::utils::format_size;

/// Handle the download command - queue chapters and wait for them to land
pub async fn handle_download_command(
    novel_id: String,
    first: Option<usize>,
    app: &App,
) -> Result<()> {
    let novel = NovelId::from(novel_id.as_str());

    println!("📖 Fetching chapter list for: {}", novel);
    let info = app.client.fetch_novel_info(&novel).await?;

    let mut chapters = info.chapter_stubs();
    if let Some(first) = first {
        chapters.truncate(first);
    }

    let cover_image = if info.novel.cover_image.is_empty() {
        None
    } else {
        Some(info.novel.cover_image.clone())
    };

    let mut requests = Vec::new();
    let mut already = 0;
    for chapter in chapters {
        if app.store.is_downloaded(&novel, &chapter.id).await {
            already += 1;
            continue;
        }
        requests.push(DownloadRequest {
            novel: novel.clone(),
            novel_title: info.novel.title.clone(),
            cover_image: cover_image.clone(),
            chapter,
        });
    }

    if already > 0 {
        println!("  ⏭️ {} chapters already downloaded", already);
    }
    if requests.is_empty() {
        println!("✅ Nothing to download");
        return Ok(());
    }

    let queued = app.downloads.enqueue_chapters(requests).await;
    println!("📄 Downloading {} chapters...", queued);
    app.downloads.wait_idle().await;

    let (stored_count, stored_size) = match app.store.novel(&novel).await {
        Some(stored) => (stored.chapters.len(), stored.total_size),
        None => (0, 0),
    };

    if stored_count > 0 {
        app.lists.add_novel(DOWNLOADS_LIST_ID, &novel).await?;
        println!(
            "✅ Download complete: {} chapters of '{}' stored ({})",
            stored_count,
            info.novel.title,
            format_size(stored_size)
        );
    } else {
        println!("❌ No chapters could be downloaded");
        println!("💡 Check the API connection and try again");
    }

    Ok(())
}

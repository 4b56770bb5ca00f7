use eyre::Result;
use vorleser_client::ContentClient;

use crate::App;

/// Handle the search command - find novels in the remote catalog
pub async fn handle_search_command(keyword: String, limit: Option<usize>, app: &App) -> Result<()> {
    println!("🔍 Searching for: {}", keyword);

    let mut results = app.client.search(&keyword).await?;
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    if results.is_empty() {
        println!("❌ No novels found matching '{}'", keyword);
        println!("💡 Try a different keyword");
        return Ok(());
    }

    println!("📚 Found {} novel(s):", results.len());
    for novel in results {
        println!("  📖 {} by {}", novel.title, novel.author);
        println!("     ID: {}", novel.id);
        if !novel.status.is_empty() {
            println!("     Status: {}", novel.status);
        }
        if let Some(latest) = &novel.latest_chapter {
            println!("     Latest: {}", latest);
        }
        println!();
    }

    println!("💡 Use 'vorleser info <novel-id>' for details");
    Ok(())
}

use eyre::Result;

use crate::App;

/// Handle the history command - the recently-read log
pub async fn handle_history_command(clear: bool, app: &App) -> Result<()> {
    if clear {
        app.progress.clear_history().await?;
        println!("✅ Reading history cleared");
        return Ok(());
    }

    let history = app.progress.history().await;
    if history.is_empty() {
        println!("📚 No reading history yet");
        println!("💡 Use 'vorleser read <novel-id>' to start reading");
        return Ok(());
    }

    println!("📚 Recently read ({}):", history.len());
    for entry in history {
        println!("  📖 {} - {}", entry.novel_title, entry.chapter_title);
        println!(
            "     chapter {}, paragraph {}, {}",
            entry.chapter_index + 1,
            entry.paragraph_index + 1,
            entry.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Handle the continue command - novels with an unfinished position
pub async fn handle_continue_command(app: &App) -> Result<()> {
    let shortlist = app.progress.continue_reading().await;
    if shortlist.is_empty() {
        println!("📚 Nothing to continue");
        println!("💡 Use 'vorleser search <keyword>' to find something to read");
        return Ok(());
    }

    println!("📚 Continue reading:");
    for entry in shortlist {
        println!("  📖 {} - {}", entry.novel_title, entry.chapter_title);
        println!("     vorleser read {}", entry.novel_id);
    }
    Ok(())
}

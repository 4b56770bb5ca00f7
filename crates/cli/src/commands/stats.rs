use eyre::Result;

use crate::App;
use crate::utils::confirm;

/// Handle the `stats` command
pub async fn handle_stats_command(sessions: bool, reset: bool, app: &App) -> Result<()> {
    if reset {
        if !confirm("Reset all reading statistics?")? {
            println!("❌ Cancelled");
            return Ok(());
        }
        app.stats.reset().await?;
        println!("✅ Statistics reset");
        return Ok(());
    }

    if sessions {
        let sessions = app.stats.sessions().await;
        if sessions.is_empty() {
            println!("📚 No reading sessions recorded yet");
            return Ok(());
        }
        println!("📚 Reading sessions ({}):", sessions.len());
        for record in sessions {
            println!(
                "  📖 {} - {} min, {} words ({})",
                record.novel_title,
                record.minutes(),
                record.words_read,
                record.ended_at.format("%Y-%m-%d %H:%M")
            );
        }
        return Ok(());
    }

    let stats = app.stats.stats().await;
    println!("📊 Reading statistics");
    println!("  ⏱️ Total time: {} minutes", stats.total_reading_time);
    println!("  📖 Words read: {}", stats.total_words_read);
    println!("  📚 Chapters read: {}", stats.total_chapters_read);
    println!(
        "  🔥 Streak: {} days (longest {})",
        stats.current_streak, stats.longest_streak
    );
    if let Some(date) = &stats.last_read_date {
        println!("  📅 Last read: {}", date);
    }

    Ok(())
}

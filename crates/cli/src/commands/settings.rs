use eyre::Result;

use crate::App;
use crate::cli::SettingsCommands;

/// Handle user settings subcommands
pub async fn handle_settings_command(command: SettingsCommands, app: &App) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = app.settings.settings().await;
            println!("⚙️ Settings");
            println!("  Narration:");
            println!("    Pitch: {}", settings.narration.pitch);
            println!("    Rate: {}", settings.narration.rate);
            match &settings.narration.voice {
                Some(voice) => println!("    Voice: {}", voice),
                None => println!("    Voice: (default)"),
            }
            println!("  Downloads:");
            println!("    Max chapters: {}", settings.downloads.max_chapters);
            println!("    Max storage: {} MB", settings.downloads.max_storage_mb);
        }

        SettingsCommands::Narration { pitch, rate, voice } => {
            let mut narration = app.settings.settings().await.narration;
            if let Some(pitch) = pitch {
                narration.pitch = pitch;
            }
            if let Some(rate) = rate {
                narration.rate = rate;
            }
            if let Some(voice) = voice {
                // An empty string clears the voice override.
                narration.voice = if voice.is_empty() { None } else { Some(voice) };
            }
            app.settings.update_narration(narration).await?;
            println!("✅ Narration settings updated");
        }

        SettingsCommands::Downloads {
            max_chapters,
            max_storage_mb,
        } => {
            let mut limits = app.settings.settings().await.downloads;
            if let Some(max_chapters) = max_chapters {
                limits.max_chapters = max_chapters;
            }
            if let Some(max_storage_mb) = max_storage_mb {
                limits.max_storage_mb = max_storage_mb;
            }
            app.settings.update_downloads(limits.clone()).await?;
            // Apply to the open store; evicts down to the new ceilings.
            app.store.set_limits(limits).await?;
            println!("✅ Download limits updated");
        }
    }

    Ok(())
}

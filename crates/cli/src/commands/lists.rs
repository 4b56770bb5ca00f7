use eyre::Result;
use vorleser_types::NovelId;

use crate::App;
use crate::cli::ListCommands;

/// Handle reading list subcommands
pub async fn handle_list_command(command: ListCommands, app: &App) -> Result<()> {
    match command {
        ListCommands::List => {
            let lists = app.lists.all().await;
            println!("📚 Reading lists ({}):", lists.len());
            for list in lists {
                println!("  📑 {} ({} novels)", list.name, list.novel_ids.len());
                println!("     ID: {}", list.id);
                if let Some(description) = &list.description {
                    println!("     {}", description);
                }
                println!();
            }
        }

        ListCommands::Create { name, description } => {
            let list = app.lists.create(&name, description).await?;
            println!("✅ Created list '{}'", list.name);
            println!("   ID: {}", list.id);
        }

        ListCommands::Show { id } => {
            let Some(list) = app.lists.get(&id).await else {
                println!("❌ No reading list with id '{}'", id);
                return Ok(());
            };

            println!("📑 {}", list.name);
            if let Some(description) = &list.description {
                println!("{}", description);
            }
            if list.novel_ids.is_empty() {
                println!("(empty)");
                return Ok(());
            }
            for novel in &list.novel_ids {
                let title = match app.store.novel(novel).await {
                    Some(stored) => Some(stored.novel_title),
                    None => app.progress.latest(novel).await.map(|p| p.novel_title),
                };
                match title {
                    Some(title) => println!("  📖 {} ({})", title, novel),
                    None => println!("  📖 {}", novel),
                }
            }
        }

        ListCommands::Rename { id, name } => {
            app.lists.rename(&id, &name).await?;
            println!("✅ Renamed list to '{}'", name);
        }

        ListCommands::Remove { id } => {
            app.lists.remove(&id).await?;
            println!("✅ Removed list");
        }

        ListCommands::Add { id, novel_id } => {
            let novel = NovelId::from(novel_id.as_str());
            if app.lists.add_novel(&id, &novel).await? {
                println!("✅ Added {} to the list", novel_id);
            } else {
                println!("⏭️ {} is already in the list", novel_id);
            }
        }

        ListCommands::RemoveNovel { id, novel_id } => {
            let novel = NovelId::from(novel_id.as_str());
            if app.lists.remove_novel(&id, &novel).await? {
                println!("✅ Removed {} from the list", novel_id);
            } else {
                println!("❌ {} is not in the list", novel_id);
            }
        }
    }

    Ok(())
}

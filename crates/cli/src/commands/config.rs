use eyre::Result;

use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::utils::confirm;

/// Handle configuration subcommands
pub async fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load().await?;
            config.set_value(&key, &value)?;
            config.save().await?;
            println!("✅ Set {} = {}", key, value);
        }

        ConfigCommands::Get { key } => {
            let config = Config::load().await?;
            let value = config.get_value(&key)?;
            println!("{} = {}", key, value);
        }

        ConfigCommands::Show => {
            let config = Config::load().await?;
            println!("{}", config.show_all());
            println!();
            println!("Configuration file: {}", Config::get_config_path().display());
        }

        ConfigCommands::Reset { force } => {
            if !force && !confirm("Reset the configuration to defaults?")? {
                println!("❌ Cancelled");
                return Ok(());
            }
            Config::reset().await?;
            println!("✅ Configuration reset to defaults");
        }
    }

    Ok(())
}

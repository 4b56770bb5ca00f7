#[derive(clap::Parser, Debug)]
#[clap(name = "vorleser", about = "Read and listen to web novels from your terminal")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog for novels
    Search {
        /// Search keyword
        keyword: String,
        /// Maximum number of results
        #[clap(long)]
        limit: Option<usize>,
    },
    /// Show a novel's details
    Info {
        /// Novel ID
        novel_id: String,
        /// Also list every chapter
        #[clap(long)]
        chapters: bool,
    },
    /// Download chapters for offline reading
    Download {
        /// Novel ID
        novel_id: String,
        /// Only download the first N chapters
        #[clap(long)]
        first: Option<usize>,
    },
    /// Manage downloaded novels
    Library {
        #[clap(subcommand)]
        command: LibraryCommands,
    },
    /// Read a chapter, resuming where you left off
    Read {
        /// Novel ID
        novel_id: String,
        /// Chapter number to read (1-based; default resumes saved progress)
        #[clap(long)]
        chapter: Option<usize>,
        /// Narrate the novel aloud, following along in the terminal
        #[clap(long)]
        narrate: bool,
    },
    /// Show recently read novels
    History {
        /// Clear the reading history
        #[clap(long)]
        clear: bool,
    },
    /// Show novels with unfinished reading positions
    Continue,
    /// Manage reading lists
    Lists {
        #[clap(subcommand)]
        command: ListCommands,
    },
    /// Show reading statistics
    Stats {
        /// List individual reading sessions
        #[clap(long)]
        sessions: bool,
        /// Reset all statistics
        #[clap(long)]
        reset: bool,
    },
    /// Inspect or change user settings
    Settings {
        #[clap(subcommand)]
        command: SettingsCommands,
    },
    /// Manage CLI configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum LibraryCommands {
    /// List all downloaded novels
    List,
    /// Show the downloaded chapters of a novel
    Show {
        /// Novel ID
        novel_id: String,
    },
    /// Remove a novel's downloaded chapters
    Remove {
        /// Novel ID
        novel_id: String,
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
    /// Remove every downloaded chapter
    Clear {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ListCommands {
    /// Show all reading lists
    List,
    /// Create a new reading list
    Create {
        /// List name
        name: String,
        /// Optional description
        #[clap(long)]
        description: Option<String>,
    },
    /// Show one list and its novels
    Show {
        /// List ID
        id: String,
    },
    /// Rename a reading list
    Rename {
        /// List ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a reading list
    Remove {
        /// List ID
        id: String,
    },
    /// Add a novel to a list
    Add {
        /// List ID
        id: String,
        /// Novel ID
        novel_id: String,
    },
    /// Remove a novel from a list
    RemoveNovel {
        /// List ID
        id: String,
        /// Novel ID
        novel_id: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show current settings
    Show,
    /// Adjust narration voice parameters
    Narration {
        /// Voice pitch multiplier
        #[clap(long)]
        pitch: Option<f32>,
        /// Speech rate multiplier
        #[clap(long)]
        rate: Option<f32>,
        /// Backend voice identifier
        #[clap(long)]
        voice: Option<String>,
    },
    /// Adjust offline storage ceilings
    Downloads {
        /// Maximum chapters kept offline
        #[clap(long)]
        max_chapters: Option<usize>,
        /// Maximum offline storage in megabytes
        #[clap(long)]
        max_storage_mb: Option<u64>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. "api.base_url")
        key: String,
        /// New value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show the full configuration
    Show,
    /// Reset the configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}

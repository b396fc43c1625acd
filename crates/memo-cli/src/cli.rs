use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use memo_core::pokedex::PokemonSortKey;

#[derive(Parser)]
#[command(name = "memo")]
#[command(about = "Browse and manage notes in a remote notes service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the notes service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// CLI profile name for endpoint configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes, paginated and optionally filtered
    List {
        /// Page to display
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Search term matched against title and content
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Show {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note content (stdin or $EDITOR when omitted)
        content: Vec<String>,
        /// Tag to attach; repeat for multiple tags
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Edit an existing note
    Edit {
        /// Note ID
        id: String,
        /// Replace the title
        #[arg(long)]
        title: Option<String>,
        /// Replace the content (opens $EDITOR when no field flag is given)
        #[arg(long)]
        content: Option<String>,
        /// Replace the tag list; repeat for multiple tags
        #[arg(long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
        /// Archive the note
        #[arg(long, conflicts_with = "unarchive")]
        archive: bool,
        /// Unarchive the note
        #[arg(long)]
        unarchive: bool,
    },
    /// Delete an existing note
    Delete {
        /// Note ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check the notes service liveness
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse the Pokémon reference API
    Pokedex {
        #[command(subcommand)]
        command: PokedexCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PokedexCommands {
    /// List pokemon, optionally with per-item details
    List {
        /// Number of entries to fetch
        #[arg(short, long, default_value = "20")]
        limit: u32,
        /// Offset into the full list
        #[arg(short, long, default_value = "0")]
        offset: u32,
        /// Fetch per-pokemon details in parallel
        #[arg(long)]
        details: bool,
        /// Sort detail rows by this key
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pokemon's details
    Show {
        /// Pokemon name or id
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available types
    Types,
    /// List pokemon belonging to a type
    Type {
        /// Type name (e.g. grass)
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Notes service base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Pokémon reference API base URL
        #[arg(long, value_name = "URL")]
        pokedex_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile and effective endpoints
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortKey {
    Id,
    Name,
    Height,
    Weight,
}

impl From<SortKey> for PokemonSortKey {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Id => Self::Id,
            SortKey::Name => Self::Name,
            SortKey::Height => Self::Height,
            SortKey::Weight => Self::Weight,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

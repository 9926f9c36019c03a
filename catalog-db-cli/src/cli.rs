use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog", about = "MARC catalog engine CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to catalog.toml (default: nearest catalog.toml above the cwd)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of *.zip record archives
    #[arg(long, global = true)]
    pub records_dir: Option<PathBuf>,

    /// Editor name recorded on writes
    #[arg(long, global = true)]
    pub editor: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a catalog.toml template in the current directory
    Init {
        /// Overwrite an existing catalog.toml
        #[arg(long)]
        force: bool,
    },

    /// Rebuild the archive index from the records directory
    BuildIndex,

    /// Show a record by id or external identifier, e.g. 42 or "(OCoLC)123"
    Show {
        record: String,

        /// Ignore overlay edits
        #[arg(long)]
        original: bool,
    },

    /// List the fields of a record with their edit indexes
    Fields {
        id: String,

        /// Sort by tag (indexes still refer to stored positions)
        #[arg(long)]
        sorted: bool,

        /// Ignore overlay edits
        #[arg(long)]
        original: bool,
    },

    /// Replace the field at an index
    SetField {
        id: String,
        index: usize,
        #[command(flatten)]
        field: FieldArgs,
    },

    /// Add a field, placed in tag order
    AddField {
        id: String,
        #[command(flatten)]
        field: FieldArgs,
    },

    /// Delete the field at an index
    DeleteField { id: String, index: usize },

    /// Link an existing host record to its bound-with children
    Link {
        host: String,

        #[arg(required = true)]
        children: Vec<String>,

        /// Leave out children that do not resolve instead of failing
        #[arg(long)]
        skip_missing: bool,

        #[command(flatten)]
        holdings: HoldingsArgs,
    },

    /// Create a host record for a set of children and link them
    Synthesize {
        #[arg(required = true)]
        children: Vec<String>,

        /// Host title
        #[arg(long)]
        title: String,

        #[arg(long)]
        place: Option<String>,

        #[arg(long)]
        publisher: Option<String>,

        #[arg(long)]
        series: Option<String>,

        /// Subject heading (repeatable)
        #[arg(long = "subject")]
        subjects: Vec<String>,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        extent: Option<String>,

        #[arg(long)]
        skip_missing: bool,

        #[command(flatten)]
        holdings: HoldingsArgs,
    },

    /// Show what a synthesized host would look like without writing
    Preview {
        #[arg(required = true)]
        children: Vec<String>,

        #[arg(long)]
        skip_missing: bool,
    },

    /// Show the boundwith relationship of a record
    Lookup { id: String },

    /// Search the index by SuDoc number and title substrings
    Search {
        #[arg(long)]
        sudoc: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value_t = 100)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Write current versions of records as one MARC file
    Export {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output file (stdout when omitted)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the overlay versions of a record
    History { id: String },
}

/// Field content for set-field and add-field.
#[derive(Args, Debug)]
pub struct FieldArgs {
    /// Three-character tag
    pub tag: String,

    /// Indicators as two characters, e.g. "10" or " 0"
    #[arg(long, default_value = "  ")]
    pub ind: String,

    /// Subfield as code=value, e.g. -s 'a=Annual report' (repeatable, ordered)
    #[arg(short = 's', long = "subfield")]
    pub subfields: Vec<String>,

    /// Control-field data (00X tags)
    #[arg(long, conflicts_with = "subfields")]
    pub value: Option<String>,
}

/// Physical-item data for the host's 852.
#[derive(Args, Debug, Default)]
pub struct HoldingsArgs {
    #[arg(long)]
    pub barcode: Option<String>,

    #[arg(long)]
    pub call_number: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub item_note: Option<String>,
}

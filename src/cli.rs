// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use crate::model::{Privacy, SearchScope};
use crate::search::HybridMode;
use crate::service::SearchKind;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(about = "Search and ask questions over your journal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Override journal store path
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Disable throttling (not recommended)
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,
}

fn parse_throttle_range(s: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    Own,
    Feed,
    Shared,
}

impl From<ScopeArg> for SearchScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Own => SearchScope::Own,
            ScopeArg::Feed => SearchScope::Feed,
            ScopeArg::Shared => SearchScope::Shared,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Vector,
    Hybrid,
}

impl From<KindArg> for SearchKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Vector => SearchKind::Vector,
            KindArg::Hybrid => SearchKind::Hybrid,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Semantic,
    Keyword,
    Balanced,
}

impl From<ModeArg> for HybridMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Semantic => HybridMode::Semantic,
            ModeArg::Keyword => HybridMode::Keyword,
            ModeArg::Balanced => HybridMode::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrivacyArg {
    Private,
    Shared,
    Public,
}

impl From<PrivacyArg> for Privacy {
    fn from(value: PrivacyArg) -> Self {
        match value {
            PrivacyArg::Private => Privacy::Private,
            PrivacyArg::Shared => Privacy::Shared,
            PrivacyArg::Public => Privacy::Public,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a new journal entry
    Add {
        /// Entry content
        content: String,

        /// Optional title
        #[arg(long)]
        title: Option<String>,

        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Entry privacy
        #[arg(long, value_enum, default_value = "private")]
        privacy: PrivacyArg,
    },

    /// Search journal entries
    Search {
        /// Free-text query, or "*" to match everything the filters allow
        query: String,

        #[arg(long, value_enum, default_value = "own")]
        scope: ScopeArg,

        #[arg(long, value_enum, default_value = "hybrid")]
        kind: KindArg,

        #[arg(long, value_enum, default_value = "balanced")]
        mode: ModeArg,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Override the context-dependent similarity threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Require a tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Require a tagged person (repeatable)
        #[arg(long = "person")]
        people: Vec<String>,

        /// Earliest day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Ask a question answered from your entries, with citations
    Ask {
        query: String,
    },

    /// Compute embeddings for entries that are missing them
    Embed {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Show embedding coverage for the journal
    Status,
}

//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::LayoutStyle;

/// Learn a topic by quiz: generated knowledge maps with progressive unlocking
#[derive(Parser, Debug)]
#[command(name = "quizmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive learning session
    Learn {
        /// Topic to learn
        topic: String,
        /// Map layout
        #[arg(short, long)]
        layout: Option<LayoutStyle>,
    },

    /// Generate a knowledge map and print or export it
    Map {
        /// Topic to map
        topic: String,
        /// Write the map as SVG
        #[arg(long, value_hint = ValueHint::FilePath)]
        svg: Option<PathBuf>,
        /// Map layout
        #[arg(short, long)]
        layout: Option<LayoutStyle>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show preference file path
    Path,

    /// Print config template
    Template,

    /// Change one setting and save it
    Set {
        /// Dotted key, e.g. llm.model
        key: String,
        value: String,
    },
}

// SSHE — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: add, delete, get, list, link, version.

mod commands;

use clap::{Args, Parser, Subcommand};

use crate::query::NodeFilter;
use crate::session::DEFAULT_PORT;

pub use commands::{execute, Context};

/// SSHE: manage and connect to SSH password credentials of remote machines.
#[derive(Parser, Debug)]
#[command(name = "sshe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add node connection information.
    Add {
        /// IP address of the node.
        ip: String,

        /// Username for the connection (prompted when omitted, default root).
        #[arg(short, long)]
        user: Option<String>,

        /// Tag for the node. Repeat for multiple tags.
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Delete a matching node.
    Delete {
        ip: String,

        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show a node, including its decrypted password.
    Get {
        ip: String,

        #[arg(short, long)]
        user: Option<String>,
    },

    /// Search the node list by conditions.
    List {
        #[command(flatten)]
        filter: ListFilter,

        /// Print matching nodes as JSON (passwords are never included).
        #[arg(long)]
        json: bool,
    },

    /// Open an interactive SSH shell on a node.
    Link {
        ip: String,

        #[arg(short, long)]
        user: Option<String>,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Show version.
    Version,
}

/// `list` conditions. Every flag may be repeated; all must hold.
#[derive(Args, Debug, Default)]
pub struct ListFilter {
    /// IP equals one of the given values.
    #[arg(long = "ip")]
    pub ips: Vec<String>,
    /// IP starts with the value.
    #[arg(long = "ip-start")]
    pub ip_starts: Vec<String>,
    /// IP ends with the value.
    #[arg(long = "ip-end")]
    pub ip_ends: Vec<String>,
    /// IP contains the value.
    #[arg(long = "ip-contain")]
    pub ip_contains: Vec<String>,

    /// Username equals one of the given values.
    #[arg(long = "user")]
    pub users: Vec<String>,
    #[arg(long = "user-start")]
    pub user_starts: Vec<String>,
    #[arg(long = "user-end")]
    pub user_ends: Vec<String>,
    #[arg(long = "user-contain")]
    pub user_contains: Vec<String>,

    /// Node carries every given tag.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Some tag starts with the value.
    #[arg(long = "tag-start")]
    pub tag_starts: Vec<String>,
    /// Some tag ends with the value.
    #[arg(long = "tag-end")]
    pub tag_ends: Vec<String>,
    /// Some tag contains the value.
    #[arg(long = "tag-contain")]
    pub tag_contains: Vec<String>,
}

impl From<ListFilter> for NodeFilter {
    fn from(f: ListFilter) -> Self {
        NodeFilter {
            ips: f.ips,
            ip_starts: f.ip_starts,
            ip_ends: f.ip_ends,
            ip_contains: f.ip_contains,
            users: f.users,
            user_starts: f.user_starts,
            user_ends: f.user_ends,
            user_contains: f.user_contains,
            tags: f.tags,
            tag_starts: f.tag_starts,
            tag_ends: f.tag_ends,
            tag_contains: f.tag_contains,
        }
    }
}

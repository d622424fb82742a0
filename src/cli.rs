#[allow(unused_imports)]
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wamcp")]
#[command(about = "WhatsApp MCP server backed by a local SQLite message store", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the MCP server on stdio, with the bridge event listener alongside.
    Serve {
        /// Path to the SQLite message store.
        #[arg(long, default_value = "whatsapp.db")]
        db: PathBuf,
        /// Exported contact snapshot (JSON array), used as a resolution fallback.
        #[arg(long, default_value = "contacts.json")]
        contacts: PathBuf,
        /// Exported group snapshot (JSON array), used as a resolution fallback.
        #[arg(long, default_value = "groups.json")]
        groups: PathBuf,
        /// Base URL of the bridge REST API. Falls back to WAMCP_BRIDGE_URL;
        /// without either, send tools report the transport as disconnected.
        #[arg(long)]
        bridge_url: Option<String>,
        /// Address the bridge event listener binds to.
        #[arg(long, default_value = "127.0.0.1")]
        events_bind: String,
        /// Port the bridge event listener binds to.
        #[arg(long, default_value_t = 8771)]
        events_port: u16,
        /// Do not start the event listener (store becomes read-only history).
        #[arg(long)]
        no_events: bool,
    },

    /// Create a new empty message store.
    Init {
        #[arg(long, default_value = "whatsapp.db")]
        db: PathBuf,
    },

    /// Print the message store schema description.
    Schema,
}

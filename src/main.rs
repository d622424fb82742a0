// Module declarations
mod cli;
mod contacts;
mod events;
mod mcp;
mod resolver;
mod store;
mod tool_args;
mod tool_defs;
mod tool_exec;
mod transport;
mod types;
mod util;

// Re-export all module items at crate root so cross-module references work
// through a single namespace.
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use contacts::*;
#[allow(unused_imports)]
pub(crate) use events::*;
#[allow(unused_imports)]
pub(crate) use mcp::*;
#[allow(unused_imports)]
pub(crate) use resolver::*;
#[allow(unused_imports)]
pub(crate) use store::*;
#[allow(unused_imports)]
pub(crate) use tool_args::*;
#[allow(unused_imports)]
pub(crate) use tool_defs::*;
#[allow(unused_imports)]
pub(crate) use tool_exec::*;
#[allow(unused_imports)]
pub(crate) use transport::*;
#[allow(unused_imports)]
pub(crate) use types::*;
#[allow(unused_imports)]
pub(crate) use util::*;

use std::sync::Arc;
use std::thread;

use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            db,
            contacts,
            groups,
            bridge_url,
            events_bind,
            events_port,
            no_events,
        } => {
            let store = Arc::new(MessageStore::open_or_create(&db)?);
            let index = ContactIndex::new(contacts, groups);

            let bridge_url = bridge_url.or_else(|| env_optional("WAMCP_BRIDGE_URL"));
            let bridge = bridge_url.as_deref().map(BridgeClient::new);
            if bridge.is_none() {
                eprintln!(
                    "[wamcp] no bridge URL configured; send tools will report the \
                     transport as disconnected"
                );
            }

            if !no_events {
                let listener_store = Arc::clone(&store);
                thread::spawn(move || {
                    run_event_listener(&events_bind, events_port, listener_store);
                });
            }

            let ctx = ToolContext {
                store: &store,
                index: &index,
                bridge: bridge.as_ref(),
            };
            run_mcp_server(&ctx)
        }

        Command::Init { db } => {
            if db.exists() {
                eprintln!("Refusing to overwrite existing file: {}", db.display());
                std::process::exit(2);
            }
            let _ = MessageStore::open_or_create(&db)?;
            println!("Created {}", db.display());
            Ok(())
        }

        Command::Schema => {
            println!("{SCHEMA_DESCRIPTION}");
            Ok(())
        }
    }
}

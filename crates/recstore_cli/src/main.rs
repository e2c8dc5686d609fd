//! RecStore CLI
//!
//! Command-line tools for RecStore.
//!
//! # Commands
//!
//! - `serve` - Run the in-memory reference server
//! - `insert` - Declare the sample index and insert the sample records
//! - `search` - Count and query the sample collection
//! - `version` - Show version information

mod commands;
mod output;

use clap::{Parser, Subcommand};
use recstore_client::{Client, ClientConfig, PatternSyntax};
use recstore_server::ServerConfig;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use tracing_subscriber::EnvFilter;

/// RecStore command-line tools.
#[derive(Parser)]
#[command(name = "recstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server address (host, host:port or recstore://host[:port])
    #[arg(global = true, short, long, default_value = "localhost")]
    addr: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the in-memory reference server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:7017")]
        bind: SocketAddr,

        /// How name patterns are interpreted (regex, literal)
        #[arg(short, long, default_value = "regex")]
        pattern_syntax: PatternSyntax,

        /// Maximum concurrent connections
        #[arg(long, default_value = "1000")]
        max_connections: NonZeroUsize,

        /// Open cursors each connection may hold before the oldest is evicted
        #[arg(long, default_value = "100")]
        max_open_cursors: NonZeroUsize,
    },

    /// Declare the index on `type` and insert the sample records
    Insert {
        /// Database name
        #[arg(short, long, default_value = "mydb")]
        database: String,

        /// Collection name
        #[arg(short, long, default_value = "testCollection")]
        collection: String,
    },

    /// Print the count, all records, and two filtered queries
    Search {
        /// Database name
        #[arg(short, long, default_value = "mydb")]
        database: String,

        /// Collection name
        #[arg(short, long, default_value = "testCollection")]
        collection: String,

        /// Records fetched per round trip (0 lets the server choose)
        #[arg(short, long, default_value = "0")]
        batch_size: u32,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Serve {
            bind,
            pattern_syntax,
            max_connections,
            max_open_cursors,
        } => {
            let config = ServerConfig::new(bind)
                .with_pattern_syntax(pattern_syntax)
                .with_max_connections(max_connections.get())
                .with_max_open_cursors(max_open_cursors.get());
            commands::serve::run(config)?;
        }
        Commands::Insert {
            database,
            collection,
        } => {
            let client = Client::connect(&cli.addr)?;
            commands::insert::run(&client, &database, &collection, &mut stdout)?;
            client.close()?;
        }
        Commands::Search {
            database,
            collection,
            batch_size,
        } => {
            let config = ClientConfig::default().with_batch_size(batch_size);
            let client = Client::connect_with_config(&cli.addr, config)?;
            commands::search::run(&client, &database, &collection, &mut stdout)?;
            client.close()?;
        }
        Commands::Version => {
            println!("RecStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "RecStore protocol v{}",
                recstore_protocol::PROTOCOL_VERSION
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["recstore", "search"]);
        assert_eq!(cli.addr, "localhost");
        match cli.command {
            Commands::Search {
                database,
                collection,
                batch_size,
            } => {
                assert_eq!(database, "mydb");
                assert_eq!(collection, "testCollection");
                assert_eq!(batch_size, 0);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::parse_from([
            "recstore",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--pattern-syntax",
            "literal",
        ]);
        match cli.command {
            Commands::Serve {
                bind,
                pattern_syntax,
                ..
            } => {
                assert_eq!(bind.port(), 9000);
                assert_eq!(pattern_syntax, PatternSyntax::Literal);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn zero_max_connections_is_rejected() {
        let parsed = Cli::try_parse_from(["recstore", "serve", "--max-connections", "0"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from(["recstore", "serve", "--max-open-cursors", "0"]);
        assert!(parsed.is_err());

        let cli = Cli::parse_from(["recstore", "serve", "--max-connections", "8"]);
        match cli.command {
            Commands::Serve {
                max_connections, ..
            } => assert_eq!(max_connections.get(), 8),
            _ => panic!("expected serve"),
        }
    }
}

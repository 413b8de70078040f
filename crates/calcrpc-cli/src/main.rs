//! # calcrpc CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Start the registry
//! calcrpc registry -b 0.0.0.0:6000
//!
//! # Start the operation servers
//! calcrpc server arithmetic
//! calcrpc server number_theory --cache-dir /var/cache/calcrpc
//! calcrpc server news -b 0.0.0.0:7003
//!
//! # Make a call (prints the wire encoding of the result)
//! calcrpc call sub 10 3 2
//! calcrpc call --no-cache prim 4 17 1 2
//! ```
//!
//! Every subcommand reads the same configuration file, chosen with
//! `--config`, the `CALCRPC_CONFIG` variable or `calcrpc.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use argh::FromArgs;
use calcrpc_client::RpcClient;
use calcrpc_common::{OperationResult, ServerRole};
use calcrpc_registry::{DiscoveryService, RegistryIndex};
use calcrpc_server::OperationServer;

#[derive(FromArgs)]
/// calcrpc - calculator RPC with discovery and tiered caching
struct Cli {
    /// path to the JSON configuration file
    #[argh(option, short = 'c')]
    config: Option<String>,

    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Registry(RegistryArgs),
    Server(ServerArgs),
    Call(CallArgs),
}

/// Arguments for starting the registry.
///
/// The registry knows the three configured server roles and answers
/// discovery datagrams until it is stopped.
#[derive(FromArgs)]
#[argh(subcommand, name = "registry")]
/// start the discovery registry
struct RegistryArgs {
    /// address to bind the UDP socket to
    ///
    /// Defaults to the registry endpoint in the configuration.
    #[argh(option, short = 'b')]
    bind: Option<String>,
}

/// Arguments for starting an operation server.
#[derive(FromArgs)]
#[argh(subcommand, name = "server")]
/// start an operation server
struct ServerArgs {
    /// role to serve: arithmetic, number_theory or news
    #[argh(positional)]
    role: ServerRole,

    /// address to bind the TCP listener to
    ///
    /// Defaults to the role's endpoint in the configuration.
    #[argh(option, short = 'b')]
    bind: Option<String>,

    /// directory holding the role's cache file
    #[argh(option, long = "cache-dir")]
    cache_dir: Option<PathBuf>,
}

/// Arguments for a single call.
///
/// The result is printed to stdout in its wire encoding. Inline errors
/// such as division by zero are reported on stderr with a non-zero exit
/// code.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// execute one command through the registry
struct CallArgs {
    /// skip both client cache tiers
    #[argh(switch, long = "no-cache")]
    no_cache: bool,

    /// the command, e.g. `sum 2 3`
    #[argh(positional, greedy)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Keep stdout clean for scripting
    if !matches!(cli.command, Commands::Call(_)) {
        calcrpc_cli::init_tracing();
    }

    let config = calcrpc_cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Registry(args) => {
            let bind = args.bind.unwrap_or_else(|| config.registry.addr());
            let index = RegistryIndex::from_config(&config);
            for entry in index.entries() {
                tracing::info!(
                    "Registered {} at {} for {:?}",
                    entry.name,
                    entry.endpoint.addr(),
                    entry.operations
                );
            }

            DiscoveryService::new(index).run(&bind).await?;
            Ok(())
        }
        Commands::Server(args) => {
            let config = calcrpc_cli::with_cache_dir(config, args.cache_dir);
            let bind = args
                .bind
                .unwrap_or_else(|| config.endpoint(args.role).addr());

            tracing::info!("Starting {} server", args.role);
            let server = Arc::new(OperationServer::for_role(args.role, &config)?);
            server.run(&bind).await?;
            Ok(())
        }
        Commands::Call(args) => {
            let command = args.command.join(" ");
            if command.trim().is_empty() {
                anyhow::bail!("No command given");
            }

            let client = RpcClient::from_config(&config);
            match client.call(&command, !args.no_cache).await? {
                OperationResult::Error(reason) => anyhow::bail!("{}", reason),
                result => println!("{}", result.encode_wire()),
            }
            Ok(())
        }
    }
}

/// CLI argument parsing tests.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_registry_default_bind() {
        let args: Cli = Cli::from_args(&["calcrpc"], &["registry"]).unwrap();
        assert!(args.config.is_none());
        match args.command {
            Commands::Registry(RegistryArgs { bind }) => assert!(bind.is_none()),
            _ => panic!("Expected Registry command"),
        }
    }

    #[test]
    fn test_cli_parse_global_config() {
        let args: Cli =
            Cli::from_args(&["calcrpc"], &["-c", "prod.json", "registry", "-b", "0.0.0.0:6000"])
                .unwrap();
        assert_eq!(args.config.as_deref(), Some("prod.json"));
        match args.command {
            Commands::Registry(RegistryArgs { bind }) => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0:6000"));
            }
            _ => panic!("Expected Registry command"),
        }
    }

    #[test]
    fn test_cli_parse_server_role() {
        let args: Cli = Cli::from_args(
            &["calcrpc"],
            &["server", "number-theory", "--cache-dir", "/tmp/cache"],
        )
        .unwrap();
        match args.command {
            Commands::Server(ServerArgs {
                role,
                bind,
                cache_dir,
            }) => {
                assert_eq!(role, ServerRole::NumberTheory);
                assert!(bind.is_none());
                assert_eq!(cache_dir, Some(PathBuf::from("/tmp/cache")));
            }
            _ => panic!("Expected Server command"),
        }
    }

    #[test]
    fn test_cli_parse_server_unknown_role() {
        assert!(Cli::from_args(&["calcrpc"], &["server", "solver"]).is_err());
    }

    #[test]
    fn test_cli_parse_call() {
        let args: Cli = Cli::from_args(&["calcrpc"], &["call", "sub", "10", "3", "2"]).unwrap();
        match args.command {
            Commands::Call(CallArgs { no_cache, command }) => {
                assert!(!no_cache);
                assert_eq!(command.join(" "), "sub 10 3 2");
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_parse_call_no_cache() {
        let args: Cli =
            Cli::from_args(&["calcrpc"], &["call", "--no-cache", "prim 4 17 1 2"]).unwrap();
        match args.command {
            Commands::Call(CallArgs { no_cache, command }) => {
                assert!(no_cache);
                assert_eq!(command, vec!["prim 4 17 1 2".to_string()]);
            }
            _ => panic!("Expected Call command"),
        }
    }
}

//! Warden daemon: entry point for the relay, the announcer and the
//! cluster manager API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use warden_chain::{ChainClient, GatewayClient, SigningIdentity};
use warden_cluster::{CommandRestart, NoopRestart, RestartTrigger, ServiceJsonFile};
use warden_node::{NodeConfig, Roles, ShutdownController, StakeSetting, WardenNode};
use warden_rpc::ManagerApi;
use warden_trust::AdvertisementBook;
use warden_types::AccountId;
use warden_utils::LogFormat;

#[derive(Parser)]
#[command(name = "warden", about = "Trust relay between a subnet chain and a storage cluster")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain gateway.
    #[arg(long, env = "WARDEN_CHAIN_URL")]
    chain_url: Option<String>,

    /// Subnet id.
    #[arg(long, env = "WARDEN_SUBNET")]
    subnet: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WARDEN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WARDEN_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Default)]
struct ListenArgs {
    /// Minimum stake of a trusted advertiser, in display units.
    #[arg(long, env = "WARDEN_MIN_STAKE")]
    min_stake: Option<String>,

    /// Peer id that is always trusted.
    #[arg(long, env = "WARDEN_LEADER_PEER_ID")]
    leader: Option<String>,

    /// Cluster service.json to rewrite.
    #[arg(long, env = "WARDEN_SERVICE_JSON")]
    service_json: Option<PathBuf>,

    /// Cluster manager API to push trusted peers to.
    #[arg(long, env = "WARDEN_MANAGER_URL")]
    manager_url: Option<String>,

    /// Command that restarts the cluster after a local write.
    #[arg(long, env = "WARDEN_RESTART_COMMAND")]
    restart_command: Option<String>,

    /// Write the trusted peers on every change even if the surface
    /// already holds them.
    #[arg(long, env = "WARDEN_ALWAYS_UPDATE")]
    always_update: bool,

    /// Do not serve /status, /trusted-peers and /metrics.
    #[arg(long, env = "WARDEN_DISABLE_STATUS")]
    no_status: bool,

    /// Status server port.
    #[arg(long, env = "WARDEN_STATUS_PORT")]
    status_port: Option<u16>,
}

#[derive(clap::Args, Default)]
struct InscribeArgs {
    /// This node's cluster peer id.
    #[arg(long, env = "WARDEN_PEER_ID")]
    peer_id: Option<String>,

    /// SS58 address of the signing hotkey.
    #[arg(long, env = "WARDEN_ACCOUNT")]
    account: Option<String>,

    /// Wallet name known to the gateway.
    #[arg(long, env = "WARDEN_WALLET")]
    wallet: Option<String>,

    /// Hotkey name known to the gateway.
    #[arg(long, env = "WARDEN_HOTKEY")]
    hotkey: Option<String>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Reconcile the cluster's trusted peers from finalized blocks.
    Listen {
        #[command(flatten)]
        args: ListenArgs,
    },
    /// Keep this node's peer id inscribed on chain.
    Inscribe {
        #[command(flatten)]
        args: InscribeArgs,
    },
    /// Listen and inscribe in one process.
    Run {
        #[command(flatten)]
        listen: ListenArgs,
        #[command(flatten)]
        inscribe: InscribeArgs,
    },
    /// Serve the cluster manager API next to a cluster.
    Manager {
        /// Cluster service.json owned by this manager.
        #[arg(long, env = "WARDEN_SERVICE_JSON")]
        service_json: Option<PathBuf>,

        /// Command that restarts the cluster after a write.
        #[arg(long, env = "WARDEN_RESTART_COMMAND")]
        restart_command: Option<String>,

        #[arg(long, env = "WARDEN_MANAGER_PORT")]
        port: Option<u16>,
    },
    /// Print every decoded advertisement of the subnet.
    Commitments,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if let Some(url) = &cli.chain_url {
        config.chain_url = url.clone();
    }
    if let Some(subnet) = cli.subnet {
        config.subnet = Some(subnet);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn apply_listen(config: &mut NodeConfig, args: &ListenArgs) {
    if let Some(stake) = &args.min_stake {
        config.min_stake = Some(StakeSetting::Decimal(stake.clone()));
    }
    if let Some(leader) = &args.leader {
        config.leader_peer_id = Some(leader.clone());
    }
    // A surface given on the command line replaces the one from the file.
    if let Some(path) = &args.service_json {
        config.service_json_path = Some(path.clone());
        config.manager_url = None;
    }
    if let Some(url) = &args.manager_url {
        config.manager_url = Some(url.clone());
        if args.service_json.is_none() {
            config.service_json_path = None;
        }
    }
    if let Some(command) = &args.restart_command {
        config.restart_command = Some(command.clone());
    }
    config.always_update |= args.always_update;
    config.enable_status &= !args.no_status;
    if let Some(port) = args.status_port {
        config.status_port = port;
    }
}

fn apply_inscribe(config: &mut NodeConfig, args: &InscribeArgs) {
    if let Some(peer_id) = &args.peer_id {
        config.peer_id = Some(peer_id.clone());
    }
    if args.account.is_some() || args.wallet.is_some() || args.hotkey.is_some() {
        let base = config.signer.take().unwrap_or(SigningIdentity {
            account: AccountId::new(""),
            wallet: "default".into(),
            hotkey: "default".into(),
        });
        config.signer = Some(SigningIdentity {
            account: args.account.clone().map(AccountId::new).unwrap_or(base.account),
            wallet: args.wallet.clone().unwrap_or(base.wallet),
            hotkey: args.hotkey.clone().unwrap_or(base.hotkey),
        });
    }
}

async fn run_node(config: NodeConfig, roles: Roles) -> anyhow::Result<()> {
    if roles.listen {
        config.validate_listener()?;
    }
    if roles.announce {
        config.validate_announcer()?;
    }

    tracing::info!(
        chain = %config.chain_url,
        subnet = ?config.subnet,
        listen = roles.listen,
        announce = roles.announce,
        status_port = config.enable_status.then_some(config.status_port),
        "starting warden"
    );

    let node = WardenNode::new(config)?;
    let shutdown = node.shutdown_controller().clone();
    tokio::spawn(async move { shutdown.wait_for_signal().await });

    node.run(roles).await?;
    tracing::info!("warden exited cleanly");
    Ok(())
}

async fn run_manager(
    config: NodeConfig,
    service_json: Option<PathBuf>,
    restart_command: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let path = service_json
        .or(config.service_json_path)
        .context("--service-json is required for the manager")?;
    let restart: Arc<dyn RestartTrigger> = match restart_command
        .or(config.restart_command)
        .as_deref()
        .and_then(CommandRestart::from_command_line)
    {
        Some(command) => Arc::new(command),
        None => {
            tracing::warn!("no restart command configured, cluster will not be restarted");
            Arc::new(NoopRestart)
        }
    };

    let api = ManagerApi::new(
        port.unwrap_or(config.manager_port),
        Arc::new(ServiceJsonFile::new(path)),
        restart,
    );
    let shutdown = ShutdownController::new();
    let signalled = shutdown.signalled();
    tokio::spawn(async move { shutdown.wait_for_signal().await });
    api.start(signalled).await?;
    Ok(())
}

async fn list_commitments(config: NodeConfig) -> anyhow::Result<()> {
    let subnet = config.subnet()?;
    let window = config.trust_window_blocks;
    let chain = GatewayClient::new(config.gateway_config())?;
    let current = chain.current_height().await?;

    let mut book = AdvertisementBook::new();
    let summary = book.refresh(&chain, subnet).await?;
    tracing::info!(
        %subnet,
        %current,
        listed = summary.listed,
        malformed = summary.malformed,
        "fetched commitments"
    );

    let ads: Vec<_> = book
        .iter()
        .map(|ad| {
            json!({
                "account": ad.account,
                "peerId": ad.peer_id,
                "inscribedAt": ad.inscribed_at,
                "blocksLeft": current.blocks_until(ad.expires_at(window)),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&ads)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    warden_utils::init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Listen { args } => {
            apply_listen(&mut config, &args);
            run_node(config, Roles { listen: true, announce: false }).await
        }
        Command::Inscribe { args } => {
            apply_inscribe(&mut config, &args);
            run_node(config, Roles { listen: false, announce: true }).await
        }
        Command::Run { listen, inscribe } => {
            apply_listen(&mut config, &listen);
            apply_inscribe(&mut config, &inscribe);
            run_node(config, Roles { listen: true, announce: true }).await
        }
        Command::Manager {
            service_json,
            restart_command,
            port,
        } => run_manager(config, service_json, restart_command, port).await,
        Command::Commitments => list_commitments(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER: &str = "12D3KooWMmZqkk1Ek8vonm3FE3rNMLqqxwspRiKwx5ZD5yn4tPLG";

    #[test]
    fn cli_parses_listen_flags() {
        let cli = Cli::try_parse_from([
            "warden",
            "--subnet",
            "40",
            "listen",
            "--min-stake",
            "1000",
            "--service-json",
            "/data/service.json",
            "--leader",
            PEER,
        ])
        .unwrap();
        let mut config = load_config(&cli).unwrap();
        let Command::Listen { args } = &cli.command else {
            panic!("expected listen");
        };
        apply_listen(&mut config, args);
        config.validate_listener().unwrap();
        assert_eq!(config.subnet, Some(40));
    }

    #[test]
    fn command_line_surface_replaces_file_surface() {
        let mut config = NodeConfig {
            service_json_path: Some("/etc/service.json".into()),
            ..NodeConfig::default()
        };
        let args = ListenArgs {
            manager_url: Some("http://manager:3000".into()),
            ..ListenArgs::default()
        };
        apply_listen(&mut config, &args);
        assert_eq!(config.service_json_path, None);
        assert_eq!(config.manager_url.as_deref(), Some("http://manager:3000"));
    }

    #[test]
    fn inscribe_flags_fill_the_signer() {
        let mut config = NodeConfig::default();
        let args = InscribeArgs {
            peer_id: Some(PEER.into()),
            account: Some("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".into()),
            ..InscribeArgs::default()
        };
        apply_inscribe(&mut config, &args);
        let signer = config.signer.clone().unwrap();
        assert_eq!(signer.wallet, "default");
        assert_eq!(signer.hotkey, "default");
        config.subnet = Some(40);
        config.validate_announcer().unwrap();
    }
}

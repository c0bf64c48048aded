//! apcli - Access Point CLI
//!
//! Command-line interface over the apctl facade: AP status and control,
//! client discovery and reachability probing.
//!
//! # Usage
//!
//! ```bash
//! # Show AP support and state
//! apcli status
//!
//! # Start the AP from a TOML config (requires root)
//! sudo apcli enable --config ap.toml --wait
//!
//! # List and probe attached clients
//! apcli clients
//! apcli probe --timeout-ms 500
//! ```

use clap::{Parser, Subcommand};
use libapctl::{
    ApConfig, ApController, ApState, ApStateMonitor, ClientsSnapshot, HostapdCapability,
    FALLBACK_WIFI_DEVICE,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

/// Access Point control CLI
#[derive(Parser, Debug)]
#[command(name = "apcli")]
#[command(author = "apctl contributors")]
#[command(version)]
#[command(about = "Control a Wi-Fi access point and discover its clients", long_about = None)]
struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Runtime directory for AP state (hostapd config and pidfile)
    #[arg(long, default_value = "/run/apctl")]
    state_dir: PathBuf,

    /// Wireless interface to drive
    #[arg(short, long)]
    interface: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show AP support, state and resolved device
    Status,
    /// Show the stored AP configuration
    Config,
    /// Start the AP (requires root)
    Enable {
        /// TOML file with `ssid` and optional `passphrase`
        #[arg(long)]
        config: Option<PathBuf>,
        /// Block until the AP reaches the enabled state
        #[arg(long)]
        wait: bool,
    },
    /// Stop the AP (requires root)
    Disable {
        /// Block until the AP reaches the disabled state
        #[arg(long)]
        wait: bool,
    },
    /// List clients from the neighbor table
    Clients,
    /// Probe clients and report the reachable ones
    Probe {
        /// Per-client probe timeout in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
        /// Print each reachable client as its probe completes
        #[arg(long)]
        stream: bool,
    },
    /// Watch AP state transitions until interrupted
    Watch,
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn require_root(action: &str) {
    if !is_root() {
        eprintln!("Error: {} requires root privileges", action);
        process::exit(1);
    }
}

async fn build_controller(cli: &Cli) -> ApController {
    let interface = cli
        .interface
        .clone()
        .unwrap_or_else(|| FALLBACK_WIFI_DEVICE.to_string());
    let capability = Arc::new(HostapdCapability::new(cli.state_dir.clone(), interface));
    ApController::new(capability).await
}

fn print_clients(snapshot: &ClientsSnapshot, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot).unwrap_or_default());
        return;
    }
    for client in snapshot.clients() {
        println!("{}\t{}", client.ip_addr, client.hw_addr);
    }
    if let ClientsSnapshot::Partial { error, .. } = snapshot {
        eprintln!("Warning: neighbor table read incomplete: {}", error);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> libapctl::ApctlResult<()> {
    let controller = build_controller(cli).await;

    match &cli.command {
        Commands::Status => {
            let state = controller.state().await;
            let enabled = controller.is_enabled().await.unwrap_or(false);
            let address = controller.local_address().await.unwrap_or(None);
            if cli.json {
                let status = serde_json::json!({
                    "supported": controller.is_supported(),
                    "capabilities": controller.capabilities(),
                    "device": controller.wifi_device(),
                    "state": state,
                    "enabled": enabled,
                    "local_address": address,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Supported: {}", controller.is_supported());
                println!("Device:    {}", controller.wifi_device());
                println!("State:     {}", state);
                println!("Enabled:   {}", enabled);
                if let Some(addr) = address {
                    println!("Address:   {}", addr);
                }
            }
        }
        Commands::Config => {
            let config = controller.configuration().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("SSID:       {}", config.ssid);
                println!(
                    "Passphrase: {}",
                    config.passphrase.as_deref().unwrap_or("(open network)")
                );
            }
        }
        Commands::Enable { config, wait } => {
            require_root("enabling the access point");
            let ap_config = match config {
                Some(path) => Some(ApConfig::from_toml_file(path).await?),
                None => None,
            };
            let accepted = controller.set_enabled(ap_config.as_ref(), true).await?;
            if !accepted {
                eprintln!("Platform rejected the enable request");
                process::exit(1);
            }
            if *wait {
                controller
                    .wait_for_state(ApState::Enabled, Duration::from_secs(30))
                    .await?;
            }
            println!("Access point enabled");
        }
        Commands::Disable { wait } => {
            require_root("disabling the access point");
            controller.disable().await?;
            if *wait {
                controller
                    .wait_for_state(ApState::Disabled, Duration::from_secs(30))
                    .await?;
            }
            println!("Access point disabled");
        }
        Commands::Clients => {
            let snapshot = controller.clients().await?;
            print_clients(&snapshot, cli.json);
        }
        Commands::Probe { timeout_ms, stream } => {
            let timeout = Duration::from_millis(*timeout_ms);
            let cancel = CancellationToken::new();
            if *stream {
                let mut rx = controller.reachable_clients_each(timeout, cancel).await?;
                while let Some(client) = rx.recv().await {
                    if cli.json {
                        println!("{}", serde_json::to_string(&client)?);
                    } else {
                        println!("{}\t{}", client.ip_addr, client.hw_addr);
                    }
                }
            } else {
                let reachable = controller.reachable_clients(timeout, &cancel).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&reachable)?);
                } else {
                    for client in &reachable {
                        println!("{}\t{}", client.ip_addr, client.hw_addr);
                    }
                    println!("{} reachable", reachable.len());
                }
            }
        }
        Commands::Watch => {
            let controller = Arc::new(controller);
            let monitor = ApStateMonitor::new(controller.clone());
            let mut events = monitor.subscribe();
            monitor.start().await?;

            println!("Watching AP state (current: {}), Ctrl-C to stop", controller.state().await);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => {
                        match event {
                            Ok(libapctl::ApEvent::StateChanged { from, to }) => {
                                println!("{} -> {}", from, to);
                            }
                            Err(_) => break,
                        }
                    }
                }
            }
            monitor.stop().await;
        }
    }

    Ok(())
}

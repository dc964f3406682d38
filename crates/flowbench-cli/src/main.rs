use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowbench_core::{
    FlowLinkFactory, RelayController, RrgController, RrgError, SwitchLinkFactory,
};
use flowbench_drivers::{BenchConfig, RtuLinkFactory, SimBench, SimLinkFactory};

#[derive(Parser, Debug)]
#[command(author, version, about = "Operator console for the gas-line bench", long_about = None)]
struct Args {
    /// Path to the bench config file (optional)
    #[arg(long, default_value = "config/flowbench")]
    config: String,

    /// Run against the simulated bench instead of real hardware
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports visible on this host
    Ports,
    /// Flow regulator commands
    #[command(subcommand)]
    Flow(FlowCommand),
    /// Power relay commands
    #[command(subcommand)]
    Relay(RelayCommand),
}

#[derive(Subcommand, Debug)]
enum FlowCommand {
    /// Write a setpoint and read the live flow back
    Set {
        /// Serial port of the regulator
        port: String,
        /// Setpoint in SCCM
        sccm: f64,
        /// Gas table to select before setting the flow (e.g. 7 for helium)
        #[arg(long)]
        gas: Option<u16>,
    },
    /// Poll the live flow until Ctrl-C
    Watch {
        /// Serial port of the regulator
        port: String,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum RelayCommand {
    /// Energize the relay and hold it until Ctrl-C
    Hold {
        /// Serial port of the relay
        port: String,
    },
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Logs go to stderr so readings on stdout stay pipeable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = BenchConfig::load(&args.config)?;

    match args.command {
        Command::Ports => list_ports(),
        Command::Flow(flow) => {
            let links = flow_links(args.simulate, &config);
            match flow {
                FlowCommand::Set { port, sccm, gas } => {
                    flow_set(links, &config, port, sccm, gas).await
                }
                FlowCommand::Watch { port, interval_ms } => {
                    flow_watch(links, &config, port, interval_ms).await
                }
            }
        }
        Command::Relay(RelayCommand::Hold { port }) => {
            let links = switch_links(args.simulate, &config);
            relay_hold(links, &config, port).await
        }
    }
}

fn flow_links(simulate: bool, config: &BenchConfig) -> Arc<dyn FlowLinkFactory> {
    if simulate {
        info!("Running against the simulated bench");
        Arc::new(SimLinkFactory::new(SimBench::new(config.rrg.slave_id)))
    } else {
        Arc::new(RtuLinkFactory)
    }
}

fn switch_links(simulate: bool, config: &BenchConfig) -> Arc<dyn SwitchLinkFactory> {
    if simulate {
        info!("Running against the simulated bench");
        Arc::new(SimLinkFactory::new(SimBench::new(config.relay.slave_id)))
    } else {
        Arc::new(RtuLinkFactory)
    }
}

fn list_ports() -> Result<()> {
    let ports = flowbench_drivers::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for port in ports {
        if port.description.is_empty() {
            println!("{}", port.name);
        } else {
            println!("{:<20} {}", port.name, port.description);
        }
    }
    Ok(())
}

async fn flow_set(
    links: Arc<dyn FlowLinkFactory>,
    config: &BenchConfig,
    port: String,
    sccm: f64,
    gas: Option<u16>,
) -> Result<()> {
    let mut rrg = RrgController::new(links);
    rrg.turn_on(config.rrg.params_for(port)).await?;

    // Release the port whatever the commands did
    let outcome = apply_setpoint(&mut rrg, sccm, gas).await;
    rrg.turn_off().await?;

    let flow = outcome?;
    println!("flow: {:.3} sccm", flow);
    info!("✅ Setpoint applied");
    Ok(())
}

async fn apply_setpoint(
    rrg: &mut RrgController,
    sccm: f64,
    gas: Option<u16>,
) -> Result<f64, RrgError> {
    if let Some(gas_id) = gas {
        rrg.set_gas(gas_id).await?;
    }
    rrg.set_flow(sccm).await?;
    rrg.get_flow().await
}

async fn flow_watch(
    links: Arc<dyn FlowLinkFactory>,
    config: &BenchConfig,
    port: String,
    interval_ms: u64,
) -> Result<()> {
    let mut rrg = RrgController::new(links);
    rrg.turn_on(config.rrg.params_for(port)).await?;
    info!(interval_ms, "Watching flow, Ctrl-C to stop");

    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Shutting down...");
                break;
            }
            _ = interval.tick() => {
                match rrg.get_flow().await {
                    Ok(flow) => {
                        println!("{}  {:.3} sccm", chrono::Local::now().format("%H:%M:%S%.3f"), flow);
                    }
                    // Keep polling; a single missed response is routine on a serial line
                    Err(e) => warn!("Flow read failed: {}", e),
                }
            }
        }
    }

    rrg.turn_off().await?;
    Ok(())
}

async fn relay_hold(
    links: Arc<dyn SwitchLinkFactory>,
    config: &BenchConfig,
    port: String,
) -> Result<()> {
    let mut relay = RelayController::new(links);
    relay.turn_on(config.relay.params_for(port)).await?;
    info!("✅ Relay energized, Ctrl-C to release");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Releasing relay..."),
        Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
    }

    relay.turn_off().await?;
    info!("Relay released");
    Ok(())
}

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ Error: {:?}", e);
        std::process::exit(1);
    }
}

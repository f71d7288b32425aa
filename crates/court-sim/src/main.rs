use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use court_sim::session::{Flow, Session};
use court_sim::telemetry::init_tracing;
use court_sim::{Command, SharedSimulation, SimConfig, SimulationRunner, TokioClock};
use courtroom::{AlertView, CourtEvent, EventBus, EventBusObserver, MessageKind, Simulation};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Court room message simulation in the terminal
#[derive(Debug, Parser)]
#[command(name = "court-sim", version, about)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Only schedule messages of this kind (legal or distraction)
    #[arg(long)]
    only: Option<MessageKind>,

    /// Exit after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Do not read commands from stdin
    #[arg(long)]
    no_input: bool,

    /// Print every event as a JSON line instead of alert text
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// How often the countdown is checked for expiry
const COUNTDOWN_POLL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = SimConfig::load(args.config.as_deref())?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.only.is_some() {
        config.only = args.only;
    }

    let pool = config.pool().context("No usable message templates")?;
    let bus = EventBus::new().shared();

    let mut sim = Simulation::new(TokioClock::new(), pool, config.simulation_config());
    sim.add_observer(Arc::new(EventBusObserver::new(bus.clone())));

    let runner = SimulationRunner::new(sim);
    let printer = tokio::spawn(print_events(bus.subscribe(), runner.shared(), args.json));

    let mut session = Session::new(runner, config.countdown(), bus.clone());
    session.start()?;
    info!(
        templates = session.runner().lock()?.pool().len(),
        seed = ?config.seed,
        only = ?config.only,
        "Court room open"
    );
    println!("{}", court_sim::session::HELP);

    let result = run_loop(&mut session, &args).await;

    session.shutdown().await;
    printer.abort();
    result
}

async fn run_loop(session: &mut Session, args: &Args) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = !args.no_input;
    let mut countdown = tokio::time::interval(COUNTDOWN_POLL);

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
            _ = &mut deadline => {
                info!("Run duration elapsed");
                return Ok(());
            }
            _ = countdown.tick() => {
                if session.poll_countdown()? {
                    println!("TIME IS UP");
                }
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match session.handle(command) {
                    Ok((flow, out)) => {
                        for l in out {
                            println!("{l}");
                        }
                        if flow == Flow::Quit {
                            return Ok(());
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }
}

/// Print alerts for simulation events as they arrive.
async fn print_events(
    mut rx: broadcast::Receiver<CourtEvent>,
    sim: SharedSimulation,
    json: bool,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "Alert printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Failed to encode event: {e}"),
            }
            continue;
        }

        let line = match &event {
            CourtEvent::MessageEnqueued { occurrence, .. }
            | CourtEvent::MessageUrgent { occurrence, .. }
            | CourtEvent::FineIncurred { occurrence, .. } => {
                let Ok(guard) = sim.lock() else { return };
                guard.active().get(*occurrence).map(|m| AlertView::from(m).to_string())
            }
            CourtEvent::FineAcknowledged { law_label, .. } => {
                Some(format!("fine under {law_label} acknowledged"))
            }
            CourtEvent::StageChanged { .. }
            | CourtEvent::CountdownExpired { .. }
            | CourtEvent::MessageDismissed { .. } => None,
        };
        if let Some(line) = line {
            println!("{line}");
        }
    }
}

use anyhow::{bail, Result};
use clap::Parser;
use path_simulator::commands::drive_commands;
use path_simulator::common::Direction;
use path_simulator::config::SimulatorConfig;
use path_simulator::planner::{Planner, ReplayPlanner};
use path_simulator::scenarios::ScenarioId;
use path_simulator::session::{Notification, SessionEvent};
use path_simulator::Simulator;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Run the planner on a scenario and print every step of the path
#[derive(Parser, Debug)]
#[command(name = "simulator_cli")]
#[command(about = "Text front end for the path simulator", long_about = None)]
struct Cli {
    /// Obstacle layout, e.g. "Corners"
    #[arg(long, default_value_t = ScenarioId::BasicMock)]
    scenario: ScenarioId,

    /// Robot start pose as x,y,dir (default: 1,1,N)
    #[arg(long, value_parser = parse_start)]
    start: Option<StartPose>,

    /// Replay a saved planner response instead of calling the service
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Grid or timing parameter, e.g. width_cm=200 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Set the planner's retrying flag
    #[arg(long)]
    retrying: bool,

    /// Print the parsed drive commands
    #[arg(long = "commands")]
    show_commands: bool,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StartPose {
    x: i32,
    y: i32,
    d: Direction,
}

fn parse_start(text: &str) -> Result<StartPose, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [x, y, d] = parts.as_slice() else {
        return Err(format!("start pose must be x,y,dir, got {text:?}"));
    };
    Ok(StartPose {
        x: x.parse().map_err(|e| format!("bad x {x:?}: {e}"))?,
        y: y.parse().map_err(|e| format!("bad y {y:?}: {e}"))?,
        d: Direction::parse(d).map_err(|e| e.to_string())?,
    })
}

fn parse_param(pair: &str) -> Result<(String, f64), String> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {pair:?}"))?;
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("{key} must be a number"))?;
    Ok((key.trim().to_string(), value))
}

fn drain_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        println!("  * {}", notification.message());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("path_simulator=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .init();

    let args = Cli::parse();
    if args.list {
        for id in ScenarioId::ALL {
            println!("{id} ({} obstacles)", id.obstacles().len());
        }
        return Ok(());
    }

    let params: HashMap<String, f64> = args.params.iter().cloned().collect();
    let mut config = SimulatorConfig::from_env()?;
    if let Err(e) = config.configure(&params) {
        bail!("Failed to configure grid: {}", e);
    }
    let simulator = Simulator::new(config)?;

    let planner: Arc<dyn Planner> = match &args.replay {
        Some(path) => Arc::new(ReplayPlanner::from_file(path)?),
        None => Arc::new(simulator.http_planner()?),
    };
    println!(
        "Grid {}x{} cells, planner at {}",
        simulator.layout().width,
        simulator.layout().height,
        simulator.config().planner.base_url
    );

    let handle = simulator.start(planner);
    let mut notifications = handle.notifications();

    handle.send(SessionEvent::SelectScenario(args.scenario)).await?;
    if let Some(StartPose { x, y, d }) = args.start {
        handle.send(SessionEvent::SetStartPose { x, y, d }).await?;
    }
    handle.send(SessionEvent::SetRetrying(args.retrying)).await?;

    println!("Running planner on {}...", args.scenario);
    handle.send(SessionEvent::RunRequested).await?;
    loop {
        match notifications.recv().await? {
            Notification::Success(message) => {
                println!("{message}");
                break;
            }
            Notification::Error(message) => bail!(message),
            other => println!("  * {}", other.message()),
        }
    }

    let view = handle.view();
    println!("{}", view.status_line());
    println!("{}", view.grid.to_ascii());

    if args.show_commands {
        if view.annotations_degraded {
            println!("Commands and motions do not line up; labels show raw commands");
        }
        println!("Drive commands:");
        for command in drive_commands(&view.commands)? {
            println!("  {:<14} {}", command.to_wire(), command);
        }
        println!();
    }

    for _ in 1..view.total_steps {
        handle.send(SessionEvent::StepForward).await?;
        let view = handle.view();
        println!("{}", view.status_line());
        drain_notifications(&mut notifications);
        println!("{}", view.grid.to_ascii());
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
    fn parses_typed_options() {
        let cli = Cli::try_parse_from([
            "simulator_cli",
            "--scenario",
            "corners",
            "--start",
            "3, 4, E",
            "--set",
            "width_cm=150",
            "--set",
            "animation_interval_ms=50",
            "--commands",
        ])
        .unwrap();
        assert_eq!(cli.scenario, ScenarioId::Corners);
        assert_eq!(
            cli.start,
            Some(StartPose {
                x: 3,
                y: 4,
                d: Direction::East
            })
        );
        assert_eq!(
            cli.params,
            vec![
                ("width_cm".to_string(), 150.0),
                ("animation_interval_ms".to_string(), 50.0)
            ]
        );
        assert!(cli.show_commands);
        assert!(!cli.retrying);
        assert!(cli.replay.is_none());
    }

    #[test]
    fn defaults_to_basic_mock() {
        let cli = Cli::try_parse_from(["simulator_cli"]).unwrap();
        assert_eq!(cli.scenario, ScenarioId::BasicMock);
        assert!(cli.start.is_none());
        assert!(cli.params.is_empty());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Cli::try_parse_from(["simulator_cli", "--scenario", "nowhere"]).is_err());
        assert!(Cli::try_parse_from(["simulator_cli", "--start", "1,2"]).is_err());
        assert!(Cli::try_parse_from(["simulator_cli", "--set", "width_cm"]).is_err());
        assert!(parse_param("width_cm=wide").is_err());
    }
}

use rackwright::layout::SceneSession;
use rackwright::{ClusterInput, Diagnostics, Engine, nodeset};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Layout(rackwright::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rackwright::Error> for CliError {
    fn from(value: rackwright::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<rackwright::error::Error> for CliError {
    fn from(value: rackwright::error::Error) -> Self {
        Self::Layout(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Snapshot,
    Grid,
    Canvas,
    Scene,
    Topology,
    Expand,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    config: Option<String>,
    rack: Option<String>,
}

fn usage() -> &'static str {
    "rackwright-cli\n\
\n\
USAGE:\n\
  rackwright-cli [snapshot] [--pretty] [--config <path>] [<path>|-]\n\
  rackwright-cli grid [--pretty] [--config <path>] [<path>|-]\n\
  rackwright-cli canvas [--pretty] [--config <path>] [--rack <name>] [<path>|-]\n\
  rackwright-cli scene [--pretty] [--config <path>] [<path>|-]\n\
  rackwright-cli topology [--pretty] [--config <path>] [<path>|-]\n\
  rackwright-cli expand [--pretty] <nodeset>\n\
\n\
NOTES:\n\
  - Input is a JSON document `{racks, nodes, jobs, topology}`; every section is optional.\n\
  - `--config` points to a JSON document deep-merged onto the default layout configuration.\n\
  - Warnings are logged to stderr; set RACKWRIGHT_LOG (e.g. `debug`) to change verbosity.\n"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "snapshot" => args.command = Command::Snapshot,
            "grid" => args.command = Command::Grid,
            "canvas" => args.command = Command::Canvas,
            "scene" => args.command = Command::Scene,
            "topology" => args.command = Command::Topology,
            "expand" => args.command = Command::Expand,
            "--pretty" => args.pretty = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--rack" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.rack = Some(name.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.rack.is_some() && args.command != Command::Canvas {
        return Err(CliError::Usage(usage()));
    }
    if args.command == Command::Expand && args.input.is_none() {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn build_engine(config: Option<&str>) -> Result<Engine, CliError> {
    let Some(path) = config else {
        return Ok(Engine::default());
    };
    let overrides: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(Engine::from_overrides(&overrides)?)
}

fn run(args: Args) -> Result<(), CliError> {
    tracing::debug!(command = ?args.command, input = ?args.input, "running");
    if args.command == Command::Expand {
        let expr = args.input.as_deref().unwrap_or_default();
        return write_json(&nodeset::expand(expr)?, args.pretty);
    }

    let engine = build_engine(args.config.as_deref())?;
    let text = read_input(args.input.as_deref())?;
    let input: ClusterInput = serde_json::from_str(&text)?;

    if args.command == Command::Snapshot {
        let snapshot = engine.refresh(&input)?;
        return write_json(&snapshot, args.pretty);
    }

    let data = engine.ingest(&input)?;
    let mut diag = Diagnostics::new();
    match args.command {
        Command::Grid => write_json(&engine.grid(&data, &mut diag), args.pretty),
        Command::Canvas => match args.rack.as_deref() {
            Some(rack) => write_json(&engine.canvas(&data, rack, &mut diag)?, args.pretty),
            None => write_json(&engine.canvases(&data, &mut diag), args.pretty),
        },
        Command::Scene => {
            let grid = engine.grid(&data, &mut diag);
            let mut session = SceneSession::new();
            let out = write_json(
                engine.scene(&data, &grid, &mut session, &mut diag),
                args.pretty,
            );
            session.clean();
            out
        }
        Command::Topology => write_json(&engine.topology(&data, &mut diag)?, args.pretty),
        Command::Snapshot | Command::Expand => Ok(()),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RACKWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use dashplot::parser::{parse_command, parse_request, SessionCommand, DEFAULT_HEAD_ROWS, HELP};
use dashplot::{telemetry, Figure, RenderOptions, Session};

/// Environment variable consulted when `--options` is not given
const OPTIONS_ENV: &str = "DASHPLOT_OPTIONS";

#[derive(Parser, Debug)]
#[command(name = "dashplot")]
#[command(about = "Explore CSV data and render charts from it", long_about = None)]
struct Args {
    /// Render options as JSON (e.g., '{"width": 640, "height": 480, "type": "svg"}')
    #[arg(long, global = true)]
    options: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List column names in file order
    Columns {
        /// CSV file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show the first rows
    Head {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Number of rows
        #[arg(short = 'n', long, default_value_t = DEFAULT_HEAD_ROWS)]
        rows: usize,
    },
    /// Summary statistics
    Describe {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Render a chart (e.g., 'bar(x: day, y: sales)')
    Plot {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Chart request: kind(x: column, y: column)
        request: String,
    },
    /// Read commands from stdin, one per line
    Session {
        /// CSV file to load before the first command
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    let options = load_options(args.options)?;
    debug!(?options, "render options");

    match args.command {
        Commands::Columns { input } => {
            let session = load_session(input.as_deref(), options)?;
            let mut out = io::stdout().lock();
            for column in session.dataset().columns() {
                writeln!(out, "{}", column).context("Failed to write to stdout")?;
            }
        }
        Commands::Head { input, rows } => {
            let session = load_session(input.as_deref(), options)?;
            write_stdout(session.dataset().head(rows))?;
        }
        Commands::Describe { input, json } => {
            let session = load_session(input.as_deref(), options)?;
            let summary = session.dataset().summary();
            if json {
                let text = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
                write_stdout(text + "\n")?;
            } else {
                write_stdout(summary)?;
            }
        }
        Commands::Plot { input, output, request } => {
            let request = parse_request(&request).context("Invalid chart request")?;
            let session = load_session(input.as_deref(), options)?;
            let figure = session.render(&request)?;
            write_figure(&figure, output.as_deref())?;
        }
        Commands::Session { input } => {
            let session = match input {
                Some(path) => Some(Session::open(path, options.clone())?),
                None => None,
            };
            run_session(session, options)?;
        }
    }

    Ok(())
}

/// Options from the flag, then the environment, then defaults
fn load_options(flag: Option<String>) -> Result<RenderOptions> {
    let text = flag.or_else(|| std::env::var(OPTIONS_ENV).ok());
    match text {
        Some(text) if !text.trim().is_empty() => RenderOptions::from_json(&text),
        _ => Ok(RenderOptions::default()),
    }
}

fn load_session(input: Option<&Path>, options: RenderOptions) -> Result<Session> {
    match input {
        Some(path) => Session::open(path, options),
        None => {
            let mut content = Vec::new();
            io::stdin()
                .read_to_end(&mut content)
                .context("Failed to read CSV from stdin")?;
            Session::upload(&content, options).context("Failed to load CSV from stdin")
        }
    }
}

/// Write to stdout, propagating failures such as a closed pipe
fn write_stdout(content: impl fmt::Display) -> Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "{}", content).context("Failed to write to stdout")?;
    out.flush().context("Failed to flush stdout")
}

fn write_figure(figure: &Figure, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, &figure.bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&figure.bytes)
                .context("Failed to write figure to stdout")?;
            handle.flush().context("Failed to flush stdout")
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive loop. Every failure is reported and the loop keeps going;
/// the current dataset is only replaced by a successful load.
fn run_session(mut session: Option<Session>, options: RenderOptions) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("error: {}", e);
                continue;
            }
        };
        debug!(?command, "session command");

        match execute(command, &mut session, &options) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                warn!("command failed: {:#}", e);
                eprintln!("error: {:#}", e);
            }
        }
        io::stdout().flush().context("Failed to flush stdout")?;
    }
    Ok(())
}

fn execute(command: SessionCommand, session: &mut Option<Session>, options: &RenderOptions) -> Result<Flow> {
    match command {
        SessionCommand::Load(path) => {
            let loaded = Session::open(&path, options.clone())?;
            write_stdout(format!(
                "loaded {} ({} rows, {} columns)\n",
                path,
                loaded.dataset().rows(),
                loaded.dataset().columns().len()
            ))?;
            *session = Some(loaded);
        }
        SessionCommand::Columns => {
            let columns = current(session)?.dataset().columns().join("\n");
            write_stdout(columns + "\n")?;
        }
        SessionCommand::Head(n) => write_stdout(current(session)?.dataset().head(n))?,
        SessionCommand::Describe => write_stdout(current(session)?.dataset().summary())?,
        SessionCommand::Plot { request, output } => {
            let figure = current(session)?.render(&request)?;
            match output {
                Some(path) => {
                    write_figure(&figure, Some(Path::new(&path)))?;
                    write_stdout(format!(
                        "wrote {} chart to {} ({} bytes)\n",
                        request.chart_kind,
                        path,
                        figure.bytes.len()
                    ))?;
                }
                None => write_stdout(format!(
                    "rendered {} chart ({}x{}, {} bytes); add '> <path>' to save it\n",
                    request.chart_kind,
                    figure.width,
                    figure.height,
                    figure.bytes.len()
                ))?,
            }
        }
        SessionCommand::Help => write_stdout(format!("{}\n", HELP))?,
        SessionCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn current(session: &Option<Session>) -> Result<&Session> {
    session
        .as_ref()
        .context("no dataset loaded (use 'load <path>')")
}

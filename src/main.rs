//! jqsh - Main Entry Point
//!
//! Filters are supplied in their JSON AST form (the serde form of
//! [`jqsh::Filter`]); source-text parsing happens upstream.
//!
//! - With `--filter`, stdin is read as a stream of JSON input values.
//! - Without it, each stdin line is one filter and turns share their scope.

use anyhow::Context;
use clap::Parser;
use jqsh::{
    config::JqshConfig,
    values::{json, Renderer},
    Filter, FilterContext, Session, Value,
};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "jqsh", version, about = "A jq-like query language and shell")]
struct Args {
    /// Filter AST as JSON, or `@path` to read it from a file
    #[arg(short = 'c', long = "filter")]
    filter: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each result on one line
    #[arg(long)]
    compact: bool,

    /// Arguments made available to the filter's context
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,jqsh=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => JqshConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => JqshConfig::load_or_default(),
    };
    if args.compact {
        config.output.indent = 0;
    }
    let renderer = Renderer::new(config.output.indent);

    let mut session =
        Session::new(config).with_context(FilterContext::command_line(args.args.clone()));

    match &args.filter {
        Some(source) => {
            let filter = read_filter(source)?;
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading input values")?;
            let input = json::parse_stream(&text).context("parsing input values")?;
            let raised = run_turn(&mut session, &filter, input, &renderer)?;
            if raised {
                std::process::exit(1);
            }
        }
        None => repl(&mut session, &renderer)?,
    }
    Ok(())
}

/// One filter AST per line; scope carries over between lines.
fn repl(session: &mut Session, renderer: &Renderer) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading filter")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Filter>(&line) {
            Ok(filter) => {
                run_turn(session, &Arc::new(filter), Vec::new(), renderer)?;
            }
            Err(e) => eprintln!("jqsh: syntax error: {}", e),
        }
    }
    Ok(())
}

fn read_filter(source: &str) -> anyhow::Result<Arc<Filter>> {
    let text = match source.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading filter file {}", path))?,
        None => source.to_string(),
    };
    let filter: Filter = serde_json::from_str(&text).context("parsing filter AST")?;
    Ok(Arc::new(filter))
}

/// Print results to stdout and exceptions to stderr. Returns whether an
/// exception was raised.
fn run_turn(
    session: &mut Session,
    filter: &Arc<Filter>,
    input: Vec<Value>,
    renderer: &Renderer,
) -> anyhow::Result<bool> {
    tracing::debug!("running {}", filter);
    let turn = session.run(filter, input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for value in &turn.values {
        match value {
            Value::Exception(e) => {
                for line in e.report_lines() {
                    eprintln!("{}", line);
                }
            }
            other => writeln!(out, "{}", renderer.render(other))?,
        }
    }
    out.flush()?;
    Ok(turn.raised())
}

mod config;
mod session;
mod shell;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use rpcman_catalog::{MethodPath, NodePath};

use config::{Overrides, Settings};
use session::Session;

/// Request catalog and RPC client.
#[derive(Parser)]
#[command(name = "rpcman", version, about = "Request catalog and RPC client")]
struct Cli {
    /// Config file (default: ./rpcman.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Broker address (http://, https:// or echo://)
    #[arg(long, global = true)]
    broker: Option<String>,

    /// Call timeout in seconds (1-1000)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the catalog as an indented outline
    Tree,

    /// Add a project, service, module or method under an existing parent
    Add {
        /// Path of the new node, root first (1 to 4 names)
        #[arg(required = true, num_args = 1..=4)]
        segments: Vec<String>,
    },

    /// Rename a node; everything beneath it moves along
    Rename {
        /// Path of the node followed by the new name
        #[arg(required = true, num_args = 2..=5)]
        segments: Vec<String>,
    },

    /// Delete a method
    Delete {
        project: String,
        service: String,
        module: String,
        method: String,
    },

    /// Show a node; methods include their params and last result
    Show {
        #[arg(required = true, num_args = 1..=4)]
        segments: Vec<String>,
    },

    /// Store params for a method (typographic punctuation is repaired first)
    Params {
        project: String,
        service: String,
        module: String,
        method: String,
        /// JSON object of named arguments
        json: String,
    },

    /// Call a method and store its result
    Send {
        project: String,
        service: String,
        module: String,
        method: String,
        /// JSON object of named arguments (default: the stored params)
        #[arg(long)]
        params: Option<String>,
    },

    /// Repair and pretty-print JSON text
    Format { text: String },

    /// Start an interactive shell
    Shell,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_panic_hook();

    if let Commands::Format { text } = &cli.command {
        cmd_format(text);
        return;
    }

    let overrides = Overrides {
        broker: cli.broker.clone(),
        timeout: cli.timeout,
        catalog: cli.catalog.clone(),
    };
    let settings = match Settings::load(cli.config.as_deref(), &overrides) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };
    tracing::debug!(?settings, "resolved settings");
    let mut session = match Session::from_settings(&settings) {
        Ok(session) => session,
        Err(e) => fail(&e.to_string()),
    };

    match cli.command {
        Commands::Tree => print!("{}", session.tree().render()),
        Commands::Add { segments } => cmd_add(&mut session, segments),
        Commands::Rename { mut segments } => {
            let new = segments.pop().unwrap_or_default();
            cmd_rename(&mut session, segments, &new);
        }
        Commands::Delete {
            project,
            service,
            module,
            method,
        } => cmd_delete(
            &mut session,
            MethodPath::new(project, service, module, method),
        ),
        Commands::Show { segments } => cmd_show(&session, segments),
        Commands::Params {
            project,
            service,
            module,
            method,
            json,
        } => cmd_params(
            &mut session,
            &MethodPath::new(project, service, module, method),
            &json,
        ),
        Commands::Send {
            project,
            service,
            module,
            method,
            params,
        } => cmd_send(
            session,
            MethodPath::new(project, service, module, method),
            params,
        ),
        Commands::Shell => {
            let rt = runtime();
            rt.block_on(shell::run_shell(session));
        }
        Commands::Format { .. } => {}
    }
}

// ── Ambient setup ────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log panics through `tracing` with their location and a backtrace.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown panic payload>"
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".into());
        let thread = std::thread::current();
        tracing::error!(
            thread = thread.name().unwrap_or("unnamed"),
            %location,
            backtrace = %std::backtrace::Backtrace::force_capture(),
            "unexpected panic: {}",
            message
        );
    }));
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&format!("failed to create tokio runtime: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn node_path(segments: Vec<String>) -> NodePath {
    match NodePath::new(segments) {
        Some(path) => path,
        None => fail("a path has between one and four names"),
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn cmd_format(text: &str) {
    let repaired = rpcman_format::repair(text);
    println!("{}", repaired);
    if serde_json::from_str::<Value>(&repaired).is_err() {
        eprintln!("error: text is not valid JSON, even after repair");
        process::exit(1);
    }
}

fn cmd_add(session: &mut Session, segments: Vec<String>) {
    let path = node_path(segments);
    if !session.add(&path) {
        fail(&format!(
            "cannot add {} {}: parent missing or name already taken",
            path.level(),
            path
        ));
    }
    println!("added {} {}", path.level(), path);
}

fn cmd_rename(session: &mut Session, segments: Vec<String>, new: &str) {
    let path = node_path(segments);
    if !session.rename(&path, new) {
        fail(&format!(
            "cannot rename {}: not found, invalid name or '{}' already taken",
            path, new
        ));
    }
    println!("renamed {} to {}", path, new);
}

fn cmd_delete(session: &mut Session, method: MethodPath) {
    let path = NodePath::from(method);
    if !session.delete(&path) {
        fail(&format!("no method at {}", path));
    }
    println!("deleted {}", path);
}

fn cmd_show(session: &Session, segments: Vec<String>) {
    let path = node_path(segments);
    let Some(selection) = session.select(&path) else {
        fail(&format!("nothing at {}", path));
    };
    let mut view = json!({
        "path": selection.path.to_string(),
        "level": selection.path.level().as_str(),
    });
    if selection.path.as_method().is_some() {
        view["params"] = selection.params;
        view["result"] = selection.result;
    } else if let Some(node) = session.tree().find(&path) {
        let children: Vec<&str> = node.children().iter().map(|c| c.name()).collect();
        view["children"] = json!(children);
    }
    println!("{}", rpcman_format::pretty(&view));
}

fn cmd_params(session: &mut Session, method: &MethodPath, text: &str) {
    match session.set_params(method, text) {
        Ok(params) => println!("{}", rpcman_format::pretty(&Value::Object(params))),
        Err(e) => {
            println!("{}", rpcman_format::pretty(&e.envelope()));
            process::exit(1);
        }
    }
}

fn cmd_send(mut session: Session, method: MethodPath, params: Option<String>) {
    let rt = runtime();
    let ok = rt.block_on(async {
        if let Err(e) = session.send(&method, params.as_deref()) {
            println!("{}", rpcman_format::pretty(&e.envelope()));
            return false;
        }
        let Some(outcome) = session.next_completion().await else {
            return false;
        };
        println!("{}", outcome.display);
        outcome.completion.is_success()
    });
    session.close();
    if !ok {
        process::exit(1);
    }
}

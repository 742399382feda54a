//! `rpcman shell` -- interactive session over one catalog.
//!
//! Stdin is read on its own thread and fed to the coordinator over a
//! channel, so the prompt stays live while a call is running. Results are
//! printed as soon as they arrive.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;

use rpcman_catalog::{MethodPath, NodePath};

use crate::session::{Outcome, Session};

const PROMPT: &str = "rpcman> ";

enum Flow {
    Continue,
    Quit,
}

/// Run the shell until `quit` or end of input.
///
/// A call still running at end of input is waited for so its result is not
/// lost.
pub async fn run_shell(mut session: Session) {
    let mut lines = spawn_stdin_reader();

    println!();
    println!("  rpcman: {}", describe_catalog(&session));
    println!(
        "  broker {} (timeout {}s)",
        session.client_config().broker(),
        session.client_config().timeout_secs()
    );
    println!();
    println!(
        "  Commands: help, tree, add, rename, delete, show, params, send, broker, timeout, status, quit"
    );
    println!();
    prompt();

    loop {
        let busy = session.is_busy();
        tokio::select! {
            outcome = session.next_completion(), if busy => {
                if let Some(outcome) = outcome {
                    println!();
                    print_outcome(&outcome);
                    prompt();
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    println!();
                    break;
                };
                // One bad command must not take the shell down.
                let flow =
                    panic::catch_unwind(AssertUnwindSafe(|| handle_line(&mut session, &line)))
                        .unwrap_or(Flow::Continue);
                if let Flow::Quit = flow {
                    break;
                }
                prompt();
            }
        }
    }

    if session.is_busy() {
        println!("  waiting for the running call...");
        if let Some(outcome) = session.next_completion().await {
            print_outcome(&outcome);
        }
    }
    session.close();
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "error reading input");
                    break;
                }
            }
        }
    });
    rx
}

fn prompt() {
    print!("{}", PROMPT);
    let _ = io::stdout().flush();
}

fn handle_line(session: &mut Session, line: &str) -> Flow {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Flow::Continue;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" => print_help(),
        "quit" | "exit" => return Flow::Quit,
        "tree" => print!("{}", session.tree().render()),
        "status" => {
            println!(
                "  broker {} (timeout {}s), {}",
                session.client_config().broker(),
                session.client_config().timeout_secs(),
                if session.is_busy() { "call in flight" } else { "idle" }
            );
        }
        "add" => match NodePath::new(args.iter().copied()) {
            Some(path) if session.add(&path) => println!("  added {}", path),
            Some(path) => eprintln!("  could not add {} (parent missing or name taken)", path),
            None => eprintln!("usage: add <project> [service] [module] [method]"),
        },
        "rename" => {
            let Some((new, segments)) = args.split_last() else {
                eprintln!("usage: rename <segments..> <new-name>");
                return Flow::Continue;
            };
            match NodePath::new(segments.iter().copied()) {
                Some(path) if session.rename(&path, new) => {
                    println!("  renamed {} to {}", path, new)
                }
                Some(path) => eprintln!("  could not rename {} (missing or name taken)", path),
                None => eprintln!("usage: rename <segments..> <new-name>"),
            }
        }
        "delete" => match method_path(args) {
            Some(path) => {
                let node = NodePath::from(path);
                if session.delete(&node) {
                    println!("  deleted {}", node);
                } else {
                    eprintln!("  no method at {}", node);
                }
            }
            None => eprintln!("usage: delete <project> <service> <module> <method>"),
        },
        "show" => match NodePath::new(args.iter().copied()) {
            Some(path) => match session.select(&path) {
                Some(selection) => {
                    println!("  {} ({})", selection.path, selection.path.level());
                    if selection.path.as_method().is_some() {
                        println!("params:\n{}", rpcman_format::pretty(&selection.params));
                        println!("result:\n{}", rpcman_format::pretty(&selection.result));
                    }
                }
                None => eprintln!("  nothing at {}", path),
            },
            None => eprintln!("usage: show <project> [service] [module] [method]"),
        },
        "params" => {
            let (words, rest) = take_words(trimmed, 5);
            match (method_path(&words[1..]), rest) {
                (Some(path), text) if !text.is_empty() => match session.set_params(&path, text) {
                    Ok(params) => println!(
                        "{}",
                        rpcman_format::pretty(&serde_json::Value::Object(params))
                    ),
                    Err(e) => println!("{}", rpcman_format::pretty(&e.envelope())),
                },
                _ => eprintln!("usage: params <project> <service> <module> <method> <json>"),
            }
        }
        "send" => {
            let (words, rest) = take_words(trimmed, 5);
            let params = Some(rest).filter(|text| !text.is_empty());
            match method_path(&words[1..]) {
                Some(path) => match session.send(&path, params) {
                    Ok(id) => println!("  call #{} sent to {}", id, path),
                    Err(e) => println!("{}", rpcman_format::pretty(&e.envelope())),
                },
                None => eprintln!("usage: send <project> <service> <module> <method> [json]"),
            }
        }
        "broker" => match args {
            [broker] => match session.set_broker(broker) {
                Ok(()) => println!("  broker set to {}", broker),
                Err(e) => eprintln!("  {}", e),
            },
            _ => eprintln!("usage: broker <address>"),
        },
        "timeout" => match args.first().map(|raw| raw.parse::<u64>()) {
            Some(Ok(seconds)) => match session.set_timeout(seconds) {
                Ok(()) => println!("  timeout set to {}s", seconds),
                Err(e) => eprintln!("  {}", e),
            },
            _ => eprintln!("usage: timeout <seconds>"),
        },
        _ => eprintln!("unknown command '{}' (type 'help')", cmd),
    }
    Flow::Continue
}

/// Split off up to `n` leading words; the remainder keeps its inner spacing.
fn take_words(text: &str, n: usize) -> (Vec<&str>, &str) {
    let mut rest = text.trim_start();
    let mut words = Vec::with_capacity(n);
    while words.len() < n && !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        words.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (words, rest.trim_end())
}

fn method_path(args: &[&str]) -> Option<MethodPath> {
    match args {
        [p, s, m, x] => Some(MethodPath::new(*p, *s, *m, *x)),
        _ => None,
    }
}

fn describe_catalog(session: &Session) -> String {
    match session.store().file() {
        Some(file) => format!(
            "{} ({} projects)",
            file.display(),
            session.store().catalog().projects.len()
        ),
        None => "in-memory catalog".to_string(),
    }
}

fn print_outcome(outcome: &Outcome) {
    let request = &outcome.completion.request;
    println!("  call #{} {} returned:", outcome.completion.id, request.path);
    println!("{}", outcome.display);
    if outcome.persisted {
        println!("  result saved");
    }
}

fn print_help() {
    println!();
    println!("  Commands:");
    println!("    tree                                     Show the catalog");
    println!("    add <p> [s] [m] [method]                 Add a node under an existing parent");
    println!("    rename <segments..> <new>                Rename a node");
    println!("    delete <p> <s> <m> <method>              Delete a method");
    println!("    show <segments..>                        Show a node (params and result for methods)");
    println!("    params <p> <s> <m> <method> <json>       Store params for a method");
    println!("    send <p> <s> <m> <method> [json]         Call a method (stored params if omitted)");
    println!("    broker <address>                         Set the broker address");
    println!("    timeout <seconds>                        Set the call timeout (1-1000)");
    println!("    status                                   Show client settings and call state");
    println!("    help                                     Show this help");
    println!("    quit                                     Exit the shell");
    println!();
}

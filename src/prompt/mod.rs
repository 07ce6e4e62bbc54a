pub mod command;

use std::io::Write;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::constants::{full_version, DEFAULT_APP_NAME, ICON_PLACEHOLDER, INPUT_PROMPT};
use crate::error::SessionError;
use crate::network::identity::PeerIdentity;
use crate::network::registry::PeerRegistry;
use crate::network::session::{DisconnectReason, SessionEvent};
use crate::node::ChatNode;
use command::{parse, Command, COMMAND_NAMES, HELP_TEXT, RECEIVER_COMMANDS};

/// A line read by the input thread plus the channel it waits on before
/// reading the next one (`false` stops the thread).
type InputLine = (String, oneshot::Sender<bool>);

/// Render a session event the way the prompt shows it.
pub fn format_session_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Connected {
            peer, remote_addr, ..
        } => format!("New connection from {}. Name: {}", remote_addr, peer),
        SessionEvent::Message { from, line } => format!("{}: {}", from.display(), line),
        SessionEvent::Disconnected { peer, reason } => match reason {
            DisconnectReason::ReadError(e) => format!("Connection with {} lost ({}).", peer, e),
            _ => format!("Connection with {} lost.", peer),
        },
    }
}

/// Interactive command loop. Returns after `/exit`, EOF or Ctrl+C.
pub async fn run_prompt(node: Arc<ChatNode>, mut events: mpsc::Receiver<SessionEvent>) {
    println!(
        "🟢 {} {} as '{}'. Type /help for commands.",
        DEFAULT_APP_NAME,
        full_version(),
        node.alias()
    );

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print!("\n{}\n{}", format_session_event(&event), INPUT_PROMPT);
            let _ = std::io::stdout().flush();
        }
    });

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<InputLine>();
    spawn_input_thread(node.registry().clone(), line_tx);

    let mut receivers: Vec<PeerIdentity> = Vec::new();
    while let Some((line, resume)) = line_rx.recv().await {
        let keep_going = match parse(&line) {
            Ok(Command::Exit) => false,
            Ok(cmd) => {
                handle_command(&node, cmd, &mut receivers).await;
                true
            }
            Err(usage) => {
                println!("Error {}", usage);
                true
            }
        };
        let _ = resume.send(keep_going);
        if !keep_going {
            break;
        }
    }
    printer.abort();
    println!("👋 Exiting.");
}

async fn handle_command(node: &ChatNode, cmd: Command, receivers: &mut Vec<PeerIdentity>) {
    match cmd {
        Command::Connect(address) => match node.dial(&address).await {
            Ok(peer) => println!("{}Connected to {}", ICON_PLACEHOLDER, peer),
            Err(SessionError::SelfConnect(_)) => println!("Error cannot connect to self"),
            Err(e) => println!("Error connecting to address: {}", e),
        },
        Command::Disconnect(name) => {
            let result = name
                .parse::<PeerIdentity>()
                .and_then(|peer| node.disconnect(&peer));
            match result {
                Ok(()) => {
                    receivers.retain(|r| r.as_str() != name);
                    println!("{}Disconnected {}", ICON_PLACEHOLDER, name);
                }
                Err(e) => println!("Error {}", e),
            }
        }
        Command::SetReceivers(names) if names.is_empty() => {
            receivers.clear();
            println!("Recievers cleared");
        }
        Command::SetReceivers(names) => match node.resolve_receivers(&names) {
            Ok(resolved) => {
                *receivers = resolved;
                println!("Recievers updated");
            }
            Err(e) => println!("{}", capitalize(&e.to_string())),
        },
        Command::Peers => {
            let peers = node.current_peer_names();
            if peers.is_empty() {
                println!("{}No connected peers.", ICON_PLACEHOLDER);
            }
            for peer in peers {
                let marker = if receivers.contains(&peer) { "*" } else { " " };
                println!("{}{} {}", ICON_PLACEHOLDER, marker, peer);
            }
        }
        Command::Help => println!("{}", HELP_TEXT),
        Command::Message(text) => {
            if receivers.is_empty() {
                println!("No recievers selected; use /recievers <name:port> ...");
                return;
            }
            let report = node.route(&text, receivers).await;
            for notice in report.notices() {
                println!("{}", notice);
            }
        }
        Command::Empty | Command::Exit => {}
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Run rustyline on a plain OS thread so a pending read never holds up runtime shutdown.
fn spawn_input_thread(registry: PeerRegistry, line_tx: mpsc::UnboundedSender<InputLine>) {
    let spawned = std::thread::Builder::new()
        .name("prompt-input".into())
        .spawn(move || {
            use rustyline::error::ReadlineError;
            use rustyline::{CompletionType, Config as RLConfig, Editor};

            let rl_cfg = RLConfig::builder()
                .history_ignore_space(true)
                .completion_type(CompletionType::List)
                .build();
            let mut rl: Editor<PromptCompleter, rustyline::history::DefaultHistory> =
                match Editor::with_config(rl_cfg) {
                    Ok(rl) => rl,
                    Err(e) => {
                        eprintln!("❌ Prompt init failed: {}", e);
                        return;
                    }
                };
            rl.set_helper(Some(PromptCompleter { registry }));

            loop {
                let line = match rl.readline(INPUT_PROMPT) {
                    Ok(line) => line,
                    Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
                    Err(e) => {
                        eprintln!("❌ Read error: {}", e);
                        break;
                    }
                };
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let (resume_tx, resume_rx) = oneshot::channel();
                if line_tx.send((line, resume_tx)).is_err() {
                    break;
                }
                match resume_rx.blocking_recv() {
                    Ok(true) => continue,
                    _ => break,
                }
            }
        });
    if let Err(e) = spawned {
        eprintln!("❌ Failed to start prompt input thread: {}", e);
    }
}

/// Completes command names, and peer names after `/disconnect` and `/recievers`.
struct PromptCompleter {
    registry: PeerRegistry,
}

impl rustyline::Helper for PromptCompleter {}

impl rustyline::hint::Hinter for PromptCompleter {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl rustyline::highlight::Highlighter for PromptCompleter {}

impl rustyline::validate::Validator for PromptCompleter {}

impl rustyline::completion::Completer for PromptCompleter {
    type Candidate = rustyline::completion::Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), rustyline::error::ReadlineError> {
        let before = &line[..pos];
        let token_start = before
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let current = &before[token_start..];

        let candidates: Vec<String> = match before.split_whitespace().next() {
            None => COMMAND_NAMES.iter().map(|s| s.to_string()).collect(),
            Some(_) if token_start == 0 => COMMAND_NAMES.iter().map(|s| s.to_string()).collect(),
            Some(cmd) if cmd == "/disconnect" || RECEIVER_COMMANDS.contains(&cmd) => self
                .registry
                .snapshot()
                .into_iter()
                .map(|p| p.to_string())
                .collect(),
            Some(_) => Vec::new(),
        };

        let out = candidates
            .into_iter()
            .filter(|c| c.starts_with(current))
            .map(|c| rustyline::completion::Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((token_start, out))
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use maildeck::app::{self, AppModel, Message};
use maildeck::config::ClientConfig;
use maildeck::core::grouping;
use maildeck::transport::http::HttpTransport;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ClientConfig::resolve();
    let transport = match HttpTransport::new(&config.server_url) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            eprintln!("Cannot reach backend at {}: {e}", config.server_url);
            std::process::exit(1);
        }
    };
    log::info!("Using backend at {}", config.server_url);

    let relist = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(tx, relist.clone()));

    let model = AppModel::new(transport);
    app::run(model, rx, render(relist)).await;
}

/// One line of user input. Most commands feed the controller; re-listing the
/// channels is purely a presentation concern and stays in the driver.
#[derive(Debug)]
enum Command {
    Feed(Message),
    ListChannels,
}

/// Parse one line of user input. Indices shown to the user are 1-based.
fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next()?;
    let index = |s: &str| s.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
    let feed = |message| Some(Command::Feed(message));

    match cmd {
        "channels" | "c" => Some(Command::ListChannels),
        "select" | "s" => feed(Message::SelectChannel(index(parts.next()?)?)),
        "open" | "o" => feed(Message::SelectMessage(index(parts.next()?)?)),
        "summarize" | "sum" => feed(Message::Summarize),
        "search" | "/" => {
            let query = parts.collect::<Vec<_>>().join(" ");
            feed(Message::SearchExecute(query))
        }
        "clear" => feed(Message::SearchClear),
        "more" => feed(Message::LoadMore),
        "trash" | "t" => feed(Message::Trash(index(parts.next()?)?)),
        "read" | "r" => feed(Message::MarkRead(index(parts.next()?)?)),
        "imp" | "i" => {
            let idx = index(parts.next()?)?;
            let level = parts.next()?.parse::<i64>().ok()?;
            feed(Message::SetImportance(idx, level))
        }
        "auth" => feed(Message::CompleteAuth(parts.collect::<Vec<_>>().join(" "))),
        "url" => feed(Message::OpenExternal(parts.next()?.to_string())),
        "reload" => feed(Message::ReloadChannels),
        "quit" | "exit" | "q" => feed(Message::Quit),
        "help" | "?" => {
            print_help();
            None
        }
        other => {
            println!("Unknown command: {other} (try 'help')");
            None
        }
    }
}

fn print_help() {
    println!(
        "Commands:\n  \
         channels       list the channels\n  \
         select <n>     switch to channel n\n  \
         open <n>       open message n (loads body + related)\n  \
         summarize      summarize the open message\n  \
         search <text>  semantic search across the mailbox\n  \
         clear          leave search, back to the channel\n  \
         more           pull one more page of older mail\n  \
         trash <n>      move message n to trash\n  \
         read <n>       mark message n as read\n  \
         imp <n> <1-5>  override importance of message n\n  \
         auth <code>    complete backend authorization\n  \
         url <link>     open a link in the browser\n  \
         reload         re-read channel definitions\n  \
         quit"
    );
}

async fn read_commands(tx: mpsc::UnboundedSender<Message>, relist: Arc<AtomicBool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_command(line) {
                    Some(Command::Feed(message)) => {
                        if tx.send(message).is_err() {
                            return;
                        }
                    }
                    Some(Command::ListChannels) => {
                        relist.store(true, Ordering::SeqCst);
                        // Noop wakes the run loop so the renderer fires.
                        if tx.send(Message::Noop).is_err() {
                            return;
                        }
                    }
                    None => {}
                }
            }
            Ok(None) => break, // EOF
            Err(e) => {
                log::warn!("stdin error: {e}");
                break;
            }
        }
    }
    let _ = tx.send(Message::Quit);
}

/// Build the render closure: prints only what changed since the last call,
/// so background completions do not spam the terminal. The `relist` flag
/// forces a channel-list reprint on demand.
fn render(relist: Arc<AtomicBool>) -> impl FnMut(&AppModel) {
    let mut last_status = String::new();
    let mut last_channels: Vec<String> = Vec::new();
    let mut last_list: Vec<String> = Vec::new();
    let mut last_body = String::new();
    let mut last_summary = String::new();
    let mut last_related: Vec<String> = Vec::new();
    let mut last_auth_url: Option<String> = None;

    move |model: &AppModel| {
        if model.auth_url != last_auth_url {
            last_auth_url = model.auth_url.clone();
            if let Some(url) = &last_auth_url {
                println!("\nAuthorize this client, then run `auth <code>`:\n  {url}");
            }
        }

        if relist.swap(false, Ordering::SeqCst) || model.channels != last_channels {
            last_channels = model.channels.clone();
            print_channels(model);
        }

        let list_key: Vec<String> = model.messages.iter().map(|m| m.id.clone()).collect();
        if list_key != last_list {
            last_list = list_key;
            print_message_list(model);
        }

        if model.preview_body != last_body {
            last_body = model.preview_body.clone();
            if !last_body.is_empty() {
                println!("\n--- message ---\n{}\n---------------", last_body.trim());
            }
        }

        if model.summary != last_summary {
            last_summary = model.summary.clone();
            if !last_summary.is_empty() {
                println!("\nSummary:\n{last_summary}");
            }
        }

        let related_key: Vec<String> = model.related.iter().map(|m| m.id.clone()).collect();
        if related_key != last_related {
            last_related = related_key;
            if !model.related.is_empty() {
                println!("\nRelated:");
                for m in &model.related {
                    println!("  {} — {}", m.from, m.subject);
                }
            }
        }

        if model.status_message != last_status {
            last_status = model.status_message.clone();
            println!("[{last_status}]");
        }
    }
}

fn print_channels(model: &AppModel) {
    println!("\nChannels:");
    for (i, name) in model.channels.iter().enumerate() {
        let marker = if model.active_channel == Some(i) { "*" } else { " " };
        println!(" {marker} [{}] {name}", i + 1);
    }
}

fn print_message_list(model: &AppModel) {
    if model.messages.is_empty() {
        println!("\n(no messages)");
        return;
    }
    let my_address = model
        .backend_config
        .as_ref()
        .map(|c| c.my_address.as_str())
        .unwrap_or("");
    let now = chrono::Local::now();

    println!();
    for row in grouping::group_rows(&model.messages, now) {
        if let Some(group) = row.separator {
            println!("── {group} ──");
        }
        let m = &model.messages[row.index];
        let unread = if m.is_read == 0 { "●" } else { " " };
        let badge = if m.is_direct(my_address) { " TO-ME" } else { "" };
        let deadline = match grouping::days_left(&m.deadline, now) {
            Some(d) if d < 0 => format!("  OVERDUE ({}d ago)", -d),
            Some(0) => "  due today".into(),
            Some(d) => format!("  due in {d}d"),
            None => String::new(),
        };
        println!(
            "{unread} [{}] (imp {}){badge} {} — {}{deadline}",
            row.index + 1,
            m.importance,
            m.from,
            m.subject
        );
    }
}

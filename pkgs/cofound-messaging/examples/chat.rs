use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cofound_messaging::display::{display_name, initials, participant_summary, shows_sender_label};
use cofound_messaging::{HttpBackend, Messenger, MessengerConfig, MessengerEvent};
use futures::StreamExt;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::EnvFilter;

/// Cofound Chat - terminal client for co-founder match conversations
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend origin, overrides COFOUND_BASE_URL
    #[arg(short, long)]
    base_url: Option<String>,

    /// Bearer token for the matching API
    #[arg(short, long, env = "COFOUND_TOKEN")]
    token: Option<String>,

    /// Local profile id; derived from conversations when omitted
    #[arg(short, long)]
    profile_id: Option<String>,

    /// Refresh period in seconds, overrides COFOUND_POLL_SECS
    #[arg(long)]
    poll_secs: Option<u64>,
}

fn show_help() {
    println!("\n📖 Available Commands:");
    println!("  ┌──────────────────────────────────────────────────┐");
    println!("  │  help, ?                 Show this help           │");
    println!("  │  list, l                 List conversations       │");
    println!("  │  open, o <n>             Open conversation #n     │");
    println!("  │  matches, m              List matches to message  │");
    println!("  │  start <n>               Chat with match #n       │");
    println!("  │  match <match-id>        Open chat by match id    │");
    println!("  │  send, s <msg>           Send to open chat        │");
    println!("  │  history, h              Show open chat history   │");
    println!("  │  info, i                 Toggle group info        │");
    println!("  │  refresh, r              Refresh now              │");
    println!("  │  close, c                Close the open chat      │");
    println!("  │  quit, exit, q           Exit                     │");
    println!("  └──────────────────────────────────────────────────┘");
}

fn print_conversations(messenger: &Messenger) {
    let conversations = messenger.conversations();
    if conversations.is_empty() {
        println!("📭 No conversations yet. Use 'matches' to find someone to message.");
        return;
    }
    let selected = messenger.selected_conversation().map(|c| c.id);
    for (i, conv) in conversations.iter().enumerate() {
        let marker = if selected.as_deref() == Some(conv.id.as_str()) { ">" } else { " " };
        let unread = if conv.unread_count > 0 {
            format!(" ({})", conv.unread_count)
        } else {
            String::new()
        };
        println!(
            "{} {}. [{}] {}{} - {}",
            marker,
            i + 1,
            initials(&display_name(conv)),
            display_name(conv),
            unread,
            messenger.preview_line(conv)
        );
    }
}

fn print_history(messenger: &Messenger) {
    let Some(conv) = messenger.selected_conversation() else {
        println!("💬 Select a conversation to start messaging");
        return;
    };
    println!("\n── {} ──", display_name(&conv));
    if conv.is_group() {
        println!("   {}", participant_summary(&conv));
    }

    let messages = messenger.messages();
    if messages.is_empty() {
        println!("   No messages yet. Say hello!");
    }
    for (i, message) in messages.iter().enumerate() {
        let own = messenger.is_own(message);
        let time = message
            .created_at
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_default();
        if own {
            println!("{:>50} {}", message.body, time);
            continue;
        }
        if conv.is_group() && shows_sender_label(&messages, i, own) {
            let name = conv
                .participant(&message.sender_id)
                .and_then(|p| p.first_name())
                .unwrap_or("Someone");
            println!("  {}", name);
        }
        println!("  {} {}", message.body, time);
    }
}

fn print_group_info(messenger: &Messenger) {
    let Some(conv) = messenger.selected_conversation() else {
        return;
    };
    let Some(group) = conv.group.as_ref() else {
        return;
    };
    if let Some(description) = &group.description {
        println!("📝 {}", description);
    }
    println!("👥 {} members", group.participant_count);
    for participant in &group.participants {
        println!(
            "   {} {}{}",
            initials(participant.name.as_deref().unwrap_or("")),
            participant.name.as_deref().unwrap_or("Unknown"),
            if participant.role == cofound_messaging::ParticipantRole::Creator {
                " (creator)"
            } else {
                ""
            }
        );
    }
}

fn handle_event(event: MessengerEvent) {
    debug!(?event, "Messenger event");
    match event {
        MessengerEvent::Notice(text) => println!("⚠️  {}", text),
        MessengerEvent::ConversationPromoted {
            temp_id,
            conversation_id,
        } => {
            info!(%temp_id, %conversation_id, "Conversation created");
        }
        MessengerEvent::SendFailed {
            conversation_id,
            error,
        } => {
            error!(%conversation_id, %error, "Send failed");
        }
        _ => {}
    }
}

#[instrument(skip(messenger), fields(command = input))]
async fn process_command(input: &str, messenger: &Messenger) -> bool {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some(command) = parts.first() else {
        return true;
    };

    match *command {
        "help" | "?" => show_help(),
        "list" | "l" => print_conversations(messenger),
        "open" | "o" => {
            let index = parts.get(1).and_then(|n| n.parse::<usize>().ok());
            let conversation = index
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| messenger.conversations().get(i).cloned());
            match conversation {
                Some(conv) => {
                    if messenger.select_conversation(Some(conv.id.as_str())).await.is_ok() {
                        print_history(messenger);
                    }
                }
                None => println!("❌ Usage: open <n> (see 'list')"),
            }
        }
        "matches" | "m" => match messenger.load_available_matches().await {
            Ok(0) => println!("🤝 Everyone you matched with already has a conversation"),
            Ok(_) => {
                for (i, candidate) in messenger.available_matches().iter().enumerate() {
                    let name = candidate
                        .profile
                        .as_ref()
                        .and_then(|p| p.name.clone())
                        .unwrap_or_else(|| "User".to_string());
                    println!("  {}. {}", i + 1, name);
                }
            }
            Err(e) => println!("❌ Could not load matches: {}", e),
        },
        "start" => {
            let candidate = parts
                .get(1)
                .and_then(|n| n.parse::<usize>().ok())
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| messenger.available_matches().get(i).cloned());
            match candidate {
                Some(candidate) => {
                    if messenger.start_conversation(&candidate).await.is_ok() {
                        print_history(messenger);
                    }
                }
                None => println!("❌ Usage: start <n> (see 'matches')"),
            }
        }
        "match" => match parts.get(1) {
            Some(match_id) => {
                if messenger.open_match(match_id).await.is_ok() {
                    print_history(messenger);
                }
            }
            None => println!("❌ Usage: match <match-id>"),
        },
        "send" | "s" => {
            if parts.len() < 2 {
                println!("❌ Usage: send <message>");
            } else {
                messenger.set_draft(parts[1..].join(" "));
                match messenger.send_message().await {
                    Ok(cofound_messaging::SendOutcome::Ignored) => {
                        println!("💬 Open a conversation first");
                    }
                    Ok(_) => print_history(messenger),
                    Err(_) => println!("✏️  Draft kept: {}", messenger.draft()),
                }
            }
        }
        "history" | "h" => print_history(messenger),
        "info" | "i" => {
            if messenger.toggle_group_info() {
                print_group_info(messenger);
            }
        }
        "refresh" | "r" => match messenger.refresh().await {
            Ok(outcome) => {
                debug!(?outcome, "Manual refresh");
                print_conversations(messenger);
            }
            Err(e) => println!("❌ Refresh failed: {}", e),
        },
        "close" | "c" => {
            let _ = messenger.select_conversation(None).await;
        }
        "quit" | "exit" | "q" => return false,
        other => println!("❓ Unknown command '{}'. Type 'help'.", other),
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = MessengerConfig::from_env()?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = args.poll_secs {
        config.poll_interval = Duration::from_secs(secs);
    }
    config.validate()?;

    info!(base_url = %config.base_url, "Connecting to matching API");
    let backend = Arc::new(HttpBackend::new(config.clone(), args.token)?);
    let (messenger, mut events) = Messenger::new(backend, config, args.profile_id);
    let messenger = Arc::new(messenger);

    println!("🚀 Cofound Chat - type 'help' for commands");
    if messenger.load().await.is_ok() {
        print_conversations(&messenger);
    }
    let polling = messenger.start_polling();

    let (stdin_sender, mut stdin_receiver) = tokio::sync::mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        use tokio::io::{AsyncBufReadExt, BufReader};
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && stdin_sender.send(line).is_err() {
                break;
            }
        }
    });

    let mut running = true;
    while running {
        print!("> ");
        io::stdout().flush()?;

        tokio::select! {
            Some(event) = events.next() => handle_event(event),
            Some(input) = stdin_receiver.recv() => {
                running = process_command(&input, &messenger).await;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n👋 Bye");
                running = false;
            }
        }
    }

    polling.stop().await;
    Ok(())
}

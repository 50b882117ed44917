use serde_json::json;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use vidify::models::history::HistoryEntry;
use vidify::models::results::{parse_timestamp, Hit};
use vidify::services::player::{DeepLinkHost, PlayerControl, PlayerController};
use vidify::utils::display::DisplayFormatter;
use vidify::{Config, ExtensionContext, MessageRouter, SearchKind, Status};

fn print_help() {
    println!("Commands:");
    println!("  watch <url>          - Set the active video");
    println!("  t <term>             - Search the transcript");
    println!("  o <term>             - Search detected objects");
    println!("  toc                  - List every detected object");
    println!("  seek <#|time>        - Jump to a result number or a time (1:23, 90s)");
    println!("  history              - Show recent searches");
    println!("  clear [history]      - Clear cached results (and history)");
    println!("  login | logout | auth");
    println!("  exit                 - Exit the program");
}

/// Where `seek <arg>` should go. A bare number picks a listed result; times
/// need a colon or an `s` suffix.
fn seek_target(arg: &str, hits: &[Hit]) -> Result<f64, String> {
    match arg.parse::<usize>() {
        Ok(n) => n
            .checked_sub(1)
            .and_then(|i| hits.get(i))
            .map(|hit| hit.seconds)
            .ok_or_else(|| {
                format!(
                    "No result #{} ({} results listed); use 1:23 or {}s for a time",
                    n,
                    hits.len(),
                    n
                )
            }),
        Err(_) => parse_timestamp(arg)
            .ok_or_else(|| "Expected a result number or a time like 1:23 or 90s".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    info!("Starting video search relay");
    let ctx = Arc::new(ExtensionContext::open(config).await?);
    let router = MessageRouter::new(Arc::clone(&ctx));
    let display = DisplayFormatter::new();
    let mut player = PlayerController::new(DeepLinkHost::new());
    player.host_mut().set_video(ctx.resolver.resolve(None).await?);

    println!("=== Video Search Relay ===");
    print_help();

    let mut last_hits: Vec<Hit> = Vec::new();
    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        let (message, kind) = match command {
            "" => continue,
            "exit" | "quit" => {
                debug!("Received exit command");
                break;
            }
            "help" => {
                print_help();
                continue;
            }
            "watch" => {
                match ctx.resolver.observe_navigation(arg).await? {
                    Some(video_id) => {
                        println!("Watching {}", video_id);
                        player.host_mut().set_video(Some(video_id));
                        player.on_navigate();
                        last_hits.clear();
                    }
                    None => println!("Not a YouTube video URL: {}", arg),
                }
                continue;
            }
            "seek" => {
                match seek_target(arg, &last_hits) {
                    Ok(seconds) if player.seek_to(seconds) => {}
                    Ok(_) => println!("No video to seek; use `watch <url>` first"),
                    Err(reason) => println!("{}", reason),
                }
                continue;
            }
            "t" | "transcript" => (
                json!({"action": "searchTranscript", "searchTerm": arg}),
                Some(SearchKind::Transcript),
            ),
            "o" | "objects" => (
                json!({"action": "searchObjects", "searchTerm": arg}),
                Some(SearchKind::Object),
            ),
            "toc" => (json!({"action": "tableOfContents"}), Some(SearchKind::Toc)),
            "history" => (json!({"action": "getSearchHistory"}), None),
            "clear" => (
                json!({"action": "clearCache", "clearHistory": arg == "history"}),
                None,
            ),
            "login" => (json!({"action": "login"}), None),
            "logout" => (json!({"action": "logout"}), None),
            "auth" => (json!({"action": "checkAuth"}), None),
            other => (json!({"action": other}), None),
        };

        let envelope = router.handle_json(message).await;
        match (kind, envelope.status, envelope.data.as_ref()) {
            (Some(kind), Status::Success | Status::Empty, Some(data)) => {
                last_hits = display.result_rows(kind, data);
                println!("{}", display.format_header(&format!("{} results", kind)));
                println!("{}", display.format_results(kind, &last_hits));
            }
            (None, Status::Success, Some(data)) if command == "history" => {
                let entries: Vec<HistoryEntry> = serde_json::from_value(data.clone())?;
                println!("{}", display.format_header("Search history"));
                println!("{}", display.format_history(&entries));
            }
            (_, _, Some(data)) if envelope.message.is_none() => {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
            _ => println!("{}", display.format_status(&envelope)),
        }
    }

    info!("Shutting down");
    drop(router);
    if let Ok(ctx) = Arc::try_unwrap(ctx) {
        ctx.shutdown();
    }
    Ok(())
}

/**
 * Attendance Sync CLI
 *
 * Command-line front end for the sync client. Starts a guest sync for one
 * event and prints its progress stream, or clears the event's attendance
 * records with --clear.
 */
use attendsync::client::{Config, Severity, SyncClient};
use attendsync::shared::config::AppConfig;
use attendsync::shared::session::SyncPhase;
use tokio::sync::broadcast::error::RecvError;

fn print_usage() {
    eprintln!("Usage: attendsync <event-id> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --server <URL>   Override the platform API base URL");
    eprintln!("  --clear          Clear the event's attendance records instead of syncing");
    eprintln!("  --attendees      Print the attendee roster after the operation");
    eprintln!("  -h, --help       Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ATTENDSYNC_API_URL       API base URL (same as --server)");
    eprintln!("  ATTENDSYNC_TOKEN         Bearer token for authenticated endpoints");
    eprintln!("  ATTENDSYNC_CONFIG        Path to a TOML config file");
    eprintln!("  RUST_LOG                 Log filter (default: info)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut event_id: Option<String> = None;
    let mut server: Option<String> = None;
    let mut clear = false;
    let mut attendees = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--server" => match iter.next() {
                Some(url) => server = Some(url.clone()),
                None => {
                    eprintln!("--server needs a URL");
                    std::process::exit(2);
                }
            },
            "--clear" => clear = true,
            "--attendees" => attendees = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(2);
            }
            other => {
                if event_id.is_some() {
                    eprintln!("Expected exactly one event id");
                    print_usage();
                    std::process::exit(2);
                }
                event_id = Some(other.to_string());
            }
        }
    }

    let event_id = match event_id {
        Some(id) => id,
        None => {
            print_usage();
            std::process::exit(2);
        }
    };

    let mut app = match AppConfig::load() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(server) = server {
        app.server_url = server;
        if let Err(e) = app.validate() {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    }

    let mut config = Config::from_app(app);
    if let Ok(token) = std::env::var("ATTENDSYNC_TOKEN") {
        if !token.is_empty() {
            config.set_token(Some(token));
        }
    }

    let client = SyncClient::new(config);

    // Failure notifications go to stderr no matter which operation runs
    let mut toasts = client.notifications().subscribe();
    let toast_printer = tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(toast) => {
                    let prefix = match toast.severity {
                        Severity::Error => "error",
                        Severity::Info => "note",
                    };
                    eprintln!("{}: {}: {}", prefix, toast.title, toast.body);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[CLI] Dropped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut failed = false;

    if clear {
        match client.clear_attendance(&event_id).await {
            Ok(()) => println!("Attendance cleared for event {}", event_id),
            Err(e) => {
                eprintln!("Clearing attendance for event {} failed: {}", event_id, e);
                failed = true;
            }
        }
    } else {
        let handle = client.start_sync(&event_id).await?;
        let mut updates = handle.subscribe();
        let progress_printer = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(msg) => println!("[{:>3}%] {}", msg.progress, msg.message),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[CLI] Dropped {} progress updates", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let session = handle.wait().await;
        let _ = progress_printer.await;

        match session.phase {
            SyncPhase::Complete => {
                match session.counters() {
                    Some(counters) => println!(
                        "Sync complete: {} guests ({} synced, {} failed)",
                        counters.total, counters.success, counters.failure
                    ),
                    None => println!("Sync complete"),
                }
            }
            phase => {
                let reason = session.error.as_deref().unwrap_or("unknown reason");
                eprintln!("Sync did not complete (phase {}): {}", phase, reason);
                failed = true;
            }
        }
    }

    if attendees && !failed {
        match client.fetch_attendees(&event_id).await {
            Ok(roster) => {
                println!("{} attendees:", roster.len());
                for attendee in roster {
                    match attendee.email {
                        Some(email) => println!("  {} <{}>", attendee.name, email),
                        None => println!("  {}", attendee.name),
                    }
                }
            }
            Err(e) => {
                eprintln!("Fetching attendees for event {} failed: {}", event_id, e);
                failed = true;
            }
        }
    }

    // Dropping the client closes the notification channel; the printer
    // drains anything already published, then sees Closed and ends
    drop(client);
    let _ = toast_printer.await;
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

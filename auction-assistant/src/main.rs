// Auction assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, the terminal is the console)
// 2. Load config
// 3. Open the state store
// 4. Load the player catalog
// 5. Build DraftState and recover any saved auction
// 6. Spawn the app task and the printer task
// 7. Read console lines until quit or end of input
// 8. Cleanup on exit

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use auction_assistant::app;
use auction_assistant::catalog::Catalog;
use auction_assistant::config;
use auction_assistant::console::{self, ConsoleInput};
use auction_assistant::db;
use auction_assistant::draft::state::DraftState;
use auction_assistant::persistence::{KeyValueStore, MemoryStore};
use auction_assistant::protocol::UserCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Auction assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: auction={}, default budget {}, roster size {}",
        config.auction.name,
        config.auction.default_budget,
        config.auction.role_limits.total()
    );

    // 3. Open the state store. Without SQLite the auction still runs but is
    // not saved across restarts.
    let store: Box<dyn KeyValueStore> = match db::Database::open(&config.storage.db_path) {
        Ok(db) => {
            info!("Database opened at {}", config.storage.db_path);
            Box::new(db)
        }
        Err(e) => {
            warn!("Database unavailable, state will not survive a restart: {:#}", e);
            println!("[warn] could not open {}, state will not be saved", config.storage.db_path);
            Box::new(MemoryStore::new())
        }
    };

    // 4. Load the player catalog
    let catalog = match Catalog::load(Path::new(&config.catalog.path)) {
        Ok(catalog) => {
            info!("Loaded {} players from {}", catalog.len(), config.catalog.path);
            catalog
        }
        Err(e) => {
            error!("Failed to load player catalog: {}", e);
            println!("[warn] {e}; continuing with an empty catalog");
            Catalog::empty()
        }
    };

    // 5. Draft state and crash recovery
    let draft = DraftState::new(catalog, config.auction.role_limits);
    let mut app_state = app::AppState::new(config, draft, store);
    if app::recover_from_store(&mut app_state) {
        println!(
            "[info] resumed saved auction: {} participants, {} sales",
            app_state.draft.participants().len(),
            app_state.draft.ledger().len()
        );
    }

    // 6. Channels and tasks
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    let printer_handle = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            println!("{}", console::render_update(&update));
        }
    });

    // 7. Console loop
    println!("Type 'help' for the list of commands.");
    cmd_tx.send(UserCommand::Show).await.ok();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read console input: {}", e);
                break;
            }
        };
        match console::parse_line(&line) {
            Ok(ConsoleInput::Help) => println!("{}", console::HELP),
            Ok(ConsoleInput::Command(UserCommand::Quit)) => break,
            Ok(ConsoleInput::Command(cmd)) => {
                if cmd_tx.send(cmd).await.is_err() {
                    error!("Application task stopped, leaving console loop");
                    break;
                }
            }
            Err(console::ParseError::Empty) => {}
            Err(e) => println!("[error] {e}"),
        }
    }

    // 8. Cleanup: stop the app task and let the printer drain
    let _ = cmd_tx.send(UserCommand::Quit).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
        let _ = printer_handle.await;
    })
    .await;

    info!("Auction assistant shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file, keeping the terminal for the console.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("auction-assistant.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_assistant=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

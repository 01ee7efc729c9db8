//! tidybox command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tidybox_config::{self, Config};
use tidybox_gateway::{BulkReport, DriveSource, SystemDrives};
use tidybox_ledger::{HistoryEntry, Ledger};
use tidybox_watcher::{InboxWatcher, NewFileEvent, WatcherHandle, WatcherStatus};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::app::App;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Write default config and create the data directory
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing tidybox...");
    println!("{}", RULE);

    let config = tidybox_config::init()
        .await
        .context("Failed to write default config")?;

    println!("Config:  {}", tidybox_config::config_path().display());
    println!("Inbox:   {}", config.inbox_path().display());

    println!("\n◆ tidybox initialized");
    println!("\nNext steps:");
    println!("  1. Adjust folders in ~/.tidybox/config.json");
    println!("  2. Start sorting: tidybox watch");

    Ok(())
}

pub async fn status_command() -> Result<()> {
    let config_path = tidybox_config::config_path();

    println!("◆ tidybox Status");
    println!("{}", RULE);
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let app = App::load().await?;
    let inbox = app.config.inbox_path();
    println!(
        "Inbox:     {} {}",
        inbox.display(),
        if inbox.is_dir() { "[OK]" } else { "[Missing]" }
    );
    println!(
        "Watching:  {}",
        if app.config.inbox.watch {
            "[Enabled]"
        } else {
            "[Disabled]"
        }
    );
    println!("Conflicts: {:?}", app.config.gateway.on_conflict);
    println!("History:   {} entries", app.ledger.len());
    println!("Recents:   {}", app.ledger.recent_destinations().len());

    let snapshot = app.gateway.allowlist().snapshot();
    println!("\nAllowed folders ({}):", snapshot.len());
    for root in snapshot.roots() {
        println!("  {}", root);
    }

    println!("\n◆ Ready");
    Ok(())
}

pub async fn drives_command() -> Result<()> {
    let drives = SystemDrives.drives();

    if drives.is_empty() {
        println!("No drives found");
        return Ok(());
    }

    println!("◆ Drives");
    println!("{}", RULE);
    for drive in drives {
        println!(
            "{} {} ({}{})",
            drive.mount_point.display(),
            drive.name,
            drive.file_system,
            if drive.is_removable { ", removable" } else { "" }
        );
        println!(
            "  {} {:>5.1}%  {} free of {}",
            storage_bar(drive.usage_percent, 20),
            drive.usage_percent,
            format_size(drive.available_space),
            format_size(drive.total_space)
        );
    }

    Ok(())
}

pub async fn ls_command(path: String) -> Result<()> {
    let app = App::load().await?;
    let entries = app.gateway.list_directory(&path).await?;

    if entries.is_empty() {
        println!("(empty)");
    }
    for entry in entries {
        if entry.is_dir {
            println!("  {:>9}  {}/", "<dir>", entry.name);
        } else {
            println!("  {:>9}  {}", format_size(entry.size), entry.name);
        }
    }

    Ok(())
}

pub async fn mkdir_command(parent: String, name: String) -> Result<()> {
    let app = App::load().await?;
    let created = app.gateway.create_folder(&parent, &name).await?;
    println!("✓ Created {}", created);
    Ok(())
}

pub async fn mv_command(sources: Vec<String>, to: String) -> Result<()> {
    let mut app = App::load().await?;
    let report = app.gateway.move_many(&sources, &to).await;

    let mut destination = None;
    for item in &report.succeeded {
        println!("✓ {} -> {}", item.source, item.result);
        let dest_dir = item
            .result
            .as_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&to));
        record(
            &mut app.ledger,
            HistoryEntry::moved(&item.entry.path, item.entry.size, dest_dir.clone()),
        )
        .await;
        destination = Some(dest_dir);
    }

    if let Some(dest_dir) = destination {
        if let Err(e) = app.ledger.note_destination(dest_dir).await {
            warn!("Failed to update recent destinations: {}", e);
        }
    }

    finish_bulk("Moved", &report)
}

pub async fn rm_command(paths: Vec<String>) -> Result<()> {
    let mut app = App::load().await?;
    let report = app.gateway.delete_many(&paths).await;

    for item in &report.succeeded {
        println!("✓ {} -> trash", item.source);
        record(
            &mut app.ledger,
            HistoryEntry::deleted(&item.entry.path, item.entry.size),
        )
        .await;
    }

    finish_bulk("Trashed", &report)
}

pub async fn history_command(limit: usize, clear: bool) -> Result<()> {
    let config = Config::load().await?;
    let mut ledger = open_ledger(&config).await;

    if clear {
        let count = ledger.len();
        ledger.clear().await.context("Failed to clear history")?;
        println!("✓ Cleared {} history entries", count);
        return Ok(());
    }

    if ledger.is_empty() {
        println!("No history yet");
        return Ok(());
    }

    for entry in ledger.recent(limit) {
        let target = match &entry.destination {
            Some(dest) => format!(" -> {}", dest.display()),
            None => String::new(),
        };
        println!(
            "{}  {:<7}  {} ({}){}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.action,
            entry.name,
            format_size(entry.size),
            target
        );
    }

    Ok(())
}

pub async fn recents_command() -> Result<()> {
    let config = Config::load().await?;
    let ledger = open_ledger(&config).await;

    let recents = ledger.recent_destinations();
    if recents.is_empty() {
        println!("No recent destinations");
    }
    for (i, path) in recents.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }

    Ok(())
}

/// Run the inbox watcher and ask what to do with each new file
pub async fn watch_command() -> Result<()> {
    let mut app = App::load().await?;

    let mut handle = if app.config.inbox.watch {
        InboxWatcher::new(app.config.inbox_path(), &app.config.watcher).start()
    } else {
        WatcherHandle::disabled()
    };

    match handle.status() {
        WatcherStatus::Active { inbox } => {
            println!("◆ Watching {}", inbox.display());
            println!("  Ctrl+C to stop\n");
        }
        WatcherStatus::Disabled => {
            println!("Watching is disabled in config (inbox.watch)");
            return Ok(());
        }
        WatcherStatus::Unavailable { .. } => {
            if let Some(e) = handle.status().as_error() {
                return Err(e.into());
            }
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let event = tokio::select! {
            _ = &mut ctrl_c => break,
            event = handle.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if !handle_new_file(&mut app, &event, &mut lines).await? {
            break;
        }
    }

    handle.shutdown().await;
    info!("◆ WATCH STOPPED");
    Ok(())
}

/// What the user typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Choice {
    Skip,
    Trash,
    MoveTo(String),
    Invalid,
}

pub fn parse_choice(input: &str, recents: &[PathBuf]) -> Choice {
    let input = input.trim();
    if input.is_empty() {
        return Choice::Skip;
    }
    if input.eq_ignore_ascii_case("d") {
        return Choice::Trash;
    }
    if let Ok(n) = input.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| recents.get(i)) {
            Some(path) => Choice::MoveTo(path.to_string_lossy().into_owned()),
            None => Choice::Invalid,
        };
    }
    Choice::MoveTo(input.to_string())
}

/// Prompt for one file. Returns `false` once stdin is closed.
async fn handle_new_file<R>(
    app: &mut App,
    event: &NewFileEvent,
    lines: &mut tokio::io::Lines<R>,
) -> Result<bool>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    println!("◆ New file: {} ({})", event.name, format_size(event.size));
    let recents = app.ledger.recent_destinations().to_vec();
    for (i, path) in recents.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }

    let source = event.path.to_string_lossy().into_owned();
    loop {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(b"  Destination [number | path | d = trash | enter = skip]: ")
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(false);
        };

        match parse_choice(&line, &recents) {
            Choice::Skip => {
                println!("  skipped\n");
                return Ok(true);
            }
            Choice::Invalid => {
                println!("  ✗ No recent destination with that number");
            }
            Choice::Trash => {
                match app.gateway.delete_file(&source).await {
                    Ok(()) => {
                        println!("  ✓ Moved to trash\n");
                        record(
                            &mut app.ledger,
                            HistoryEntry::deleted(&event.path, event.size),
                        )
                        .await;
                    }
                    Err(e) => println!("  ✗ {}\n", e),
                }
                return Ok(true);
            }
            Choice::MoveTo(dest) => match app.gateway.move_file(&source, &dest).await {
                Ok(moved) => {
                    println!("  ✓ {}\n", moved);
                    let dest_dir = moved
                        .as_path()
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(&dest));
                    record(
                        &mut app.ledger,
                        HistoryEntry::moved(&event.path, event.size, dest_dir.clone()),
                    )
                    .await;
                    if let Err(e) = app.ledger.note_destination(dest_dir).await {
                        warn!("Failed to update recent destinations: {}", e);
                    }
                    return Ok(true);
                }
                // Let the user pick another folder
                Err(e) => println!("  ✗ {}", e),
            },
        }
    }
}

async fn open_ledger(config: &Config) -> Ledger {
    Ledger::open(
        tidybox_config::history_path(),
        tidybox_config::recents_path(),
        config.ledger.recents_cap,
    )
    .await
}

/// History is best effort once the file operation itself succeeded
async fn record(ledger: &mut Ledger, entry: HistoryEntry) {
    if let Err(e) = ledger.append(entry).await {
        warn!("Failed to record history: {}", e);
    }
}

fn finish_bulk<T>(verb: &str, report: &BulkReport<T>) -> Result<()> {
    for failure in &report.failed {
        println!("✗ {} [{}]: {}", failure.source, failure.kind, failure.message);
    }

    println!(
        "\n◆ {} {}, failed {}",
        verb,
        report.succeeded_count(),
        report.failed_count()
    );

    if !report.all_succeeded() {
        anyhow::bail!(
            "{} of {} items failed",
            report.failed_count(),
            report.succeeded_count() + report.failed_count()
        );
    }
    Ok(())
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub fn storage_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

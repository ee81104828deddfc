//! Auto-saving edit session.
//!
//! An external editor produces snapshots (a watched file, or stdin lines);
//! each one goes through the [`AutoSaver`] exactly as keystrokes would.

use clap::Args;
use inkdraft_core::{
    AutoSaver, EditorStore, Post, PostId, PostStore, SaveState, SharedStore, Snapshot,
};
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use super::api_client;
use super::post::post_text;
use crate::config::Config;

/// How long Ctrl-C waits for a save that is already on the wire.
const IN_FLIGHT_GRACE: Duration = Duration::from_secs(15);

#[derive(Args)]
pub struct EditCommand {
    /// Post ID
    pub id: PostId,

    /// Watch this file instead of reading stdin (created from the post if missing)
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

impl EditCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = api_client(config);

        let store = EditorStore::new().shared();
        let posts = client.list(None).await?;
        store.lock().set_posts(posts);
        let post = store
            .lock()
            .find(self.id)
            .cloned()
            .ok_or_else(|| format!("Post not found: {}", self.id))?;

        let saver = AutoSaver::new(store.clone(), client, config.quiet_window());
        saver.activate(Some(post.clone()));
        let indicator = tokio::spawn(show_indicator(saver.subscribe(), store.clone()));

        let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot>();
        // Held until the session ends; dropping it stops the watcher.
        let _watcher = match &self.file {
            Some(path) => {
                seed_file(path, &post)?;
                eprintln!(
                    "Editing '{}' via {} (Ctrl-C to stop)",
                    post.display_title(),
                    path.display()
                );
                Some(watch_file(path, tx)?)
            }
            None => {
                eprintln!(
                    "Editing '{}': each line replaces the content (Ctrl-D to finish)",
                    post.display_title()
                );
                tokio::spawn(read_stdin(tx));
                None
            }
        };

        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(snapshot) => saver.edit(snapshot),
                    None => {
                        // Input ended: let the last edit reach the server.
                        saver.settle().await;
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    saver.teardown();
                    eprintln!();
                    if saver.state().is_saving() {
                        eprintln!("Waiting for the save in progress...");
                        if tokio::time::timeout(IN_FLIGHT_GRACE, saver.drain()).await.is_err() {
                            tracing::warn!("save still in flight after {:?}, exiting", IN_FLIGHT_GRACE);
                        }
                    }
                    eprintln!("Stopped.");
                    break;
                }
            }
        }

        indicator.abort();
        report_unsaved(&store);
        Ok(())
    }
}

/// Reads `text` as an editor document when it is one, otherwise wraps it
/// as a single paragraph.
pub fn snapshot_from_input(text: &str) -> Snapshot {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        Snapshot::new(trimmed)
    } else {
        Snapshot::from_plain_text(text.trim_end_matches('\n'))
    }
}

fn seed_file(path: &Path, post: &Post) -> Result<(), std::io::Error> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, post_text(post))
}

/// Watches the directory holding `path` so editors that save by renaming
/// are still seen.
fn watch_file(
    path: &Path,
    tx: mpsc::UnboundedSender<Snapshot>,
) -> Result<notify::RecommendedWatcher, Box<dyn std::error::Error>> {
    let target = std::fs::canonicalize(path)?;
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| format!("Cannot watch {}", target.display()))?;

    let file = target.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("File watch error: {}", e);
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        if !event.paths.iter().any(|p| p == &file) {
            return;
        }
        match std::fs::read_to_string(&file) {
            Ok(contents) => {
                let _ = tx.send(snapshot_from_input(&contents));
            }
            Err(e) => tracing::debug!("Skipping unreadable change: {}", e),
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(file = %target.display(), "watching");
    Ok(watcher)
}

async fn read_stdin(tx: mpsc::UnboundedSender<Snapshot>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(snapshot_from_input(&line)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

/// Prints the save indicator on every transition into or out of `Saving`.
async fn show_indicator(mut status: watch::Receiver<SaveState>, store: SharedStore) {
    let mut saving = false;
    let mut last_saved = store.lock().last_saved_at();

    while status.changed().await.is_ok() {
        let now_saving = status.borrow_and_update().is_saving();
        if now_saving && !saving {
            eprintln!("Saving…");
        } else if !now_saving && saving {
            let saved_at = store.lock().last_saved_at();
            if saved_at != last_saved {
                eprintln!("✓ Saved");
                last_saved = saved_at;
            } else {
                eprintln!("✗ Save failed, will retry on next edit");
            }
        }
        saving = now_saving;
    }
}

fn report_unsaved(store: &SharedStore) {
    let store = store.lock();
    if let Some(saved) = store.last_saved_at() {
        tracing::info!(at = %saved, "last saved");
    }
    let stored = store
        .current_post()
        .and_then(|p| Snapshot::from_persisted(p.content.as_deref()));
    if let Some(current) = store.buffer().savable() {
        if stored.as_ref() != Some(current) {
            eprintln!("Warning: the latest edit was not saved.");
        }
    }
}

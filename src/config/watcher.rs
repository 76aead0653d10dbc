//! Config file watching for hot reload.
//!
//! # Responsibilities
//! - Notice edits to the config file, including rename-over saves
//! - Load and validate the new file, forward it to the server
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: an atomic save
//!   replaces the file's inode and a file watch would go silent
//! - Events for other files in the directory are ignored
//! - An invalid file is logged and skipped; the running config stays

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Sends a freshly loaded `AppConfig` every time the config file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Reloads stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsString::from).ok_or_else(|| {
            notify::Error::generic("config path has no file name").add_path(self.path.clone())
        })?;

        let tx = self.update_tx;
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !touches_config(&event, &file_name) {
                        return;
                    }
                    tracing::info!(path = ?path, kind = ?event.kind, "Config file changed, reloading");
                    match load_config(&path) {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration")
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, directory = ?directory, "Config watcher started");
        Ok(watcher)
    }
}

/// A create or modify (including rename-into-place) naming the config file.
fn touches_config(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|name| name == file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};

    use super::*;

    fn config_with_slug(slug: &str) -> String {
        format!("[upload]\nslug = \"{slug}\"\n")
    }

    /// Replace `path` the way editors do: write a sibling, rename it over.
    fn save_atomically(path: &Path, contents: &str) {
        let staging = path.with_extension("toml.swp");
        fs::write(&staging, contents).unwrap();
        fs::rename(&staging, path).unwrap();
    }

    async fn next_slug(rx: &mut mpsc::UnboundedReceiver<AppConfig>, want: &str) -> bool {
        let wait = async {
            while let Some(config) = rx.recv().await {
                if config.upload.slug == want {
                    return true;
                }
            }
            false
        };
        tokio::time::timeout(Duration::from_secs(10), wait).await.unwrap_or(false)
    }

    #[test]
    fn test_event_filter_matches_only_config_file() {
        let name = OsString::from("gate.toml");
        let event = |kind, path: &str| Event::new(kind).add_path(PathBuf::from(path));

        assert!(touches_config(
            &event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), "/etc/gate/gate.toml"),
            &name
        ));
        assert!(touches_config(&event(EventKind::Create(CreateKind::File), "./gate.toml"), &name));
        assert!(!touches_config(
            &event(EventKind::Modify(ModifyKind::Any), "/etc/gate/gate.toml.swp"),
            &name
        ));
        assert!(!touches_config(&event(EventKind::Remove(RemoveKind::File), "/etc/gate/gate.toml"), &name));
    }

    #[tokio::test]
    async fn test_reloads_survive_rename_over_saves() {
        let dir = std::env::temp_dir().join(format!("gate-watch-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gate.toml");
        fs::write(&path, config_with_slug("first")).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        save_atomically(&path, &config_with_slug("second"));
        assert!(next_slug(&mut rx, "second").await, "first rename-over save not seen");

        // The inode changed; a file watch would have gone silent here.
        save_atomically(&path, &config_with_slug("third"));
        assert!(next_slug(&mut rx, "third").await, "second rename-over save not seen");

        let _ = fs::remove_dir_all(&dir);
    }
}

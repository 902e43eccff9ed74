//! Icon directory watching for dev sessions.
//!
//! Uses the `notify` crate. Bursts of file-system events are coalesced before a
//! rebuild so an editor's write-rename-delete dance triggers one rescan.

use crate::error::{VirtModError, VirtModResult};
use crate::session::BuildSession;
use crate::sprite::RebuildReport;
use log::{debug, error, warn};
use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(75);

/// Rebuilds the session sprite whenever an icon directory changes. Dropping
/// the watcher stops the background thread.
pub struct SpriteWatcher {
    watcher: Option<RecommendedWatcher>,
    handle: Option<JoinHandle<()>>,
}

impl SpriteWatcher {
    pub fn spawn(session: Arc<BuildSession>) -> VirtModResult<Self> {
        Self::spawn_with(session, |_| {})
    }

    /// Like [`SpriteWatcher::spawn`], calling `on_rebuild` after every rebuild.
    pub fn spawn_with<F>(session: Arc<BuildSession>, mut on_rebuild: F) -> VirtModResult<Self>
    where
        F: FnMut(&RebuildReport) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.send(res);
        })?;

        let icons = &session.config().icons;
        let mode = if icons.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        for dir in &icons.dirs {
            if dir.is_dir() {
                watcher.watch(dir, mode)?;
                debug!("Watching icon directory {}", dir.display());
            } else {
                warn!("Not watching missing icon directory {}", dir.display());
            }
        }

        let handle = thread::Builder::new()
            .name("virtmod-sprite-watch".to_string())
            .spawn(move || loop {
                let Ok(first) = rx.recv() else {
                    return;
                };
                let mut relevant = is_relevant(&first);
                let mut disconnected = false;
                loop {
                    match rx.recv_timeout(DEBOUNCE) {
                        Ok(next) => relevant |= is_relevant(&next),
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }
                if relevant {
                    match session.rebuild_sprites() {
                        Ok(report) => on_rebuild(&report),
                        Err(err) => error!("Sprite rebuild failed: {}", err),
                    }
                }
                if disconnected {
                    return;
                }
            })
            .map_err(|err| VirtModError::io("virtmod-sprite-watch", err))?;

        Ok(Self {
            watcher: Some(watcher),
            handle: Some(handle),
        })
    }
}

fn is_relevant(event: &notify::Result<notify::Event>) -> bool {
    match event {
        Ok(event) => !matches!(event.kind, EventKind::Access(_)),
        Err(err) => {
            warn!("Icon watcher error: {}", err);
            false
        }
    }
}

impl Drop for SpriteWatcher {
    fn drop(&mut self) {
        // Dropping the OS watcher drops the event sender, ending the thread
        self.watcher.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//! Deferred persistence of the live session.
//!
//! The first unflushed edit arms a single flush `delay` later. Edits made
//! while it is armed ride along with it; they do not push the deadline back.
//! Edits made during the write itself get another flush one `delay` later.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    live::LiveSession,
    store::{SessionStore, StoreResult},
};

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

pub type SharedSession = Arc<Mutex<LiveSession>>;

/// Writes the model's current tree to the store. A clean model is not
/// written.
///
/// Returns whether the model is clean afterwards: edits that landed while
/// the request was in flight keep it dirty.
pub async fn flush<S: SessionStore>(store: &S, session: &Mutex<LiveSession>) -> StoreResult<bool> {
    let snapshot = {
        let live = session.lock();
        if !live.is_dirty() {
            return Ok(true);
        }
        live.session_id().map(|id| {
            (
                id.to_owned(),
                live.name().to_owned(),
                live.persist_payload(),
                live.revision(),
            )
        })
    };
    let Some((id, name, payload, revision)) = snapshot else {
        return Ok(true);
    };

    store.update_session(&id, &name, None, Some(payload)).await?;

    let mut live = session.lock();
    if live.session_id() != Some(id.as_str()) {
        return Ok(false);
    }
    Ok(live.mark_clean_at(revision))
}

pub struct Autosave<S: SessionStore> {
    store: Arc<S>,
    session: SharedSession,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<S: SessionStore> Autosave<S> {
    pub fn new(store: Arc<S>, session: SharedSession, delay: Duration) -> Self {
        Self {
            store,
            session,
            delay,
            pending: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Schedules a flush if the model has unsaved edits for a loaded
    /// session and none is scheduled yet.
    pub fn arm(&mut self) {
        if self.is_armed() {
            return;
        }
        let session_id = {
            let live = self.session.lock();
            match live.session_id() {
                Some(id) if live.is_dirty() => id.to_owned(),
                _ => return,
            }
        };

        let store = Arc::clone(&self.store);
        let session = Arc::clone(&self.session);
        let delay = self.delay;
        debug!(?delay, "autosave armed");

        self.pending = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                let pending = {
                    let live = session.lock();
                    live.is_dirty() && live.session_id() == Some(session_id.as_str())
                };
                if !pending {
                    return;
                }
                // Failures stay quiet; the next edit arms another attempt.
                match flush(store.as_ref(), &session).await {
                    Ok(true) => {
                        debug!("autosaved");
                        return;
                    }
                    Ok(false) => debug!("autosaved, newer edits still pending"),
                    Err(err) => {
                        debug!(%err, "autosave failed");
                        return;
                    }
                }
            }
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<S: SessionStore> Drop for Autosave<S> {
    fn drop(&mut self) {
        self.disarm();
    }
}

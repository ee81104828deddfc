//! Debounced auto-save of the active post.
//!
//! [`AutoSaver`] watches the change buffer of an [`EditorStore`], waits for a
//! quiet window after the last edit and then writes the buffered snapshot to
//! the [`PostStore`], skipping the write when the snapshot matches what was
//! last confirmed.
//!
//! ```text
//!   edit            edit              countdown elapsed
//! Idle ───▶ Armed ───▶ Armed ─────────────────────────▶ flush
//!                                                        │ buffer == marker ──▶ Idle
//!                                                        └ otherwise ─────────▶ Saving
//! Saving ── edit ──▶ Saving{Armed} ── elapsed ──▶ Saving{Due}
//! Saving{None} ─ done ─▶ Idle   Saving{Armed} ─ done ─▶ Armed   Saving{Due} ─ done ─▶ flush
//! ```
//!
//! Failed saves are logged and invalidate the marker, so the next edit is
//! saved even if its content equals the failed attempt. Nothing retries on
//! a timer.
//!
//! [`EditorStore`]: crate::store::EditorStore

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::models::{Post, PostId, PostPatch, PostUpdate};
use crate::remote::PostStore;
use crate::snapshot::Snapshot;
use crate::store::SharedStore;

/// Quiet window used when none is configured.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(2000);

/// What happens once the outstanding save lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Nothing changed since the save was dispatched.
    None,
    /// An edit arrived and its countdown is still running.
    Armed,
    /// An edit arrived and its countdown already elapsed.
    Due,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Armed,
    Saving { followup: Followup },
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveState::Saving { .. })
    }
}

/// Snapshot last confirmed by the server.
#[derive(Debug, Clone, PartialEq)]
enum Marker {
    Saved(Snapshot),
    /// Differs from every snapshot, so the next flush always saves.
    Invalidated,
}

impl Marker {
    fn matches(&self, snapshot: &Snapshot) -> bool {
        matches!(self, Marker::Saved(saved) if saved == snapshot)
    }
}

struct Machine {
    /// Bumped on every activation; work from older sessions is stale.
    session: u64,
    state: SaveState,
    marker: Marker,
}

/// A save dispatched for `post_id` with `snapshot`.
struct SaveJob {
    session: u64,
    post_id: PostId,
    snapshot: Snapshot,
}

struct Inner<S> {
    remote: S,
    store: SharedStore,
    machine: Mutex<Machine>,
    status: watch::Sender<SaveState>,
}

impl<S: PostStore> Inner<S> {
    fn set_state(&self, machine: &mut Machine, state: SaveState) {
        machine.state = state;
        self.status.send_replace(state);
    }

    async fn countdown_elapsed(&self, session: u64) {
        let mut job = {
            let mut machine = self.machine.lock();
            if machine.session != session {
                return;
            }
            let state = machine.state;
            match state {
                SaveState::Armed => self.begin_save(&mut machine),
                SaveState::Saving {
                    followup: Followup::Armed,
                } => {
                    self.set_state(
                        &mut machine,
                        SaveState::Saving {
                            followup: Followup::Due,
                        },
                    );
                    None
                }
                _ => None,
            }
        };

        while let Some(current) = job {
            let result = self
                .remote
                .update(current.post_id, &PostUpdate::content(current.snapshot.as_str()))
                .await;
            job = self.finish_save(current, result);
        }
    }

    /// Compares the freshest buffer against the marker and, if they differ,
    /// moves to `Saving` and returns the job to send.
    fn begin_save(&self, machine: &mut Machine) -> Option<SaveJob> {
        let mut store = self.store.lock();

        let candidate = store
            .current_post()
            .map(|p| p.id)
            .zip(store.buffer().savable().cloned());
        let Some((post_id, snapshot)) = candidate else {
            self.set_state(machine, SaveState::Idle);
            return None;
        };

        if machine.marker.matches(&snapshot) {
            tracing::debug!(post_id, "auto-save skipped, content unchanged");
            self.set_state(machine, SaveState::Idle);
            return None;
        }

        store.set_saving(true);
        self.set_state(
            machine,
            SaveState::Saving {
                followup: Followup::None,
            },
        );
        tracing::debug!(post_id, bytes = snapshot.as_str().len(), "auto-saving");

        Some(SaveJob {
            session: machine.session,
            post_id,
            snapshot,
        })
    }

    /// Applies the outcome of `job`. Returns the next job when an edit became
    /// due while the save was in flight.
    fn finish_save(
        &self,
        job: SaveJob,
        result: Result<Post, crate::error::ApiError>,
    ) -> Option<SaveJob> {
        let mut machine = self.machine.lock();
        let current = machine.session == job.session;

        {
            let mut store = self.store.lock();
            match &result {
                Ok(saved) => {
                    store.update_post_in_list(job.post_id, &PostPatch::saved_content(saved));
                    store.mark_saved(Utc::now());
                    tracing::debug!(post_id = job.post_id, "auto-save confirmed");
                }
                Err(e) => {
                    tracing::warn!(post_id = job.post_id, "Auto-save failed: {}", e);
                }
            }
            if current {
                store.set_saving(false);
            }
        }

        if !current {
            return None;
        }

        machine.marker = match result {
            Ok(_) => Marker::Saved(job.snapshot),
            Err(_) => Marker::Invalidated,
        };

        let state = machine.state;
        match state {
            SaveState::Saving {
                followup: Followup::Armed,
            } => {
                self.set_state(&mut machine, SaveState::Armed);
                None
            }
            SaveState::Saving {
                followup: Followup::Due,
            } => self.begin_save(&mut machine),
            _ => {
                self.set_state(&mut machine, SaveState::Idle);
                None
            }
        }
    }
}

/// Auto-save coordinator for the active post.
pub struct AutoSaver<S: PostStore> {
    inner: Arc<Inner<S>>,
    debouncer: Debouncer<u64>,
}

impl<S: PostStore> AutoSaver<S> {
    pub fn new(store: SharedStore, remote: S, quiet_window: Duration) -> Self {
        let (status, _) = watch::channel(SaveState::Idle);
        let inner = Arc::new(Inner {
            remote,
            store,
            machine: Mutex::new(Machine {
                session: 0,
                state: SaveState::Idle,
                marker: Marker::Invalidated,
            }),
            status,
        });

        let target = Arc::clone(&inner);
        let debouncer = Debouncer::new(quiet_window, move |session: u64| {
            let inner = Arc::clone(&target);
            async move { inner.countdown_elapsed(session).await }
        });

        Self { inner, debouncer }
    }

    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    pub fn remote(&self) -> &S {
        &self.inner.remote
    }

    pub fn state(&self) -> SaveState {
        self.inner.machine.lock().state
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.inner.status.subscribe()
    }

    /// Makes `post` the active post, or closes the editor with `None`.
    ///
    /// The pending countdown of the previous post is dropped. A save already
    /// in flight for it still completes and reconciles into the list.
    pub fn activate(&self, post: Option<Post>) {
        let mut machine = self.inner.machine.lock();
        machine.session += 1;
        self.debouncer.cancel();

        machine.marker = match post.as_ref().and_then(|p| p.content.clone()) {
            Some(content) => Marker::Saved(Snapshot::from(content)),
            None => Marker::Invalidated,
        };
        {
            let mut store = self.inner.store.lock();
            store.set_current_post(post);
            store.set_saving(false);
        }
        self.inner.set_state(&mut machine, SaveState::Idle);
    }

    /// Records an edit from the editing surface and schedules a save.
    pub fn edit(&self, snapshot: Snapshot) {
        self.inner.store.lock().set_editor_json(snapshot);
        self.buffer_changed();
    }

    /// Arms (or re-arms) the countdown after the change buffer was written.
    ///
    /// Ignored while no post is open or the buffer holds nothing savable.
    pub fn buffer_changed(&self) {
        let mut machine = self.inner.machine.lock();
        if self.debouncer.is_torn_down() {
            return;
        }
        {
            let store = self.inner.store.lock();
            if store.current_post().is_none() || store.buffer().savable().is_none() {
                return;
            }
        }

        let next = match machine.state {
            SaveState::Idle | SaveState::Armed => SaveState::Armed,
            SaveState::Saving { .. } => SaveState::Saving {
                followup: Followup::Armed,
            },
        };
        self.inner.set_state(&mut machine, next);
        self.debouncer.trigger(machine.session);
    }

    /// Waits until nothing is pending or in flight.
    pub async fn settle(&self) {
        let mut status = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = status.wait_for(|state| *state == SaveState::Idle).await;
    }

    /// Waits until no save is in flight. A follow-up that was already due
    /// when this is called is flushed first.
    pub async fn drain(&self) {
        let mut status = self.subscribe();
        let _ = status.wait_for(|state| !state.is_saving()).await;
    }

    /// Cancels the pending countdown and ignores later edits. A save already
    /// in flight is left to finish.
    pub fn teardown(&self) {
        self.debouncer.teardown();
        let mut machine = self.inner.machine.lock();
        let next = match machine.state {
            SaveState::Armed => SaveState::Idle,
            // The follow-up countdown died with the debouncer.
            SaveState::Saving {
                followup: Followup::Armed,
            } => SaveState::Saving {
                followup: Followup::None,
            },
            other => other,
        };
        if next != machine.state {
            self.inner.set_state(&mut machine, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{NewPost, PostStatus};
    use crate::store::EditorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::sleep;

    /// In-memory store that records every update it receives.
    #[derive(Default)]
    struct FakeRemote {
        posts: Mutex<Vec<Post>>,
        updates: Mutex<Vec<(PostId, String)>>,
        fail: AtomicBool,
        latency: Mutex<Duration>,
    }

    impl FakeRemote {
        fn with_posts(posts: Vec<Post>) -> Arc<Self> {
            let remote = Self::default();
            *remote.posts.lock() = posts;
            Arc::new(remote)
        }

        fn updates(&self) -> Vec<(PostId, String)> {
            self.updates.lock().clone()
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn set_latency(&self, latency: Duration) {
            *self.latency.lock() = latency;
        }
    }

    #[async_trait]
    impl PostStore for Arc<FakeRemote> {
        async fn list(&self, _status: Option<PostStatus>) -> Result<Vec<Post>, ApiError> {
            Ok(self.posts.lock().clone())
        }

        async fn get(&self, id: PostId) -> Result<Post, ApiError> {
            self.posts
                .lock()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(ApiError::Server {
                    status: 404,
                    detail: "Post not found".to_string(),
                })
        }

        async fn create(&self, post: &NewPost) -> Result<Post, ApiError> {
            let mut posts = self.posts.lock();
            let id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let created = Post::new(id, post.title.clone().unwrap_or_default());
            posts.push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: PostId, fields: &PostUpdate) -> Result<Post, ApiError> {
            let content = fields.content.clone().unwrap_or_default();
            self.updates.lock().push((id, content.clone()));

            let latency = *self.latency.lock();
            if !latency.is_zero() {
                sleep(latency).await;
            }

            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Connection("simulated network error".to_string()));
            }

            let mut posts = self.posts.lock();
            let post = posts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ApiError::Server {
                    status: 404,
                    detail: "Post not found".to_string(),
                })?;
            post.content = Some(content);
            post.updated_at = Utc::now();
            Ok(post.clone())
        }

        async fn publish(&self, id: PostId) -> Result<Post, ApiError> {
            let mut post = self.get(id).await?;
            post.status = PostStatus::Published;
            Ok(post)
        }

        async fn delete(&self, id: PostId) -> Result<(), ApiError> {
            self.posts.lock().retain(|p| p.id != id);
            Ok(())
        }
    }

    const WINDOW: Duration = DEFAULT_QUIET_WINDOW;
    const THREE_0: &str = r#"{"t":"three-0"}"#;
    const FIVE_0: &str = r#"{"t":"five-0"}"#;

    fn fixture() -> (AutoSaver<Arc<FakeRemote>>, Arc<FakeRemote>) {
        let posts = vec![
            Post::new(3, "Three").with_content(THREE_0),
            Post::new(5, "Five").with_content(FIVE_0),
            Post::new(7, "Seven"),
            Post::new(9, "Legacy").with_content("plain text from an old editor"),
        ];
        let remote = FakeRemote::with_posts(posts.clone());
        let mut store = EditorStore::new();
        store.set_posts(posts);
        let saver = AutoSaver::new(store.shared(), Arc::clone(&remote), WINDOW);
        (saver, remote)
    }

    fn open(saver: &AutoSaver<Arc<FakeRemote>>, id: PostId) {
        let post = saver.store().lock().find(id).cloned();
        saver.activate(post);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_save_once_with_last_content() {
        let (saver, remote) = fixture();
        open(&saver, 7);

        saver.edit(Snapshot::from("a"));
        sleep(Duration::from_millis(500)).await;
        saver.edit(Snapshot::from("ab"));
        sleep(Duration::from_millis(500)).await;
        saver.edit(Snapshot::from("abc"));
        assert_eq!(saver.state(), SaveState::Armed);

        sleep(Duration::from_millis(2100)).await;
        assert_eq!(remote.updates(), vec![(7, "abc".to_string())]);
        assert_eq!(saver.state(), SaveState::Idle);

        sleep(Duration::from_millis(2100)).await;
        assert_eq!(remote.updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_reconciles_and_stamps() {
        let (saver, _remote) = fixture();
        open(&saver, 7);
        assert!(saver.store().lock().last_saved_at().is_none());

        saver.edit(Snapshot::from("hello"));
        sleep(Duration::from_millis(2100)).await;

        let store = saver.store().lock();
        assert!(!store.is_saving());
        assert!(store.last_saved_at().is_some());
        assert_eq!(store.find(7).unwrap().content.as_deref(), Some("hello"));
        assert_eq!(
            store.current_post().unwrap().content.as_deref(),
            Some("hello")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_content_is_not_saved() {
        let (saver, remote) = fixture();
        open(&saver, 3);

        // Same bytes as the persisted baseline.
        saver.edit(Snapshot::from(THREE_0));
        sleep(Duration::from_millis(2100)).await;
        assert!(remote.updates().is_empty());

        saver.edit(Snapshot::from("three-1"));
        sleep(Duration::from_millis(2100)).await;
        saver.edit(Snapshot::from("three-1"));
        sleep(Duration::from_millis(2100)).await;

        assert_eq!(remote.updates(), vec![(3, "three-1".to_string())]);
        assert!(!saver.store().lock().is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_reverted_within_window_is_not_saved() {
        let (saver, remote) = fixture();
        open(&saver, 3);

        saver.edit(Snapshot::from("three-typo"));
        sleep(Duration::from_millis(800)).await;
        saver.edit(Snapshot::from(THREE_0));
        sleep(Duration::from_millis(2100)).await;

        assert!(remote.updates().is_empty());
        assert_eq!(saver.state(), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retries_only_on_next_edit() {
        let (saver, remote) = fixture();
        open(&saver, 7);
        remote.set_failing(true);

        saver.edit(Snapshot::from("draft"));
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(remote.updates().len(), 1);
        assert!(!saver.store().lock().is_saving());
        assert!(saver.store().lock().last_saved_at().is_none());
        assert_eq!(saver.state(), SaveState::Idle);

        // No edit, no retry.
        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(remote.updates().len(), 1);

        remote.set_failing(false);
        saver.edit(Snapshot::from("draft"));
        sleep(Duration::from_millis(2100)).await;

        assert_eq!(
            remote.updates(),
            vec![(7, "draft".to_string()), (7, "draft".to_string())]
        );
        assert!(saver.store().lock().last_saved_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_post_drops_pending_save() {
        let (saver, remote) = fixture();
        open(&saver, 3);
        saver.edit(Snapshot::from("three-edited"));
        sleep(Duration::from_millis(1000)).await;

        open(&saver, 5);
        assert_eq!(saver.state(), SaveState::Idle);
        {
            let store = saver.store().lock();
            assert_eq!(store.buffer().post_id(), Some(5));
            assert_eq!(store.buffer().current(), Some(&Snapshot::from(FIVE_0)));
        }

        sleep(Duration::from_millis(5000)).await;
        assert!(remote.updates().is_empty());

        saver.edit(Snapshot::from("five-1"));
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(remote.updates(), vec![(5, "five-1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_save_reconciles_after_switch() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(1000));
        open(&saver, 3);

        saver.edit(Snapshot::from("three-final"));
        sleep(Duration::from_millis(2100)).await;
        assert!(saver.store().lock().is_saving());

        open(&saver, 5);
        assert!(!saver.store().lock().is_saving());

        sleep(Duration::from_millis(1000)).await;

        let store = saver.store().lock();
        assert_eq!(store.find(3).unwrap().content.as_deref(), Some("three-final"));
        assert_eq!(store.current_post().unwrap().id, 5);
        assert_eq!(store.current_post().unwrap().content.as_deref(), Some(FIVE_0));
        assert!(!store.is_saving());
        drop(store);
        assert_eq!(saver.state(), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_save_is_saved_after_it() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(3000));
        open(&saver, 7);

        saver.edit(Snapshot::from("first"));
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::None
            }
        );

        saver.edit(Snapshot::from("second"));
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::Armed
            }
        );

        // Countdown elapses while the first save is still outstanding.
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::Due
            }
        );
        assert_eq!(remote.updates().len(), 1);

        sleep(Duration::from_millis(4000)).await;
        assert_eq!(
            remote.updates(),
            vec![(7, "first".to_string()), (7, "second".to_string())]
        );
        assert_eq!(saver.state(), SaveState::Idle);
        assert_eq!(
            saver.store().lock().find(7).unwrap().content.as_deref(),
            Some("second")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_active_post_ignores_edits() {
        let (saver, remote) = fixture();

        saver.edit(Snapshot::from("orphan"));
        saver.buffer_changed();
        assert_eq!(saver.state(), SaveState::Idle);

        sleep(Duration::from_millis(5000)).await;
        assert!(remote.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_buffer_ignored() {
        let (saver, remote) = fixture();
        open(&saver, 7);

        saver.edit(Snapshot::from(""));
        assert_eq!(saver.state(), SaveState::Idle);

        sleep(Duration::from_millis(5000)).await;
        assert!(remote.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_countdown() {
        let (saver, remote) = fixture();
        open(&saver, 7);

        saver.edit(Snapshot::from("unsaved"));
        saver.teardown();
        saver.edit(Snapshot::from("after teardown"));
        sleep(Duration::from_millis(5000)).await;

        assert!(remote.updates().is_empty());
        assert_eq!(saver.state(), SaveState::Idle);
        assert_eq!(
            saver.store().lock().buffer().current(),
            Some(&Snapshot::from("after teardown"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_save() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(500));
        open(&saver, 7);

        saver.edit(Snapshot::from("settled"));
        saver.settle().await;

        assert_eq!(remote.updates(), vec![(7, "settled".to_string())]);
        assert!(saver.store().lock().last_saved_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_observes_transitions() {
        let (saver, _remote) = fixture();
        let mut status = saver.subscribe();
        open(&saver, 7);

        saver.edit(Snapshot::from("x"));
        assert_eq!(*status.borrow_and_update(), SaveState::Armed);

        sleep(Duration::from_millis(2100)).await;
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_content_opens_empty_and_saves_first_edit() {
        let (saver, remote) = fixture();
        open(&saver, 9);

        {
            let store = saver.store().lock();
            assert_eq!(store.buffer().post_id(), Some(9));
            assert!(store.buffer().current().is_none());
        }
        assert_eq!(saver.state(), SaveState::Idle);

        sleep(Duration::from_millis(5000)).await;
        assert!(remote.updates().is_empty());

        saver.edit(Snapshot::from_plain_text("plain text from an old editor"));
        sleep(Duration::from_millis(2100)).await;

        let updates = remote.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, 9);
        assert!(updates[0].1.starts_with('{'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_lets_in_flight_save_land() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(1000));
        open(&saver, 7);

        saver.edit(Snapshot::from("in flight"));
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::None
            }
        );

        saver.teardown();
        assert!(saver.state().is_saving());

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(saver.state(), SaveState::Idle);
        assert_eq!(remote.updates(), vec![(7, "in flight".to_string())]);
        let store = saver.store().lock();
        assert!(!store.is_saving());
        assert!(store.last_saved_at().is_some());
        assert_eq!(store.find(7).unwrap().content.as_deref(), Some("in flight"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_drops_followup_armed_during_save() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(3000));
        open(&saver, 7);

        saver.edit(Snapshot::from("first"));
        sleep(Duration::from_millis(2100)).await;
        saver.edit(Snapshot::from("second"));
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::Armed
            }
        );

        saver.teardown();
        assert_eq!(
            saver.state(),
            SaveState::Saving {
                followup: Followup::None
            }
        );

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(saver.state(), SaveState::Idle);
        assert_eq!(remote.updates(), vec![(7, "first".to_string())]);

        let settled = tokio::time::timeout(Duration::from_secs(1), saver.settle()).await;
        assert!(settled.is_ok());

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(remote.updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_in_flight_save() {
        let (saver, remote) = fixture();
        remote.set_latency(Duration::from_millis(1500));
        open(&saver, 7);

        saver.edit(Snapshot::from("draining"));
        sleep(Duration::from_millis(2100)).await;
        saver.teardown();

        saver.drain().await;

        assert_eq!(saver.state(), SaveState::Idle);
        assert_eq!(
            saver.store().lock().find(7).unwrap().content.as_deref(),
            Some("draining")
        );
        assert_eq!(remote.updates().len(), 1);
    }
}

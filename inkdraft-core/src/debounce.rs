//! Trailing-edge debouncing.
//!
//! A [`Debouncer`] owns at most one scheduled countdown. Every
//! [`trigger`](Debouncer::trigger) replaces the recorded arguments and
//! restarts the countdown; when a countdown runs to completion the action is
//! spawned once with the arguments of the last trigger.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Action<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<A> {
    /// Bumped on every trigger; a countdown only fires if it is still current.
    generation: u64,
    args: Option<A>,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

impl<A> Pending<A> {
    fn clear(&mut self) {
        self.args = None;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

pub struct Debouncer<A: Send + 'static> {
    quiet_window: Duration,
    action: Action<A>,
    pending: Arc<Mutex<Pending<A>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F, Fut>(quiet_window: Duration, action: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            quiet_window,
            action: Arc::new(move |args| action(args).boxed()),
            pending: Arc::new(Mutex::new(Pending {
                generation: 0,
                args: None,
                timer: None,
                closed: false,
            })),
        }
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Records `args` and (re)starts the countdown.
    ///
    /// Must be called from within a tokio runtime. No-op after teardown.
    pub fn trigger(&self, args: A) {
        let mut pending = self.pending.lock();
        if pending.closed {
            tracing::trace!("debounce trigger ignored after teardown");
            return;
        }

        pending.clear();
        pending.generation += 1;
        pending.args = Some(args);

        let generation = pending.generation;
        let shared = Arc::clone(&self.pending);
        let action = Arc::clone(&self.action);
        let quiet_window = self.quiet_window;

        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_window).await;

            let args = {
                let mut pending = shared.lock();
                if pending.closed || pending.generation != generation {
                    return;
                }
                pending.timer = None;
                pending.args.take()
            };

            // Detached so that teardown never interrupts a running action.
            if let Some(args) = args {
                tokio::spawn(action(args));
            }
        }));
    }

    /// Drops the pending countdown, if any. The debouncer stays usable.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock();
        pending.generation += 1;
        pending.clear();
    }

    /// Cancels the pending countdown and refuses all further triggers.
    pub fn teardown(&self) {
        let mut pending = self.pending.lock();
        pending.closed = true;
        pending.generation += 1;
        pending.clear();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().args.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.pending.lock().closed
    }
}

impl<A: Send + 'static> Drop for Debouncer<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

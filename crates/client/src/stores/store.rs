//! The state-owner task.
//!
//! `AppState` is only ever mutated here, one action at a time, in the order
//! actions were dispatched. Each action first runs through the middleware
//! chain (which may consume it), then through the reducers. The new state is
//! published on a `watch` channel and the reduced action on a `broadcast`
//! log.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use super::{reduce, Action, AppState};

const ACTION_LOG_CAPACITY: usize = 256;

/// What a middleware decided to do with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Pass the action on to the next middleware and then the reducers.
    Next,
    /// Stop here; reducers never see the action.
    Consumed,
}

/// Hook that sees every action before the reducers do.
pub trait Middleware: Send + 'static {
    fn handle(&mut self, action: &Action) -> Flow;
}

/// Cloneable sender for actions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Action>,
}

impl Dispatcher {
    /// A dispatcher paired with the raw receiving end, for driving
    /// components without a running store.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, action: impl Into<Action>) {
        if self.tx.send(action.into()).is_err() {
            crate::log_debug!("Store has shut down, dropping action");
        }
    }
}

/// The store before it is spawned.
pub struct Store {
    rx: mpsc::UnboundedReceiver<Action>,
    middleware: Vec<Box<dyn Middleware>>,
    state_tx: watch::Sender<AppState>,
    action_tx: broadcast::Sender<Action>,
}

impl Store {
    /// Create a store holding `initial`.
    ///
    /// The handle is usable right away; actions dispatched before
    /// [`Store::spawn`] are queued and applied once the task starts.
    pub fn new(initial: AppState) -> (Self, StoreHandle) {
        let (dispatcher, rx) = Dispatcher::channel();
        let (state_tx, state_rx) = watch::channel(initial);
        let (action_tx, _) = broadcast::channel(ACTION_LOG_CAPACITY);

        let handle = StoreHandle {
            dispatcher,
            state: state_rx,
            actions: action_tx.clone(),
        };

        let store = Self {
            rx,
            middleware: Vec::new(),
            state_tx,
            action_tx,
        };

        (store, handle)
    }

    /// Append a middleware to the chain.
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Start the state-owner task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(action) = self.rx.recv().await {
            self.apply(action);
        }
        crate::log_debug!("Store task stopped");
    }

    fn apply(&mut self, action: Action) {
        for middleware in self.middleware.iter_mut() {
            if middleware.handle(&action) == Flow::Consumed {
                return;
            }
        }

        self.state_tx.send_modify(|state| reduce(state, &action));
        // No subscribers is fine.
        let _ = self.action_tx.send(action);
    }
}

/// Handle for dispatching actions and reading state.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    dispatcher: Dispatcher,
    state: watch::Receiver<AppState>,
    actions: broadcast::Sender<Action>,
}

impl StoreHandle {
    pub fn dispatch(&self, action: impl Into<Action>) {
        self.dispatcher.dispatch(action);
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        (*self.state.borrow()).clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn select<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// Receiver for every action that reached the reducers, in order.
    pub fn actions(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }

    /// Wait until `predicate` holds and return the state that satisfied it.
    ///
    /// Returns `None` if the store task has stopped.
    pub async fn wait_for(&self, predicate: impl FnMut(&AppState) -> bool) -> Option<AppState> {
        let mut rx = self.subscribe();
        let state = rx.wait_for(predicate).await.ok()?;
        Some((*state).clone())
    }
}

pub mod types;

use std::sync::Arc;

use tokio::sync::watch;

pub use types::{MonitorStatus, MonitorView, Phase};

/// Single-writer publication point for [`MonitorView`].
///
/// The scheduler is the only writer; any number of collaborators subscribe
/// and always observe the latest value.
#[derive(Clone)]
pub struct MonitorViewStore {
    tx: Arc<watch::Sender<MonitorView>>,
}

impl MonitorViewStore {
    pub fn new(initial: MonitorView) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorView> {
        self.tx.subscribe()
    }

    /// Latest published view.
    pub fn current(&self) -> MonitorView {
        self.tx.borrow().clone()
    }

    /// Applies `f` in place and notifies subscribers when the view changed.
    pub fn update(&self, f: impl FnOnce(&mut MonitorView)) {
        self.tx.send_if_modified(|view| {
            let before = view.clone();
            f(view);
            *view != before
        });
    }
}

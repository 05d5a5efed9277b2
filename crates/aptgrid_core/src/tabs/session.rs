//! Active tab tracking with lazy projection materialization.
//!
//! # Responsibility
//! - Remember which projection is on screen and persist the choice for a
//!   reload within the same session.
//! - Materialize each projection on its first activation only.
//!
//! # Invariants
//! - `materialize` runs at most once per tab per `TabSession`.
//! - Materialized flags are never persisted.
//! - Storage failures degrade persistence, never tab switching.

use crate::model::tab::{Tab, TAB_COUNT};
use crate::repo::session_repo::SessionStorage;
use log::{debug, warn};

/// Session storage key holding the active tab label.
pub const SELECTED_TAB_KEY: &str = "selectedTab";

/// Builds a projection the first time its tab is shown.
pub trait TabMaterializer {
    fn materialize(&mut self, tab: Tab);
}

/// Result of one [`TabSession::activate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabActivation {
    pub tab: Tab,
    /// `true` when this call triggered materialization.
    pub first_activation: bool,
}

pub struct TabSession<S: SessionStorage> {
    storage: S,
    active: Tab,
    materialized: [bool; TAB_COUNT],
}

impl<S: SessionStorage> TabSession<S> {
    /// Fresh tab state: default tab active, nothing materialized.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            active: Tab::default(),
            materialized: [false; TAB_COUNT],
        }
    }

    /// Reads the persisted tab, falling back to [`Tab::Grid`].
    ///
    /// Sets the active tab but does not materialize it; callers follow up
    /// with [`TabSession::activate`].
    pub fn restore(&mut self) -> Tab {
        let restored = match self.storage.get(SELECTED_TAB_KEY) {
            Ok(Some(label)) => Tab::from_label(&label).unwrap_or_else(|| {
                warn!("event=tab_restore module=tabs status=fallback reason=unknown_label");
                Tab::default()
            }),
            Ok(None) => Tab::default(),
            Err(err) => {
                warn!("event=tab_restore module=tabs status=fallback error={err}");
                Tab::default()
            }
        };
        self.active = restored;
        debug!("event=tab_restore module=tabs status=ok tab={restored}");
        restored
    }

    /// Switches to `tab`, persisting it and materializing on first use.
    pub fn activate<M>(&mut self, tab: Tab, materializer: &mut M) -> TabActivation
    where
        M: TabMaterializer + ?Sized,
    {
        self.active = tab;
        if let Err(err) = self.storage.set(SELECTED_TAB_KEY, tab.label()) {
            warn!("event=tab_persist module=tabs status=error tab={tab} error={err}");
        }

        let first_activation = !self.materialized[tab.index()];
        if first_activation {
            materializer.materialize(tab);
            self.materialized[tab.index()] = true;
        }
        debug!("event=tab_activate module=tabs status=ok tab={tab} first={first_activation}");

        TabActivation {
            tab,
            first_activation,
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn is_materialized(&self, tab: Tab) -> bool {
        self.materialized[tab.index()]
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Shared with other session-scoped records (the last emitted action).
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Drops persisted state at session end.
    pub fn end(&mut self) {
        if let Err(err) = self.storage.clear() {
            warn!("event=tab_session_end module=tabs status=error error={err}");
        }
        self.active = Tab::default();
        self.materialized = [false; TAB_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::{TabMaterializer, TabSession, SELECTED_TAB_KEY};
    use crate::model::tab::Tab;
    use crate::repo::session_repo::{
        MemorySessionStorage, SessionStorage, StorageError, StorageResult,
    };

    #[derive(Default)]
    struct Counter {
        calls: Vec<Tab>,
    }

    impl TabMaterializer for Counter {
        fn materialize(&mut self, tab: Tab) {
            self.calls.push(tab);
        }
    }

    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::InvalidSessionId)
        }

        fn set(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::InvalidSessionId)
        }

        fn clear(&mut self) -> StorageResult<()> {
            Err(StorageError::InvalidSessionId)
        }
    }

    #[test]
    fn first_activation_materializes_once() {
        let mut tabs = TabSession::new(MemorySessionStorage::new());
        let mut counter = Counter::default();

        assert!(tabs.activate(Tab::Cards, &mut counter).first_activation);
        assert!(!tabs.activate(Tab::Cards, &mut counter).first_activation);
        tabs.activate(Tab::List, &mut counter);
        tabs.activate(Tab::Cards, &mut counter);

        assert_eq!(counter.calls, vec![Tab::Cards, Tab::List]);
        assert_eq!(tabs.active(), Tab::Cards);
    }

    #[test]
    fn restore_defaults_to_grid_and_ignores_unknown_labels() {
        let mut storage = MemorySessionStorage::new();
        assert_eq!(TabSession::new(storage.clone()).restore(), Tab::Grid);

        storage
            .set(SELECTED_TAB_KEY, "kanban")
            .expect("memory storage should accept writes");
        assert_eq!(TabSession::new(storage).restore(), Tab::Grid);
    }

    #[test]
    fn storage_failure_does_not_block_switching() {
        let mut tabs = TabSession::new(BrokenStorage);
        let mut counter = Counter::default();

        assert_eq!(tabs.restore(), Tab::Grid);
        let activation = tabs.activate(Tab::Heatmap, &mut counter);
        assert!(activation.first_activation);
        assert_eq!(tabs.active(), Tab::Heatmap);
    }

    #[test]
    fn end_clears_persisted_tab_and_flags() {
        let mut tabs = TabSession::new(MemorySessionStorage::new());
        let mut counter = Counter::default();
        tabs.activate(Tab::List, &mut counter);

        tabs.end();
        assert!(!tabs.is_materialized(Tab::List));
        let persisted = tabs
            .storage()
            .get(SELECTED_TAB_KEY)
            .expect("memory storage should read");
        assert_eq!(persisted, None);
    }
}

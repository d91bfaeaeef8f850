//! Display name resolution.
//!
//! The display name lives in an external key-value store. [`IdentityProvider`]
//! normalizes what goes in and out of it and broadcasts changes to anyone who
//! subscribed. [`NameEntry`] is the state behind the name entry screen.

use tokio::sync::watch;
use tracing::debug;

use crate::route::Route;

/// External storage for the display name.
pub trait IdentityStore {
    /// Stored name, if any.
    fn get(&self) -> Option<String>;

    /// Replace the stored name. `None` clears it.
    fn set(&mut self, value: Option<String>);
}

/// Identity store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    value: Option<String>,
}

impl MemoryIdentityStore {
    /// Store pre-populated with a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { value: Some(name.into()) }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self) -> Option<String> {
        self.value.clone()
    }

    fn set(&mut self, value: Option<String>) {
        self.value = value;
    }
}

/// Trim a candidate name; blank names count as no name.
fn normalize(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|name| !name.is_empty()).map(str::to_string)
}

/// Resolves and updates the local user's display name.
#[derive(Debug)]
pub struct IdentityProvider<S> {
    store: S,
    changes: watch::Sender<Option<String>>,
}

impl<S: IdentityStore> IdentityProvider<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        let current = normalize(store.get().as_deref());
        let (changes, _) = watch::channel(current);
        Self { store, changes }
    }

    /// Current display name, `None` if unset or blank.
    pub fn display_name(&self) -> Option<String> {
        normalize(self.store.get().as_deref())
    }

    /// Store a new name. Blank input clears the stored name.
    ///
    /// Returns the name actually stored.
    pub fn set_name(&mut self, input: &str) -> Option<String> {
        let name = normalize(Some(input));
        debug!(name = ?name, "display name updated");
        self.store.set(name.clone());
        self.changes.send_replace(name.clone());
        name
    }

    /// Forget the stored name.
    pub fn clear(&mut self) {
        debug!("display name cleared");
        self.store.set(None);
        self.changes.send_replace(None);
    }

    /// Watch for name changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Name entry screen state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameEntry {
    draft: String,
}

impl NameEntry {
    /// Start editing, pre-filled with the current name.
    pub fn new<S: IdentityStore>(identity: &IdentityProvider<S>) -> Self {
        Self { draft: identity.display_name().unwrap_or_default() }
    }

    /// Current draft text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft text.
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Whether the save control should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Save the draft. Blank drafts are ignored.
    ///
    /// Returns the route to navigate to after a successful save.
    pub fn submit<S: IdentityStore>(&self, identity: &mut IdentityProvider<S>) -> Option<Route> {
        if !self.can_submit() {
            return None;
        }
        identity.set_name(&self.draft)?;
        Some(Route::Root)
    }
}

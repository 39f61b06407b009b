//! Store composition utilities
//!
//! A large feature is usually built from smaller ones. Scoping lets a parent
//! store hand a child view a store that only knows about its own slice:
//!
//! - **State** flows down: the child's state is a projection of the parent's.
//! - **Actions** flow up: the child's actions are wrapped into parent actions.
//!
//! The child keeps a derived copy of its slice, refreshed on every parent
//! emission, so it always equals the getter applied to the parent's latest
//! state.
//!
//! # Examples
//!
//! ```
//! use viewstore_core::{Relay, StateStream, Store, StoreExt};
//!
//! #[derive(Clone, Debug, PartialEq, Default)]
//! struct AppState {
//!     counter: i32,
//!     title: String,
//! }
//!
//! enum AppAction {
//!     Counter(CounterAction),
//! }
//!
//! enum CounterAction {
//!     Increment,
//! }
//!
//! #[derive(Clone)]
//! struct AppStore {
//!     state: Relay<AppState>,
//! }
//!
//! impl Store for AppStore {
//!     type State = AppState;
//!     type Action = AppAction;
//!
//!     fn state(&self) -> AppState {
//!         self.state.current()
//!     }
//!
//!     fn state_changes(&self) -> StateStream<AppState> {
//!         self.state.stream()
//!     }
//!
//!     fn send(&self, action: AppAction) {
//!         let mut next = self.state();
//!         match action {
//!             AppAction::Counter(CounterAction::Increment) => next.counter += 1,
//!         }
//!         self.state.send(next);
//!     }
//! }
//!
//! let app = AppStore { state: Relay::new(AppState::default()) };
//! let counter = app.scope(|state: &AppState| state.counter, AppAction::Counter);
//!
//! counter.send(CounterAction::Increment);
//!
//! assert_eq!(counter.state(), 1);
//! assert_eq!(app.state().counter, 1);
//! ```

use crate::store::Store;
use crate::stream::StateStream;
use std::sync::Arc;

/// A store bound to a slice of a parent store.
///
/// Created by [`StoreExt::scope`](crate::StoreExt::scope). Its state is
/// always the projection of the parent's latest state, and every action sent
/// to it is forwarded (wrapped) to the parent.
///
/// `ScopedStore` is itself a [`Store`], so scopes can be chained.
pub struct ScopedStore<S, A> {
    slices: StateStream<S>,
    forward: Arc<dyn Fn(A) + Send + Sync>,
}

impl<S, A> Clone for ScopedStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            slices: self.slices.clone(),
            forward: Arc::clone(&self.forward),
        }
    }
}

impl<S, A> std::fmt::Debug for ScopedStore<S, A>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore").field("slices", &self.slices).finish()
    }
}

impl<S, A> ScopedStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a scoped store from a stream of state slices and an action
    /// forwarder.
    ///
    /// Usually called through [`StoreExt::scope`](crate::StoreExt::scope).
    pub fn new<F>(slices: StateStream<S>, forward: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            slices,
            forward: Arc::new(forward),
        }
    }
}

impl<S, A> Store for ScopedStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;

    fn state(&self) -> S {
        self.slices.current()
    }

    fn state_changes(&self) -> StateStream<S> {
        self.slices.clone()
    }

    fn send(&self, action: A) {
        (self.forward)(action);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use crate::store::StoreExt;
    use crate::stream::Relay;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Default)]
    struct Settings {
        volume: u8,
        muted: bool,
    }

    #[derive(Clone, Debug, PartialEq, Default)]
    struct ParentState {
        settings: Settings,
        other: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SettingsAction {
        SetVolume(u8),
        ToggleMute,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum ParentAction {
        Settings(SettingsAction),
        Rename(String),
    }

    #[derive(Clone)]
    struct ParentStore {
        state: Relay<ParentState>,
        received: Arc<Mutex<Vec<ParentAction>>>,
    }

    impl ParentStore {
        fn new() -> Self {
            Self {
                state: Relay::new(ParentState::default()),
                received: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Store for ParentStore {
        type State = ParentState;
        type Action = ParentAction;

        fn state(&self) -> ParentState {
            self.state.current()
        }

        fn state_changes(&self) -> StateStream<ParentState> {
            self.state.stream()
        }

        fn send(&self, action: ParentAction) {
            self.received.lock().unwrap().push(action.clone());
            let mut next = self.state();
            match action {
                ParentAction::Settings(SettingsAction::SetVolume(volume)) => next.settings.volume = volume,
                ParentAction::Settings(SettingsAction::ToggleMute) => next.settings.muted = !next.settings.muted,
                ParentAction::Rename(name) => next.other = name,
            }
            self.state.send(next);
        }
    }

    #[test]
    fn test_scoped_state_tracks_parent() {
        let parent = ParentStore::new();
        let settings = parent.scope(|s: &ParentState| s.settings.clone(), ParentAction::Settings);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = settings
            .state_changes()
            .subscribe(move |s: &Settings| sink.lock().unwrap().push(s.volume));

        parent.send(ParentAction::Settings(SettingsAction::SetVolume(3)));
        parent.send(ParentAction::Rename("x".to_string()));

        assert_eq!(settings.state(), parent.state().settings);
        // A parent change outside the slice still re-emits the (equal) slice.
        assert_eq!(*seen.lock().unwrap(), vec![0, 3, 3]);
    }

    #[test]
    fn test_scoped_actions_are_wrapped_and_forwarded() {
        let parent = ParentStore::new();
        let settings = parent.scope(|s: &ParentState| s.settings.clone(), ParentAction::Settings);

        settings.send(SettingsAction::ToggleMute);

        assert_eq!(
            *parent.received.lock().unwrap(),
            vec![ParentAction::Settings(SettingsAction::ToggleMute)]
        );
        assert!(settings.state().muted);
        assert_eq!(parent.state().other, "");
    }

    #[test]
    fn test_scopes_chain() {
        let parent = ParentStore::new();
        let settings = parent.scope(|s: &ParentState| s.settings.clone(), ParentAction::Settings);
        let volume = settings.scope(|s: &Settings| s.volume, SettingsAction::SetVolume);

        volume.send(9);

        assert_eq!(volume.state(), 9);
        assert_eq!(parent.state().settings.volume, 9);
    }

    #[test]
    fn test_dropping_scope_releases_parent_subscription() {
        let parent = ParentStore::new();
        let settings = parent.scope(|s: &ParentState| s.settings.clone(), ParentAction::Settings);
        assert_eq!(parent.state_changes().subscriber_count(), 1);

        drop(settings);

        assert_eq!(parent.state_changes().subscriber_count(), 0);
    }
}

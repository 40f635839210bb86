//! Store - State ownership and generated dispatchers.
//!
//! The store owns the application state. State values are immutable: every
//! dispatch computes a new value from the current one and a partial update,
//! and stores it in a signal. Nothing else can write.
//!
//! Actions are registered up front on an [`ActionTree`]. Mounting binds the
//! tree into [`Dispatchers`], one per action name, which are created once and
//! shared for the lifetime of the app.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Clone, PartialEq)]
//! struct Counter { count: i64 }
//!
//! impl Merge for Counter {
//!     type Partial = i64;
//!     fn merge(&self, count: i64) -> Self { Self { count } }
//! }
//!
//! let actions = ActionTree::new()
//!     .action("increment", |s: &Counter, ()| s.count + 1)
//!     .action("add", |s: &Counter, n: i64| s.count + n);
//!
//! // Inside the view:
//! let increment = dispatchers.get::<()>("increment").unwrap();
//! Element::new("button").attr("onClick", increment.callback());
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{effect, signal, Signal};
use tracing::debug;

use crate::types::{AttrValue, Cleanup, Event};

// =============================================================================
// Merge
// =============================================================================

/// State that can absorb a partial update.
///
/// `merge` builds a new value; the receiver is left untouched.
pub trait Merge: Sized {
    /// The partial update an action returns.
    type Partial;

    fn merge(&self, partial: Self::Partial) -> Self;
}

// =============================================================================
// Store
// =============================================================================

/// Owner of the current state value.
pub struct Store<S: Merge + PartialEq + 'static> {
    state: Signal<Rc<S>>,
}

impl<S: Merge + PartialEq + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: signal(Rc::new(initial)),
        }
    }

    /// Current state value.
    pub fn state(&self) -> Rc<S> {
        self.state.get()
    }

    /// Run `transition` against the current state and store the merged result.
    pub(crate) fn apply<P>(&self, transition: &dyn Fn(&S, P) -> S::Partial, payload: P) -> Rc<S> {
        let current = self.state.get();
        let partial = transition(&current, payload);
        let next = Rc::new(current.merge(partial));
        self.state.set(next.clone());
        next
    }

    /// Observe state changes.
    ///
    /// `f` runs once for the current state, then again whenever a dispatch
    /// stores a different value.
    pub fn watch(&self, f: impl Fn(&S) + 'static) -> Cleanup {
        let state = self.state.clone();
        let stop = effect(move || {
            let current = state.get();
            f(&current);
        });
        Box::new(stop)
    }
}

impl<S: Merge + PartialEq + fmt::Debug + 'static> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("state", &self.state()).finish()
    }
}

// =============================================================================
// Runtime Seam
// =============================================================================

/// What a dispatcher needs from the mounted app.
pub(crate) trait Runtime<S: Merge + PartialEq + 'static> {
    fn store(&self) -> &Store<S>;

    /// Called after a dispatch stored a new state value.
    fn state_changed(&self, action: &str);
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Callable wrapper around one registered action.
///
/// Clones share the same underlying function; see [`Dispatcher::ptr_eq`].
pub struct Dispatcher<P> {
    name: Rc<str>,
    run: Rc<dyn Fn(P)>,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: self.run.clone(),
        }
    }
}

impl<P> fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("name", &self.name).finish()
    }
}

impl<P: 'static> Dispatcher<P> {
    /// Action name this dispatcher was generated for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the action with `payload`, store the new state and request a render.
    pub fn dispatch(&self, payload: P) {
        (self.run)(payload);
    }

    /// Check if two dispatchers are the same generated function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.run, &other.run)
    }

    /// Callback attribute that maps each event to a payload and dispatches it.
    pub fn callback_with(&self, to_payload: impl Fn(&Event) -> P + 'static) -> AttrValue {
        let run = self.run.clone();
        AttrValue::callback(move |event| run(to_payload(event)))
    }
}

impl Dispatcher<()> {
    /// Callback attribute that dispatches on every event.
    pub fn callback(&self) -> AttrValue {
        let run = self.run.clone();
        AttrValue::callback(move |_| run(()))
    }
}

// =============================================================================
// Action Tree
// =============================================================================

type Binder<S> = Box<dyn Fn(Weak<dyn Runtime<S>>) -> Box<dyn Any>>;

/// Registration builder pairing action names with transitions.
pub struct ActionTree<S: Merge + PartialEq + 'static> {
    entries: Vec<(String, Binder<S>)>,
}

impl<S: Merge + PartialEq + 'static> Default for ActionTree<S> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<S: Merge + PartialEq + 'static> fmt::Debug for ActionTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<S: Merge + PartialEq + 'static> ActionTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `transition` under `name`, replacing an earlier registration.
    ///
    /// The payload type `P` is the action's argument list: `()` for none, a
    /// tuple for several.
    pub fn action<P: 'static>(
        mut self,
        name: impl Into<String>,
        transition: impl Fn(&S, P) -> S::Partial + 'static,
    ) -> Self {
        let name = name.into();
        let transition: Rc<dyn Fn(&S, P) -> S::Partial> = Rc::new(transition);
        let action_name: Rc<str> = Rc::from(name.as_str());

        let binder: Binder<S> = Box::new(move |runtime: Weak<dyn Runtime<S>>| -> Box<dyn Any> {
            let transition = transition.clone();
            let action = action_name.clone();
            let run: Rc<dyn Fn(P)> = Rc::new(move |payload: P| {
                let Some(runtime) = runtime.upgrade() else {
                    debug!(%action, "dispatch after unmount ignored");
                    return;
                };
                runtime.store().apply(&*transition, payload);
                runtime.state_changed(&action);
            });
            Box::new(Dispatcher {
                name: action_name.clone(),
                run,
            })
        });

        self.entries.retain(|(existing, _)| *existing != name);
        self.entries.push((name, binder));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate one dispatcher per action, all reporting to `runtime`.
    pub(crate) fn bind(self, runtime: Weak<dyn Runtime<S>>) -> Dispatchers {
        let map = self
            .entries
            .into_iter()
            .map(|(name, binder)| (name, binder(runtime.clone())))
            .collect();
        Dispatchers { map }
    }
}

// =============================================================================
// Dispatchers
// =============================================================================

/// Generated dispatchers, keyed by action name.
pub struct Dispatchers {
    map: BTreeMap<String, Box<dyn Any>>,
}

impl Dispatchers {
    /// Dispatcher for `name` taking payload `P`.
    ///
    /// `None` when no action has that name or its payload type is not `P`.
    pub fn get<P: 'static>(&self, name: &str) -> Option<Dispatcher<P>> {
        self.map.get(name)?.downcast_ref::<Dispatcher<P>>().cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Dispatchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

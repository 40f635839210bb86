//! Mount API - Application lifecycle and render passes.
//!
//! This module wires the store, the scheduler and the reconciler together
//! behind one [`App`].
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{mount, AppConfig, Element, MemoryHost, TaskQueue};
//!
//! let host = Rc::new(MemoryHost::new());
//! let queue = Rc::new(TaskQueue::new());
//! let root = host.create_root();
//!
//! let app = mount(
//!     AppConfig::new(host.clone(), root, Counter { count: 0 }, queue.clone(), |state, actions| {
//!         let increment = actions.get::<()>("increment").unwrap();
//!         Element::new("button")
//!             .attr("onClick", increment.callback())
//!             .child(state.count)
//!             .into()
//!     })
//!     .actions(ActionTree::new().action("increment", |s: &Counter, ()| s.count + 1)),
//! )?;
//!
//! // Events dispatch synchronously; the host tree catches up on the next turn.
//! host.fire(host.child_at(&root, 0).unwrap(), "click");
//! queue.run_pending();
//!
//! app.unmount()?;
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::scheduler::{Defer, Scheduler, SchedulerState};
use crate::config::HostConfig;
use crate::error::RenderError;
use crate::host::Host;
use crate::renderer::{Adapter, Reconciler};
use crate::state::{ActionTree, Dispatcher, Dispatchers, Merge, Runtime, Store};
use crate::types::{Cleanup, VNode};

/// View function: projects state into a virtual tree.
pub type View<S> = Rc<dyn Fn(&S, &Dispatchers) -> VNode>;

// =============================================================================
// Configuration
// =============================================================================

/// Everything needed to mount an app.
pub struct AppConfig<S: Merge + PartialEq + 'static, H: Host> {
    /// Host platform the tree is rendered into.
    pub host: Rc<H>,
    /// Host node the rendered root is attached to (as child 0).
    pub mount_point: H::Node,
    /// Initial state.
    pub state: S,
    /// Task-queue capability used to defer render passes.
    pub defer: Rc<dyn Defer>,
    pub view: View<S>,
    pub actions: ActionTree<S>,
    pub host_config: HostConfig,
}

impl<S: Merge + PartialEq + 'static, H: Host> AppConfig<S, H> {
    pub fn new(
        host: Rc<H>,
        mount_point: H::Node,
        state: S,
        defer: Rc<dyn Defer>,
        view: impl Fn(&S, &Dispatchers) -> VNode + 'static,
    ) -> Self {
        Self {
            host,
            mount_point,
            state,
            defer,
            view: Rc::new(view),
            actions: ActionTree::new(),
            host_config: HostConfig::default(),
        }
    }

    pub fn actions(mut self, actions: ActionTree<S>) -> Self {
        self.actions = actions;
        self
    }

    pub fn host_config(mut self, host_config: HostConfig) -> Self {
        self.host_config = host_config;
        self
    }
}

// =============================================================================
// Runtime
// =============================================================================

struct Inner<S: Merge + PartialEq + 'static, H: Host> {
    host: Rc<H>,
    mount_point: H::Node,
    host_config: HostConfig,
    view: View<S>,
    store: Store<S>,
    dispatchers: Dispatchers,
    scheduler: Scheduler,
    reconciler: RefCell<Reconciler>,
    /// Most recent projection not yet reconciled.
    latest: RefCell<Option<VNode>>,
    render_count: Cell<usize>,
    last_error: RefCell<Option<RenderError>>,
    this: Weak<Self>,
}

impl<S: Merge + PartialEq + 'static, H: Host + 'static> Inner<S, H> {
    fn project(&self) -> VNode {
        let state = self.store.state();
        (self.view)(&state, &self.dispatchers)
    }

    fn schedule(&self) {
        let this = self.this.clone();
        let armed = self.scheduler.request(move || {
            if let Some(inner) = this.upgrade() {
                inner.render_pass();
            }
        });
        if armed {
            debug!("render pass armed");
        }
    }

    /// One deferred reconciliation against the latest projection.
    fn render_pass(&self) {
        let next = self.latest.borrow_mut().take();
        if let Some(next) = next {
            let adapter = Adapter::new(&*self.host, &self.host_config);
            let result = self
                .reconciler
                .borrow_mut()
                .render(&adapter, &self.mount_point, next);
            let count = self.render_count.get() + 1;
            self.render_count.set(count);

            match result {
                Ok(patched) => debug!(pass = count, ?patched, "render pass complete"),
                Err(err) => *self.last_error.borrow_mut() = Some(err),
            }
        }

        self.scheduler.complete();

        // A dispatch that landed mid-pass found the scheduler armed; its tree
        // still needs a pass of its own.
        if self.latest.borrow().is_some() {
            self.schedule();
        }
    }
}

impl<S: Merge + PartialEq + 'static, H: Host + 'static> Runtime<S> for Inner<S, H> {
    fn store(&self) -> &Store<S> {
        &self.store
    }

    fn state_changed(&self, action: &str) {
        debug!(action, "dispatch");
        let tree = self.project();
        *self.latest.borrow_mut() = Some(tree);
        self.schedule();
    }
}

// =============================================================================
// App
// =============================================================================

/// A mounted application.
///
/// Dropping the app stops its watchers and turns outstanding dispatchers and
/// armed passes into no-ops; [`App::unmount`] also removes the rendered root.
pub struct App<S: Merge + PartialEq + 'static, H: Host + 'static> {
    inner: Rc<Inner<S, H>>,
    watchers: RefCell<Vec<Cleanup>>,
}

/// Mount an app: bind dispatchers and render once, synchronously.
///
/// Later updates flow through dispatch → store → scheduler → reconciler.
pub fn mount<S, H>(config: AppConfig<S, H>) -> Result<App<S, H>, RenderError>
where
    S: Merge + PartialEq + 'static,
    H: Host + 'static,
{
    let AppConfig {
        host,
        mount_point,
        state,
        defer,
        view,
        actions,
        host_config,
    } = config;

    let inner = Rc::new_cyclic(|this: &Weak<Inner<S, H>>| {
        let runtime: Weak<dyn Runtime<S>> = this.clone();
        Inner {
            host,
            mount_point,
            host_config,
            view,
            store: Store::new(state),
            dispatchers: actions.bind(runtime),
            scheduler: Scheduler::new(defer),
            reconciler: RefCell::new(Reconciler::new()),
            latest: RefCell::new(None),
            render_count: Cell::new(0),
            last_error: RefCell::new(None),
            this: this.clone(),
        }
    });

    let tree = inner.project();
    {
        let adapter = Adapter::new(&*inner.host, &inner.host_config);
        inner
            .reconciler
            .borrow_mut()
            .render_full(&adapter, &inner.mount_point, tree)?;
    }
    debug!(actions = inner.dispatchers.len(), "mounted");

    Ok(App {
        inner,
        watchers: RefCell::new(Vec::new()),
    })
}

impl<S: Merge + PartialEq + 'static, H: Host + 'static> App<S, H> {
    /// Current state value.
    pub fn state(&self) -> Rc<S> {
        self.inner.store.state()
    }

    pub fn dispatchers(&self) -> &Dispatchers {
        &self.inner.dispatchers
    }

    /// Shorthand for `dispatchers().get::<P>(name)`.
    pub fn dispatcher<P: 'static>(&self, name: &str) -> Option<Dispatcher<P>> {
        self.inner.dispatchers.get(name)
    }

    /// Number of deferred reconciliation passes run so far.
    ///
    /// The synchronous render performed by [`mount`] is not counted.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.inner.scheduler.state()
    }

    /// Take the error of the most recent failed pass, if any.
    pub fn take_error(&self) -> Option<RenderError> {
        self.inner.last_error.borrow_mut().take()
    }

    /// The retained snapshot: the tree the host currently reflects.
    pub fn current_tree(&self) -> Option<VNode> {
        self.inner.reconciler.borrow().previous().cloned()
    }

    pub fn host(&self) -> &Rc<H> {
        &self.inner.host
    }

    pub fn mount_point(&self) -> &H::Node {
        &self.inner.mount_point
    }

    /// Observe state changes until the app is dropped or unmounted.
    pub fn watch(&self, f: impl Fn(&S) + 'static) {
        let stop = self.inner.store.watch(f);
        self.watchers.borrow_mut().push(stop);
    }

    /// Stop watchers and remove the rendered root from the mount point.
    pub fn unmount(self) -> Result<(), RenderError> {
        self.stop_watchers();
        let inner = &self.inner;
        inner
            .reconciler
            .borrow_mut()
            .unmount(&*inner.host, &inner.mount_point)?;
        debug!("unmounted");
        Ok(())
    }

    fn stop_watchers(&self) {
        let watchers: Vec<Cleanup> = self.watchers.borrow_mut().drain(..).collect();
        for stop in watchers {
            stop();
        }
    }
}

impl<S: Merge + PartialEq + 'static, H: Host + 'static> Drop for App<S, H> {
    fn drop(&mut self) {
        self.stop_watchers();
    }
}

impl<S: Merge + PartialEq + 'static, H: Host + 'static> fmt::Debug for App<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("mount_point", &self.inner.mount_point)
            .field("render_count", &self.render_count())
            .field("scheduler", &self.scheduler_state())
            .field("actions", &self.inner.dispatchers)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryHost, NodeId};
    use crate::pipeline::TaskQueue;
    use crate::types::Element;

    #[derive(Clone, Debug, PartialEq)]
    struct Items(Vec<String>);

    impl Merge for Items {
        type Partial = Vec<String>;

        fn merge(&self, items: Vec<String>) -> Self {
            Self(items)
        }
    }

    fn list_view(state: &Items, _: &Dispatchers) -> VNode {
        Element::new("ul")
            .children(state.0.iter().map(|item| Element::new(item.as_str()).child(item.as_str())))
            .into()
    }

    fn mount_items(
        initial: &[&str],
    ) -> (Rc<MemoryHost>, Rc<TaskQueue>, NodeId, App<Items, MemoryHost>) {
        let host = Rc::new(MemoryHost::new());
        let queue = Rc::new(TaskQueue::new());
        let root = host.create_root();
        let state = Items(initial.iter().map(|s| s.to_string()).collect());

        let config = AppConfig::new(host.clone(), root, state, queue.clone(), list_view).actions(
            ActionTree::new()
                .action("push", |s: &Items, item: String| {
                    let mut items = s.0.clone();
                    items.push(item);
                    items
                })
                .action("reset", |_: &Items, items: Vec<String>| items),
        );
        let app = mount(config).unwrap();
        (host, queue, root, app)
    }

    #[test]
    fn test_mount_renders_synchronously() {
        let (host, queue, root, app) = mount_items(&["p"]);
        assert_eq!(host.to_html(root), "<div><ul><p>p</p></ul></div>");
        assert!(queue.is_empty());
        assert_eq!(app.render_count(), 0);
        assert_eq!(app.scheduler_state(), SchedulerState::Idle);
        assert!(app.current_tree().is_some());
    }

    #[test]
    fn test_mount_surfaces_materialization_error() {
        let host = Rc::new(MemoryHost::new());
        let queue = Rc::new(TaskQueue::new());
        let root = host.create_root();
        let config = AppConfig::new(host.clone(), root, Items(vec!["bad tag".into()]), queue, list_view);

        match mount(config) {
            Err(RenderError::HostMaterialization { tag, .. }) => assert_eq!(tag, "bad tag"),
            other => panic!("expected materialization error, got {other:?}"),
        }
        assert_eq!(host.child_count(&root), 0);
    }

    #[test]
    fn test_failed_pass_recovers_on_next_dispatch() {
        let (host, queue, root, app) = mount_items(&["p"]);
        let push = app.dispatcher::<String>("push").unwrap();
        let reset = app.dispatcher::<Vec<String>>("reset").unwrap();

        push.dispatch("not valid".to_string());
        queue.run_pending();
        assert!(matches!(
            app.take_error(),
            Some(RenderError::HostMaterialization { .. })
        ));
        assert!(app.current_tree().is_none());
        assert_eq!(app.scheduler_state(), SchedulerState::Idle);

        reset.dispatch(vec!["em".to_string()]);
        queue.run_pending();
        assert!(app.take_error().is_none());
        assert_eq!(host.child_count(&root), 1);
        assert_eq!(host.to_html(root), "<div><ul><em>em</em></ul></div>");
        assert_eq!(app.render_count(), 2);
    }

    #[test]
    fn test_unmount_removes_root_and_silences_dispatchers() {
        let (host, queue, root, app) = mount_items(&["p"]);
        let push = app.dispatcher::<String>("push").unwrap();

        app.unmount().unwrap();
        assert_eq!(host.child_count(&root), 0);

        push.dispatch("em".to_string());
        assert_eq!(queue.run_until_idle(), 0);
        assert_eq!(host.child_count(&root), 0);
    }
}

//! Traits for managed resources and data sources.
//!
//! A managed resource turns plans into remote mutations and reads remote
//! objects back into state. A data source only reads. Every operation takes
//! the caller's [`CallContext`] and is self-contained: nothing is cached
//! between calls, so different instances can be driven concurrently.

use landscape::CallContext;

use crate::diagnostics::Outcome;

/// What it takes to move an instance from its state to its plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Nothing to do.
    NoOp,
    /// Change in place; lists the attributes that differ.
    Update(Vec<&'static str>),
    /// Destroy and create again; lists the attributes forcing it.
    Replace(Vec<&'static str>),
}

impl ChangeKind {
    /// Whether anything changes.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// A remote object managed through create/read/update/delete.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use landscape::{CallContext, MockBackend};
/// use scripts::{Attr, ManagedResource, ScriptPlan, ScriptResource};
///
/// let resource = ScriptResource::unified(Arc::new(MockBackend::new()));
/// let plan = ScriptPlan {
///     title: Attr::Known("hello".into()),
///     code: Attr::Known("echo hi".into()),
///     ..ScriptPlan::default()
/// };
///
/// let ctx = CallContext::background();
/// let state = resource.create(&ctx, &plan).unwrap();
/// assert_eq!(state.code, Attr::Known("echo hi".into()));
/// assert_eq!(state.script_type, Attr::Known("V1".into()));
/// ```
pub trait ManagedResource: Send + Sync {
    /// Desired inputs.
    type Plan;
    /// Recorded state.
    type State;

    /// Resource kind name, e.g. `script`.
    fn type_name(&self) -> &'static str;

    /// Create the remote object and return its complete state.
    fn create(&self, ctx: &CallContext, plan: &Self::Plan) -> Outcome<Self::State>;

    /// Read the current state. `None` means the object is gone.
    fn read(&self, ctx: &CallContext, current: &Self::State) -> Outcome<Option<Self::State>>;

    /// Change the object in place and return the state read back afterwards.
    fn update(
        &self,
        ctx: &CallContext,
        plan: &Self::Plan,
        current: &Self::State,
    ) -> Outcome<Self::State>;

    /// Remove the object. Already gone counts as success.
    fn delete(&self, ctx: &CallContext, current: &Self::State) -> Outcome<()>;

    /// Seed a state from an external id. A read must follow.
    fn import_by_id(&self, id: &str) -> Outcome<Self::State>;

    /// Classify the difference between a plan and a state.
    fn plan_change(&self, plan: &Self::Plan, current: &Self::State) -> ChangeKind;
}

/// A read-only lookup.
pub trait DataSource: Send + Sync {
    /// Lookup key.
    type Query;
    /// Record produced.
    type Record;

    /// Data source kind name.
    fn type_name(&self) -> &'static str;

    /// Run the lookup.
    fn read(&self, ctx: &CallContext, query: &Self::Query) -> Outcome<Self::Record>;
}

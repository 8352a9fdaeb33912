//! Execution planner: manifest vs state, one action per address.

use scripts::{Attr, ChangeKind};

use crate::address::Address;
use crate::manifest::{Desired, Manifest};
use crate::provider::Provider;
use crate::state::StateFile;

/// What apply will do to one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Update(Vec<&'static str>),
    Replace(Vec<&'static str>),
    Delete,
}

impl Action {
    pub fn symbol(&self) -> &'static str {
        match self {
            Action::Create => "+",
            Action::Update(_) => "~",
            Action::Replace(_) => "-/+",
            Action::Delete => "-",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update(_) => "update in place",
            Action::Replace(_) => "replace",
            Action::Delete => "delete",
        }
    }

    /// Attributes driving an update or replace.
    pub fn fields(&self) -> &[&'static str] {
        match self {
            Action::Update(fields) | Action::Replace(fields) => fields,
            Action::Create | Action::Delete => &[],
        }
    }

    /// Whether the instance ends up as a new remote object.
    pub fn is_new_object(&self) -> bool {
        matches!(self, Action::Create | Action::Replace(_))
    }
}

/// One planned change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub address: Address,
    pub action: Action,
}

/// Every change apply would make, in address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub changes: Vec<Change>,
    /// Instances already matching the manifest.
    pub unchanged: usize,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn action_for(&self, address: &Address) -> Option<&Action> {
        self.changes
            .iter()
            .find(|change| &change.address == address)
            .map(|change| &change.action)
    }

    /// Count changes matching `pred`.
    pub fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.changes.iter().filter(|change| pred(&change.action)).count()
    }
}

/// Fill in the script id of an attachment that names its script, from the
/// script's recorded state. Other inputs come back unchanged.
pub fn resolve_script_ref(desired: &Desired, state: &StateFile) -> Desired {
    match desired {
        Desired::Attachment {
            plan,
            script: Some(script),
        } => {
            let mut plan = plan.clone();
            plan.script_id = state
                .get(script)
                .and_then(|stored| stored.script_id())
                .map_or(Attr::Unknown, Attr::Known);
            Desired::Attachment {
                plan,
                script: Some(script.clone()),
            }
        }
        other => other.clone(),
    }
}

/// Plan the changes that bring `state` to `manifest`.
pub fn plan(manifest: &Manifest, state: &StateFile, provider: &Provider) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();

    // Scripts first: attachments depend on whether their script is new.
    let (scripts, attachments): (Vec<_>, Vec<_>) = manifest
        .instances
        .iter()
        .partition(|(address, _)| address.kind.is_script());

    for (address, desired) in scripts.into_iter().chain(attachments) {
        let Some(stored) = state.get(address) else {
            plan.changes.push(Change {
                address: address.clone(),
                action: Action::Create,
            });
            continue;
        };

        if let Desired::Attachment {
            script: Some(script),
            ..
        } = desired
            && plan.action_for(script).is_some_and(Action::is_new_object)
        {
            log::debug!("{address}: owning script {script} will be a new object");
            plan.changes.push(Change {
                address: address.clone(),
                action: Action::Replace(vec!["script_id"]),
            });
            continue;
        }

        match provider.plan_change(&resolve_script_ref(desired, state), stored) {
            ChangeKind::NoOp => plan.unchanged += 1,
            ChangeKind::Update(fields) => plan.changes.push(Change {
                address: address.clone(),
                action: Action::Update(fields),
            }),
            ChangeKind::Replace(fields) => plan.changes.push(Change {
                address: address.clone(),
                action: Action::Replace(fields),
            }),
        }
    }

    for address in state.resources.keys() {
        if manifest.get(address).is_none() {
            plan.changes.push(Change {
                address: address.clone(),
                action: Action::Delete,
            });
        }
    }

    plan.changes.sort_by(|a, b| a.address.cmp(&b.address));
    plan
}

/// Plan deleting everything in `state`.
pub fn plan_destroy(state: &StateFile) -> ExecutionPlan {
    ExecutionPlan {
        changes: state
            .resources
            .keys()
            .map(|address| Change {
                address: address.clone(),
                action: Action::Delete,
            })
            .collect(),
        unchanged: 0,
    }
}

//! Execution engine: runs a plan in dependency phases.
//!
//! 1. Attachment deletes (and the delete half of attachment replaces)
//! 2. Script deletes (and the delete half of script replaces)
//! 3. Script creates, updates and the create half of script replaces
//! 4. Attachment creates and the create half of attachment replaces
//!
//! Instances within a phase run concurrently. Each operation is
//! self-contained; results are folded into the state after each phase.

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use rayon::prelude::*;
use scripts::Diagnostics;
use std::collections::BTreeMap;

use super::planner::{Action, ExecutionPlan, resolve_script_ref};
use crate::address::Address;
use crate::manifest::{Desired, Manifest};
use crate::provider::Provider;
use crate::state::{StateFile, StoredState};
use crate::ui;

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Number of parallel jobs
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            verbose: false,
        }
    }
}

/// Summary of execution results
#[derive(Debug, Default)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub failures: BTreeMap<Address, Diagnostics>,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, address: &Address, diags: Diagnostics) {
        self.failures.entry(address.clone()).or_default().extend(diags);
    }
}

enum Operation {
    Create(Desired),
    Update(Desired, StoredState),
    Delete(StoredState),
}

struct Task {
    address: Address,
    operation: Operation,
}

/// Execute the plan, recording every successful result in `state`.
pub fn execute(
    plan: &ExecutionPlan,
    manifest: &Manifest,
    state: &mut StateFile,
    provider: &Provider,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .context("Failed to create apply thread pool")?;
    let mut summary = ExecuteSummary::default();

    // Phases 1 and 2: removals, attachments before their scripts.
    for scripts_phase in [false, true] {
        let tasks: Vec<Task> = plan
            .changes
            .iter()
            .filter(|change| change.address.kind.is_script() == scripts_phase)
            .filter(|change| matches!(change.action, Action::Delete | Action::Replace(_)))
            .filter_map(|change| {
                let stored = state.get(&change.address)?.clone();
                Some(Task {
                    address: change.address.clone(),
                    operation: Operation::Delete(stored),
                })
            })
            .collect();
        let label = if scripts_phase { "Removing scripts" } else { "Removing attachments" };
        run_phase(&pool, label, tasks, plan, state, provider, opts, &mut summary);
    }

    // Phases 3 and 4: writes, scripts before the attachments that name them.
    for scripts_phase in [true, false] {
        let mut tasks = Vec::new();
        for change in &plan.changes {
            if change.address.kind.is_script() != scripts_phase
                || change.action == Action::Delete
                || summary.failures.contains_key(&change.address)
            {
                continue;
            }
            let Some(desired) = manifest.get(&change.address) else {
                continue;
            };

            if let Desired::Attachment {
                script: Some(script),
                ..
            } = desired
                && state.get(script).is_none()
            {
                let mut diags = Diagnostics::new();
                diags.add_error(
                    "Owning script unavailable",
                    format!("{script} has no recorded state, so {} cannot be attached", change.address),
                );
                summary.fail(&change.address, diags);
                continue;
            }

            let desired = resolve_script_ref(desired, state);
            let operation = match (&change.action, state.get(&change.address)) {
                (Action::Update(_), Some(stored)) => Operation::Update(desired, stored.clone()),
                _ => Operation::Create(desired),
            };
            tasks.push(Task {
                address: change.address.clone(),
                operation,
            });
        }
        let label = if scripts_phase { "Writing scripts" } else { "Writing attachments" };
        run_phase(&pool, label, tasks, plan, state, provider, opts, &mut summary);
    }

    Ok(summary)
}

/// Run one phase in parallel and fold the results into `state`.
#[allow(clippy::too_many_arguments)]
fn run_phase(
    pool: &rayon::ThreadPool,
    label: &str,
    tasks: Vec<Task>,
    plan: &ExecutionPlan,
    state: &mut StateFile,
    provider: &Provider,
    opts: &ExecuteOptions,
    summary: &mut ExecuteSummary,
) {
    if tasks.is_empty() {
        return;
    }

    log::info!("{label}: {} operations", tasks.len());
    let pb = ui::progress_bar(tasks.len() as u64, label);

    let results: Vec<(Task, Result<Option<StoredState>, Diagnostics>)> = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| {
                let result = match &task.operation {
                    Operation::Create(desired) => {
                        provider.create(task.address.kind, desired).map(Some)
                    }
                    Operation::Update(desired, stored) => {
                        provider.update(desired, stored).map(Some)
                    }
                    Operation::Delete(stored) => provider.delete(stored).map(|()| None),
                };
                let symbol = if result.is_ok() { "✓" } else { "✗" };
                pb.set_message(format!("{symbol} {}", task.address));
                pb.inc(1);
                (task, result)
            })
            .collect()
    });
    pb.finish_and_clear();

    for (task, result) in results {
        let address = task.address;
        let action = plan.action_for(&address);
        match result {
            Ok(Some(stored)) => {
                if opts.verbose {
                    ui::dim(&format!("{address}: id {}", stored.remote_id()));
                }
                state.insert(address.clone(), stored);
                match action {
                    Some(Action::Update(_)) => summary.updated += 1,
                    Some(Action::Replace(_)) => summary.replaced += 1,
                    _ => summary.created += 1,
                }
                println!("  {} {address}", "✓".green());
            }
            Ok(None) => {
                state.remove(&address);
                if action == Some(&Action::Delete) {
                    summary.deleted += 1;
                    println!("  {} {address} deleted", "✓".green());
                } else {
                    log::debug!("{address}: removed, create follows");
                }
            }
            Err(diags) => {
                println!("  {} {address}", "✗".red());
                summary.fail(&address, diags);
            }
        }
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Apply complete! {} changes made.",
            "✓".green().bold(),
            summary.total_changes()
        );
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} deleted", summary.deleted);
    }
    for (address, diags) in &summary.failures {
        println!("    • {} {}", address.to_string().red(), "failed".red());
        ui::diagnostics(diags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Kind;
    use crate::engine::planner;
    use landscape::{ApiResponse, MockBackend};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    const MANIFEST: &str = r##"
        [scripts.deploy]
        kind = "script_v2"
        title = "Deploy"
        code = "#!/bin/sh\necho deploy"

        [scripts.cleanup]
        title = "Cleanup"
        code = "rm -rf /tmp/cache"
        username = "root"

        [attachments.env]
        script = "deploy"
        filename = "env.txt"
        content = "A=1"
    "##;

    fn setup() -> (MockBackend, Provider) {
        let mock = MockBackend::new();
        let provider = Provider::new(Arc::new(mock.clone()), Duration::from_secs(30));
        (mock, provider)
    }

    fn apply(manifest: &Manifest, state: &mut StateFile, provider: &Provider) -> ExecuteSummary {
        let plan = planner::plan(manifest, state, provider);
        execute(&plan, manifest, state, provider, &ExecuteOptions::default()).unwrap()
    }

    #[test]
    fn test_apply_from_scratch_then_converged() {
        let (mock, provider) = setup();
        let manifest = Manifest::parse(MANIFEST, Path::new(".")).unwrap();
        let mut state = StateFile::default();

        let summary = apply(&manifest, &mut state, &provider);
        assert!(summary.is_success(), "{:?}", summary.failures);
        assert_eq!(summary.created, 3);
        assert_eq!(state.resources.len(), 3);

        let deploy_id = state
            .get(&Address::new(Kind::ScriptV2, "deploy"))
            .and_then(StoredState::script_id)
            .unwrap();
        let sent = &mock.calls_to("CreateScriptAttachment")[0];
        assert_eq!(sent.get("script_id"), Some(deploy_id.to_string().as_str()));

        let plan = planner::plan(&manifest, &state, &provider);
        assert!(plan.is_empty(), "{:?}", plan.changes);
    }

    #[test]
    fn test_apply_update_replace_delete() {
        let (mock, provider) = setup();
        let manifest = Manifest::parse(MANIFEST, Path::new(".")).unwrap();
        let mut state = StateFile::default();
        apply(&manifest, &mut state, &provider);
        let before = state.get(&Address::new(Kind::ScriptAttachment, "env")).cloned();

        let edited = Manifest::parse(
            &MANIFEST
                .replace("title = \"Deploy\"", "title = \"Ship\"")
                .replace("content = \"A=1\"", "content = \"A=2\"")
                .replace("[scripts.cleanup]", "[scripts.cleanup_old]"),
            Path::new("."),
        )
        .unwrap();
        mock.clear_calls();
        let summary = apply(&edited, &mut state, &provider);

        assert!(summary.is_success(), "{:?}", summary.failures);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(mock.calls_to("EditScript").len(), 1);
        assert_eq!(mock.calls_to("RemoveScriptAttachment").len(), 1);
        assert_eq!(mock.calls_to("RemoveScript").len(), 1);

        let after = state.get(&Address::new(Kind::ScriptAttachment, "env")).cloned();
        assert_ne!(before, after);
        assert!(state.get(&Address::new(Kind::Script, "cleanup")).is_none());
        assert!(state.get(&Address::new(Kind::Script, "cleanup_old")).is_some());
    }

    #[test]
    fn test_failure_is_reported_per_address_and_state_keeps_the_rest() {
        let (mock, provider) = setup();
        let manifest = Manifest::parse(MANIFEST, Path::new(".")).unwrap();
        let mut state = StateFile::default();

        for _ in 0..2 {
            mock.respond_with(
                "CreateScript",
                ApiResponse::BadRequest {
                    message: Some("title already used".into()),
                },
            );
        }
        let summary = apply(&manifest, &mut state, &provider);

        // Both scripts fail; the attachment cannot be attached to nothing.
        assert_eq!(summary.failures.len(), 3);
        assert!(summary.failures[&Address::new(Kind::ScriptV2, "deploy")]
            .to_string()
            .contains("title already used"));
        assert!(summary.failures[&Address::new(Kind::ScriptAttachment, "env")]
            .to_string()
            .contains("no recorded state"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_destroy_removes_everything() {
        let (mock, provider) = setup();
        let manifest = Manifest::parse(MANIFEST, Path::new(".")).unwrap();
        let mut state = StateFile::default();
        apply(&manifest, &mut state, &provider);

        let plan = planner::plan_destroy(&state);
        let summary = execute(
            &plan,
            &manifest,
            &mut state,
            &provider,
            &ExecuteOptions {
                jobs: 1,
                verbose: true,
            },
        )
        .unwrap();

        assert_eq!(summary.deleted, 3);
        assert!(state.is_empty());
        assert_eq!(mock.calls_to("ArchiveScript").len(), 1);
        assert_eq!(mock.calls_to("RemoveScript").len(), 1);
    }
}

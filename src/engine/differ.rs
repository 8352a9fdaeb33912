//! Plan and drift display.

use colored::Colorize;
use scripts::{AttributeChange, diff_records};
use serde_json::Value;

use super::planner::{Action, ExecutionPlan, resolve_script_ref};
use crate::manifest::{Desired, Manifest};
use crate::state::{StateFile, StoredState};

/// Attribute-level detail for one change: planned inputs against recorded
/// inputs, limited to the attributes that drive the change.
pub fn change_details(
    action: &Action,
    desired: Option<&Desired>,
    recorded: Option<&Value>,
) -> Vec<AttributeChange> {
    let planned = desired.map(planned_inputs).unwrap_or(Value::Null);
    let recorded = recorded.cloned().unwrap_or(Value::Null);

    match action {
        Action::Create => diff_records(&Value::Null, &planned)
            .into_iter()
            .filter(|change| !change.after.is_null())
            .collect(),
        Action::Delete => Vec::new(),
        Action::Update(_) | Action::Replace(_) => diff_records(&recorded, &planned)
            .into_iter()
            .filter(|change| action.fields().contains(&change.attribute.as_str()))
            .collect(),
    }
}

fn planned_inputs(desired: &Desired) -> Value {
    let inputs = match desired {
        Desired::Script(plan) => serde_json::to_value(plan),
        Desired::Attachment { plan, .. } => serde_json::to_value(plan),
    };
    inputs.unwrap_or(Value::Null)
}

/// Display the plan.
pub fn display_plan(plan: &ExecutionPlan, manifest: &Manifest, state: &StateFile) {
    if plan.is_empty() {
        println!();
        println!(
            "  {} No changes. {} instances match the manifest.",
            "✓".green(),
            plan.unchanged
        );
        return;
    }

    println!();
    for change in &plan.changes {
        let symbol = match change.action {
            Action::Create => change.action.symbol().green(),
            Action::Update(_) => change.action.symbol().yellow(),
            Action::Replace(_) => change.action.symbol().magenta(),
            Action::Delete => change.action.symbol().red(),
        };
        let stored = state.get(&change.address);
        let remote = stored.map(|s| format!(" (id {})", s.remote_id())).unwrap_or_default();
        println!(
            "  {:>3} {}{} {}",
            symbol,
            change.address.to_string().bold(),
            remote.dimmed(),
            format!("will be {}", change.action.verb()).dimmed()
        );

        let recorded = stored.map(StoredState::inputs_json);
        let desired = manifest
            .get(&change.address)
            .map(|desired| resolve_script_ref(desired, state));
        let details = change_details(&change.action, desired.as_ref(), recorded.as_ref());
        for detail in &details {
            display_attribute_change(detail);
        }
        if let Action::Replace(fields) = &change.action {
            println!(
                "        {} {}",
                "forces replacement:".red(),
                fields.join(", ")
            );
        }
    }

    println!();
    println!(
        "  Plan: {} to create, {} to update, {} to replace, {} to delete.",
        plan.count(|a| *a == Action::Create).to_string().green(),
        plan.count(|a| matches!(a, Action::Update(_))).to_string().yellow(),
        plan.count(|a| matches!(a, Action::Replace(_))).to_string().magenta(),
        plan.count(|a| *a == Action::Delete).to_string().red()
    );
}

/// Display one attribute change; multi-line text is shown as a line diff.
pub fn display_attribute_change(change: &AttributeChange) {
    match change.as_text() {
        Some((before, after)) if before.contains('\n') || after.contains('\n') => {
            println!("      {}:", change.attribute);
            show_text_diff(before, after);
        }
        _ => println!(
            "      {}: {} → {}",
            change.attribute,
            render(&change.before).dimmed(),
            render(&change.after)
        ),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "(none)".to_string(),
        Value::String(text) if text.contains('\n') => {
            format!("<{} lines>", text.lines().count())
        }
        other => other.to_string(),
    }
}

/// Show a line diff between two texts using the `similar` crate
fn show_text_diff(before: &str, after: &str) {
    let diff = similar::TextDiff::from_lines(before, after);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            similar::ChangeTag::Delete => format!("- {change}").red(),
            similar::ChangeTag::Insert => format!("+ {change}").green(),
            similar::ChangeTag::Equal => format!("  {change}").dimmed(),
        };
        print!("        {line}");
        if change.missing_newline() {
            println!();
        }
    }
}

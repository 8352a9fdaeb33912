//! Refresh: read every recorded instance back and fold the result into state.

use colored::Colorize;
use rayon::prelude::*;
use scripts::{AttributeChange, Diagnostics, diff_records};

use super::differ::display_attribute_change;
use crate::address::Address;
use crate::provider::Provider;
use crate::state::{StateFile, StoredState};
use crate::ui;

/// What a refresh found.
#[derive(Debug, Default)]
pub struct Drift {
    /// Instances that no longer exist remotely (or are archived).
    pub gone: Vec<Address>,
    /// Instances whose remote record changed.
    pub changed: Vec<(Address, Vec<AttributeChange>)>,
    /// Instances that could not be read; their state is kept.
    pub failed: Vec<(Address, Diagnostics)>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.gone.is_empty() && self.changed.is_empty() && self.failed.is_empty()
    }
}

/// Read every instance in `state` and update it in place.
pub fn refresh_state(provider: &Provider, state: &mut StateFile) -> Drift {
    let results: Vec<(Address, Result<Option<StoredState>, Diagnostics>)> = state
        .resources
        .par_iter()
        .map(|(address, stored)| (address.clone(), provider.read(stored)))
        .collect();

    let mut drift = Drift::default();
    for (address, result) in results {
        match result {
            Ok(None) => {
                log::info!("{address} is gone, dropping it from state");
                state.remove(&address);
                drift.gone.push(address);
            }
            Ok(Some(fresh)) => {
                if let Some(old) = state.get(&address) {
                    let changes = diff_records(&old.to_json(), &fresh.to_json());
                    if !changes.is_empty() {
                        log::debug!("{address}: {} attributes drifted", changes.len());
                        drift.changed.push((address.clone(), changes));
                    }
                }
                state.insert(address, fresh);
            }
            Err(diags) => {
                log::warn!("{address}: refresh failed, keeping recorded state");
                drift.failed.push((address, diags));
            }
        }
    }
    drift
}

/// Display what a refresh found
pub fn display_drift(drift: &Drift) {
    if drift.is_clean() {
        ui::success("Remote objects match recorded state");
        return;
    }

    for address in &drift.gone {
        println!("  {} {} {}", "-".red(), address.to_string().bold(), "no longer exists".dimmed());
    }
    for (address, changes) in &drift.changed {
        println!("  {} {} {}", "~".yellow(), address.to_string().bold(), "changed outside of apply".dimmed());
        for change in changes {
            display_attribute_change(change);
        }
    }
    for (address, diags) in &drift.failed {
        println!("  {} {} {}", "✗".red(), address.to_string().bold(), "could not be read".dimmed());
        ui::diagnostics(diags);
    }
}

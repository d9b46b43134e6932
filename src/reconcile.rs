//! Cross-service dependency reconciliation: rewrites every `needed-by`
//! declaration into an explicit `requires` edge on the peer tasks that
//! provide the named symbol.
//!
//! Grounded on the reference implementation's `resolve_service_deps`: a
//! two-pass algorithm over the whole service set. Pass one unions every
//! service's `{symbol -> provides}` map; pass two walks every task again
//! and, where its `provides` intersects the merged map's keys, unions the
//! corresponding values into its `requires`.

use std::collections::HashMap;

use crate::model::ServiceMap;

/// Reconcile `needed-by` declarations across every service in `services`,
/// mutating each service's tasks in place. Idempotent: calling this twice
/// in a row leaves `requires` lists unchanged on the second call.
pub fn resolve_service_deps(services: &mut ServiceMap) {
    let mut needed_by: HashMap<String, Vec<String>> = HashMap::new();
    for service in services.values() {
        for (symbol, provides) in service.get_tasks_needed_by() {
            let entry = needed_by.entry(symbol).or_default();
            for p in provides {
                if !entry.contains(&p) {
                    entry.push(p);
                }
            }
        }
    }

    for service in services.values_mut() {
        service.update_task_requires(&needed_by);
    }
}

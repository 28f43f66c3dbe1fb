//! Bind-after-save persistence step
//!
//! Assemblies are constructed unbound: no row has a durable id and children
//! reference parents by position only. Once a store accepts the rows, this
//! step stitches the ids through the graph in a single pass.

use planstore::Store;
use thiserror::Error;
use tracing::debug;

use super::assemble::PlanAssembly;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("store returned an unbound {0} id")]
    Unbound(&'static str),
}

/// Save a whole assembly, returning it with every id bound.
///
/// Order matters: the plan first (its id threads into children), then
/// slices, then tasks. Tasks pair with slices by position - assembly
/// guarantees a 1:1, same-order correspondence.
pub fn persist_assembly<S: Store>(
    store: &mut S,
    assembly: PlanAssembly,
) -> Result<PlanAssembly, PersistError> {
    let plan = store.save(assembly.plan);
    let plan_id = plan.id.ok_or(PersistError::Unbound("plan"))?;

    let mut slices = assembly.slices;
    for slice in &mut slices {
        slice.bind_plan(plan_id);
    }
    let slices = store.save_all(slices);

    let mut tasks = assembly.tasks;
    for (task, slice) in tasks.iter_mut().zip(&slices) {
        let slice_id = slice.id.ok_or(PersistError::Unbound("slice"))?;
        task.bind_parents(plan_id, slice_id);
    }
    let tasks = store.save_all(tasks);

    debug!(plan_id, slices = slices.len(), tasks = tasks.len(), "assembly persisted");
    Ok(PlanAssembly { plan, slices, tasks })
}

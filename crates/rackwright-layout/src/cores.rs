use rackwright_core::{CoreAllocation, Diagnostics, WarningKind};

/// Owner job of every core of a node. Pinned allocations claim their exact indices first, then
/// unpinned allocations take the lowest free indices, job after job in input order. Cores left
/// over stay idle; requests beyond the node's capacity are dropped.
pub fn assign_core_owners(
    node: &str,
    cpus: u32,
    allocations: &[CoreAllocation],
    diag: &mut Diagnostics,
) -> Vec<Option<u64>> {
    let mut owners = vec![None; cpus as usize];

    for alloc in allocations {
        let Some(layout) = &alloc.layout else {
            continue;
        };
        for &index in layout {
            match owners.get_mut(index as usize) {
                Some(slot) => {
                    if slot.is_none() {
                        *slot = Some(alloc.job_id);
                    }
                }
                None => diag.warn(
                    WarningKind::CoreOutOfRange,
                    node,
                    format!(
                        "job {} pins core {index} but the node has {cpus} cores",
                        alloc.job_id
                    ),
                ),
            }
        }
    }

    let mut cursor = 0usize;
    for alloc in allocations.iter().filter(|a| a.layout.is_none()) {
        let mut remaining = alloc.cores;
        while remaining > 0 && cursor < owners.len() {
            if owners[cursor].is_none() {
                owners[cursor] = Some(alloc.job_id);
                remaining -= 1;
            }
            cursor += 1;
        }
    }

    owners
}

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::composition::Composition;
use crate::ids::{NodeId, PinId};

/// Upstream nodes of every node in `comp`, following data and flow links. Links whose
/// source pin is unknown are ignored.
pub fn dependencies(
    comp: &Composition,
    pin_owner: &HashMap<PinId, NodeId>,
) -> Vec<(NodeId, Vec<NodeId>)> {
    comp.nodes()
        .map(|node| {
            let upstream = node
                .flow_input()
                .into_iter()
                .chain(node.inputs())
                .filter_map(|p| p.connected_pin_id)
                .filter_map(|src| pin_owner.get(&src).copied())
                .filter(|src| comp.node(*src).is_some())
                .collect();
            (node.id(), upstream)
        })
        .collect()
}

/// Kahn ordering, sources first. On a cycle, returns the nodes that could not be ordered.
pub fn topo_order(nodes: &[(NodeId, Vec<NodeId>)]) -> Result<Vec<NodeId>, Vec<NodeId>> {
    let mut indeg: HashMap<NodeId, usize> = HashMap::new();
    let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for (id, inputs) in nodes {
        indeg.entry(*id).or_insert(0);
        for inp in inputs {
            adj.entry(*inp).or_default().push(*id);
            *indeg.entry(*id).or_default() += 1;
        }
    }

    // seed in declaration order so the result is stable
    let mut q: VecDeque<NodeId> = nodes
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| indeg.get(id) == Some(&0))
        .collect();

    let mut order = Vec::new();
    while let Some(u) = q.pop_front() {
        order.push(u);
        if let Some(vs) = adj.get(&u) {
            for v in vs {
                if let Some(d) = indeg.get_mut(v) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(*v);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        let stuck = nodes
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !order.contains(id))
            .collect();
        return Err(stuck);
    }
    Ok(order)
}

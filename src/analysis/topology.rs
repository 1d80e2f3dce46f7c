use crate::graph::{FlowGraph, GraphError};
use crate::store::NodeId;

/// Rejects flow tables containing a directed cycle.
///
/// DFS over `source -> target` edges with three-colour marking; reaching a
/// node that is still `Visiting` closes a cycle.
pub fn check_acyclic(graph: &FlowGraph) -> Result<(), GraphError> {
    let count = graph.node_count();
    let mut state = vec![VisitState::None; count];

    // Every node is a DFS root candidate so disconnected components are covered.
    for i in 0..count {
        if state[i] == VisitState::None {
            visit(NodeId::new(i), graph, &mut state)?;
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // Used for cycle detection
    Visited,
}

fn visit(node: NodeId, graph: &FlowGraph, state: &mut Vec<VisitState>) -> Result<(), GraphError> {
    let idx = node.index();

    match state[idx] {
        VisitState::Visited => return Ok(()),
        VisitState::Visiting => {
            return Err(GraphError::CycleDetected { node: graph.label(node).to_string() })
        }
        VisitState::None => state[idx] = VisitState::Visiting,
    }

    for child in graph.children(node) {
        visit(child, graph, state)?;
    }

    state[idx] = VisitState::Visited;
    Ok(())
}

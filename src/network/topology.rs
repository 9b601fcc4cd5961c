//! Iterative traversal of a role's calculation hierarchy.
use super::arena::{ConceptArena, ConceptId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // On the current path, used for cycle detection
    Visited,
}

/// Result of walking one role.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Post-order: every child appears before its parent.
    pub order: Vec<ConceptId>,
    /// Distance from the nearest root along the first path that reached the concept.
    pub depth: Vec<u32>,
    /// Concepts that sit on a cycle.
    pub cyclic: Vec<ConceptId>,
}

impl Topology {
    pub fn has_cycles(&self) -> bool {
        !self.cyclic.is_empty()
    }

    pub fn depth_of(&self, id: ConceptId) -> u32 {
        self.depth[id.index()]
    }

    /// Position of `id` in the bottom-up order.
    pub fn rank(&self) -> Vec<usize> {
        let mut rank = vec![usize::MAX; self.depth.len()];
        for (pos, id) in self.order.iter().enumerate() {
            rank[id.index()] = pos;
        }
        rank
    }
}

/// Depth-first walk with an explicit stack and a per-concept state array.
///
/// Roots are visited first in id order, then anything left over (concepts
/// only reachable through a cycle). Never recurses.
pub fn analyze(arena: &ConceptArena) -> Topology {
    let count = arena.count();
    let mut state = vec![VisitState::None; count];
    let mut on_cycle = vec![false; count];
    let mut topo = Topology { order: Vec::with_capacity(count), depth: vec![0; count], cyclic: Vec::new() };

    // (concept, next edge to explore)
    let mut stack: Vec<(ConceptId, u32)> = Vec::new();

    let roots = (0..count).map(ConceptId::new).filter(|&id| arena.is_root(id));
    let rest = (0..count).map(ConceptId::new);

    for start in roots.chain(rest) {
        if state[start.index()] != VisitState::None {
            continue;
        }
        state[start.index()] = VisitState::Visiting;
        stack.push((start, arena.first_edge(start)));

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            match arena.edge(cursor) {
                Some((child, next)) => {
                    top.1 = next;
                    match state[child.index()] {
                        VisitState::None => {
                            state[child.index()] = VisitState::Visiting;
                            topo.depth[child.index()] = topo.depth[node.index()] + 1;
                            stack.push((child, arena.first_edge(child)));
                        }
                        VisitState::Visiting => {
                            // Everything from `child` up to the top of the stack is on the loop.
                            let from = stack.iter().rposition(|&(id, _)| id == child).unwrap_or(0);
                            for &(id, _) in &stack[from..] {
                                on_cycle[id.index()] = true;
                            }
                        }
                        VisitState::Visited => {}
                    }
                }
                None => {
                    state[node.index()] = VisitState::Visited;
                    topo.order.push(node);
                    stack.pop();
                }
            }
        }
    }

    topo.cyclic = (0..count).filter(|&i| on_cycle[i]).map(ConceptId::new).collect();
    topo
}

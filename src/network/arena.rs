use std::collections::HashMap;

/// Dense integer handle for a concept inside one role's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConceptId(pub u32);

impl ConceptId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

const NO_EDGE: u32 = u32::MAX;

/// Columnar store of the concepts and parent→child edges of one role.
#[derive(Debug, Clone, Default)]
pub struct ConceptArena {
    names: Vec<String>,
    lookup: HashMap<String, ConceptId>,
    has_parent: Vec<bool>,

    // Downstream traversal (linked adjacency)
    first_child: Vec<u32>,
    child_targets: Vec<ConceptId>,
    next_child: Vec<u32>,
}

impl ConceptArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn intern(&mut self, name: &str) -> ConceptId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = ConceptId::new(self.names.len());
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        self.has_parent.push(false);
        self.first_child.push(NO_EDGE);
        id
    }

    pub fn id(&self, name: &str) -> Option<ConceptId> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, id: ConceptId) -> &str {
        &self.names[id.index()]
    }

    pub fn add_edge(&mut self, parent: ConceptId, child: ConceptId) {
        let edge = self.child_targets.len() as u32;
        self.child_targets.push(child);
        self.next_child.push(self.first_child[parent.index()]);
        self.first_child[parent.index()] = edge;
        self.has_parent[child.index()] = true;
    }

    pub fn is_root(&self, id: ConceptId) -> bool {
        !self.has_parent[id.index()]
    }

    #[inline(always)]
    pub(crate) fn first_edge(&self, id: ConceptId) -> u32 {
        self.first_child[id.index()]
    }

    /// Follows one edge, returning its target and the next edge of the same parent.
    #[inline(always)]
    pub(crate) fn edge(&self, edge: u32) -> Option<(ConceptId, u32)> {
        if edge == NO_EDGE {
            return None;
        }
        let e = edge as usize;
        Some((self.child_targets[e], self.next_child[e]))
    }

    pub fn children(&self, id: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        let mut cursor = self.first_edge(id);
        std::iter::from_fn(move || {
            let (child, next) = self.edge(cursor)?;
            cursor = next;
            Some(child)
        })
    }
}

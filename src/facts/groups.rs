//! Indexes facts by reporting context, tracking duplicate sets per concept.
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::duplicates::{DuplicateInfo, EqualityBasis};
use crate::analysis::is_dimensional;
use crate::store::{Decimals, Fact, Unit};

/// Every concept reported in one context.
#[derive(Debug, Clone)]
pub struct ContextGroup {
    context_id: String,
    facts: Vec<DuplicateInfo>,
    index: HashMap<String, usize>,
}

impl ContextGroup {
    fn new(context_id: &str) -> Self {
        Self { context_id: context_id.to_string(), facts: Vec::new(), index: HashMap::new() }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn get(&self, concept: &str) -> Option<&DuplicateInfo> {
        self.index.get(concept).map(|&i| &self.facts[i])
    }

    pub fn has(&self, concept: &str) -> bool {
        self.index.contains_key(concept)
    }

    /// Selected value, absent when the concept is missing or inconsistent.
    pub fn value(&self, concept: &str) -> Option<f64> {
        self.get(concept).and_then(DuplicateInfo::selected_value)
    }

    pub fn unit(&self, concept: &str) -> Option<&Unit> {
        self.get(concept).and_then(DuplicateInfo::unit)
    }

    pub fn decimals(&self, concept: &str) -> Option<Decimals> {
        self.get(concept).and_then(DuplicateInfo::selected_decimals)
    }

    pub fn original_name(&self, concept: &str) -> Option<&str> {
        self.get(concept).map(DuplicateInfo::original_concept)
    }

    /// Concepts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &DuplicateInfo> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// A usable value of a concept in some context, for cross-context lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConceptOccurrence<'a> {
    pub context_id: &'a str,
    pub original_concept: &'a str,
    pub value: f64,
    pub unit: Option<&'a Unit>,
    pub decimals: Decimals,
}

/// A duplicate set that needs reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedDuplicate {
    pub context_id: String,
    pub concept: String,
    pub original_concept: String,
    pub values: Vec<f64>,
    pub decimals: Vec<Decimals>,
}

impl FlaggedDuplicate {
    fn from_info(context_id: &str, info: &DuplicateInfo) -> Self {
        Self {
            context_id: context_id.to_string(),
            concept: info.concept().to_string(),
            original_concept: info.original_concept().to_string(),
            values: info.entries().iter().map(|e| e.value).collect(),
            decimals: info.entries().iter().map(|e| e.decimals).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub context_count: usize,
    pub dimensional_contexts: usize,
    pub total_facts: usize,
    pub duplicate_sets: usize,
    pub inconsistent_sets: usize,
}

/// Facts indexed by context, built once per run.
#[derive(Debug, Clone)]
pub struct FactGroups {
    contexts: Vec<ContextGroup>,
    index: HashMap<String, usize>,
    /// concept -> indices into `contexts`, in first-seen order.
    concept_contexts: HashMap<String, Vec<usize>>,
    total_facts: usize,
    percentage_tolerance: f64,
}

impl FactGroups {
    pub fn new(percentage_tolerance: f64) -> Self {
        Self {
            contexts: Vec::new(),
            index: HashMap::new(),
            concept_contexts: HashMap::new(),
            total_facts: 0,
            percentage_tolerance,
        }
    }

    pub fn from_facts(facts: &[Fact], percentage_tolerance: f64) -> Self {
        let mut groups = Self::new(percentage_tolerance);
        for fact in facts {
            groups.add_fact(fact);
        }
        groups
    }

    /// Adds a fact, appending to its duplicate set when the pair already exists.
    pub fn add_fact(&mut self, fact: &Fact) {
        let ctx_idx = match self.index.get(&fact.context_id) {
            Some(&i) => i,
            None => {
                let i = self.contexts.len();
                self.contexts.push(ContextGroup::new(&fact.context_id));
                self.index.insert(fact.context_id.clone(), i);
                i
            }
        };

        let group = &mut self.contexts[ctx_idx];
        match group.index.get(&fact.concept) {
            Some(&i) => group.facts[i].push(fact, self.percentage_tolerance),
            None => {
                group.index.insert(fact.concept.clone(), group.facts.len());
                group.facts.push(DuplicateInfo::new(fact));
                self.concept_contexts.entry(fact.concept.clone()).or_default().push(ctx_idx);
            }
        }
        self.total_facts += 1;
    }

    pub fn get_context(&self, context_id: &str) -> Option<&ContextGroup> {
        self.index.get(context_id).map(|&i| &self.contexts[i])
    }

    /// Contexts in first-seen order.
    pub fn contexts(&self) -> impl Iterator<Item = &ContextGroup> {
        self.contexts.iter()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn total_facts(&self) -> usize {
        self.total_facts
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Contexts in which `concept` (normalized) was reported.
    pub fn contexts_with_concept(&self, concept: &str) -> Vec<&str> {
        self.concept_contexts
            .get(concept)
            .map(|idxs| idxs.iter().map(|&i| self.contexts[i].context_id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Usable values of one concept across all contexts. Inconsistent sets are left out.
    pub fn occurrences<'a>(&'a self, concept: &'a str) -> impl Iterator<Item = ConceptOccurrence<'a>> + 'a {
        self.concept_contexts
            .get(concept)
            .into_iter()
            .flatten()
            .filter_map(move |&i| {
                let group = &self.contexts[i];
                let info = group.get(concept)?;
                let selected = info.selected()?;
                Some(ConceptOccurrence {
                    context_id: group.context_id.as_str(),
                    original_concept: selected.original_concept.as_str(),
                    value: selected.value,
                    unit: info.unit(),
                    decimals: selected.decimals,
                })
            })
    }

    /// Flattened concept -> occurrences view.
    pub fn all_facts_by_concept(&self) -> BTreeMap<&str, Vec<ConceptOccurrence<'_>>> {
        self.concept_contexts
            .keys()
            .map(|concept| (concept.as_str(), self.occurrences(concept).collect::<Vec<_>>()))
            .filter(|(_, occ)| !occ.is_empty())
            .collect()
    }

    pub fn find_inconsistent_duplicates(&self) -> Vec<FlaggedDuplicate> {
        self.flagged(|info| info.is_inconsistent())
    }

    /// Duplicate sets accepted only through the percentage fallback.
    pub fn find_percentage_reliant_duplicates(&self) -> Vec<FlaggedDuplicate> {
        self.flagged(|info| info.basis() == Some(EqualityBasis::PercentageFallback))
    }

    fn flagged(&self, pred: impl Fn(&DuplicateInfo) -> bool) -> Vec<FlaggedDuplicate> {
        let mut flagged = Vec::new();
        for group in &self.contexts {
            for info in group.iter().filter(|info| pred(info)) {
                flagged.push(FlaggedDuplicate::from_info(&group.context_id, info));
            }
        }
        flagged
    }

    pub fn summary(&self) -> GroupSummary {
        let mut summary = GroupSummary {
            context_count: self.contexts.len(),
            total_facts: self.total_facts,
            ..GroupSummary::default()
        };
        for group in &self.contexts {
            if is_dimensional(&group.context_id) {
                summary.dimensional_contexts += 1;
            }
            for info in group.iter().filter(|i| i.is_duplicate()) {
                summary.duplicate_sets += 1;
                if info.is_inconsistent() {
                    summary.inconsistent_sets += 1;
                }
            }
        }
        summary
    }
}

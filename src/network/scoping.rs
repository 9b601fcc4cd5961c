//! Groups calculation arcs by (extended link role, parent concept).
//!
//! A parent declared under several roles yields one independent calculation
//! per role; child sets are never merged across roles.
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use super::arena::ConceptArena;
use super::topology;
use crate::store::{normalize_concept, CalculationNetwork};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildArc {
    pub concept: String,
    pub original_concept: String,
    pub weight: f64,
    pub order: f64,
}

/// One (role, parent) calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopedCalculation {
    pub role: String,
    pub role_name: String,
    pub parent_concept: String,
    pub parent_original: String,
    pub children: Vec<ChildArc>,
    /// Distance of the parent from the top of its role's hierarchy.
    pub depth: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopingDiagnostics {
    pub roles: usize,
    pub calculations: usize,
    pub arcs: usize,
    /// Arcs with no role on either the arc or its network.
    pub arcs_without_role: usize,
    /// Repeated (role, parent, child) arcs that were dropped.
    pub repeated_arcs: usize,
    /// Parents declared under more than one role.
    pub multi_role_parents: Vec<String>,
    /// Roles whose hierarchy contains a cycle.
    pub cyclic_roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleScopedCalculations {
    calculations: Vec<ScopedCalculation>,
    diagnostics: ScopingDiagnostics,
}

/// Last path segment of a role URI, or the URI itself.
pub fn role_name(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => uri.to_string(),
    }
}

impl RoleScopedCalculations {
    pub fn from_networks(networks: &[CalculationNetwork]) -> Self {
        let mut diagnostics = ScopingDiagnostics::default();
        let mut calculations: Vec<ScopedCalculation> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();
        let mut roles: Vec<String> = Vec::new();

        // 1. Group arcs, first-seen order
        for network in networks {
            for arc in &network.arcs {
                diagnostics.arcs += 1;
                let role = if arc.role.trim().is_empty() { network.role.trim() } else { arc.role.trim() };
                if role.is_empty() {
                    diagnostics.arcs_without_role += 1;
                    continue;
                }

                let parent = normalize_concept(&arc.parent_concept);
                let key = (role.to_string(), parent.clone());
                let slot = match index.get(&key) {
                    Some(&i) => i,
                    None => {
                        if !roles.iter().any(|r| r == role) {
                            roles.push(role.to_string());
                        }
                        calculations.push(ScopedCalculation {
                            role: role.to_string(),
                            role_name: role_name(role),
                            parent_concept: parent,
                            parent_original: arc.parent_concept.clone(),
                            children: Vec::new(),
                            depth: 0,
                        });
                        index.insert(key, calculations.len() - 1);
                        calculations.len() - 1
                    }
                };

                let child = normalize_concept(&arc.child_concept);
                let calc = &mut calculations[slot];
                if calc.children.iter().any(|c| c.concept == child) {
                    diagnostics.repeated_arcs += 1;
                    continue;
                }
                calc.children.push(ChildArc {
                    concept: child,
                    original_concept: arc.child_concept.clone(),
                    weight: arc.weight,
                    order: arc.order,
                });
            }
        }

        if diagnostics.arcs_without_role > 0 {
            warn!(count = diagnostics.arcs_without_role, "Skipped calculation arcs with no role");
        }

        // 2. Order each role bottom-up and record depth
        let mut ordered = Vec::with_capacity(calculations.len());
        for role in &roles {
            let mut in_role: Vec<ScopedCalculation> =
                calculations.iter().filter(|c| &c.role == role).cloned().collect();

            let mut arena = ConceptArena::new();
            for calc in &in_role {
                let p = arena.intern(&calc.parent_concept);
                for child in &calc.children {
                    let c = arena.intern(&child.concept);
                    arena.add_edge(p, c);
                }
            }
            let topo = topology::analyze(&arena);
            if topo.has_cycles() {
                let members: Vec<&str> = topo.cyclic.iter().map(|&id| arena.name(id)).collect();
                warn!(role = %role, concepts = ?members, "Calculation hierarchy contains a cycle");
                diagnostics.cyclic_roles.push(role.clone());
            }

            let rank = topo.rank();
            for calc in &mut in_role {
                if let Some(id) = arena.id(&calc.parent_concept) {
                    calc.depth = topo.depth_of(id);
                }
            }
            in_role.sort_by_key(|c| arena.id(&c.parent_concept).map_or(usize::MAX, |id| rank[id.index()]));
            ordered.extend(in_role);
        }

        // 3. Parents reused across roles
        let mut parent_roles: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for calc in &ordered {
            parent_roles.entry(calc.parent_concept.as_str()).or_default().insert(calc.role.as_str());
        }
        diagnostics.multi_role_parents = parent_roles
            .into_iter()
            .filter(|(_, r)| r.len() > 1)
            .map(|(p, _)| p.to_string())
            .collect();

        diagnostics.roles = roles.len();
        diagnostics.calculations = ordered.len();
        debug!(
            roles = diagnostics.roles,
            calculations = diagnostics.calculations,
            multi_role_parents = diagnostics.multi_role_parents.len(),
            "Role-scoped calculation arcs"
        );

        Self { calculations: ordered, diagnostics }
    }

    /// Calculations grouped by role in first-seen role order, bottom-up within a role.
    pub fn iter(&self) -> impl Iterator<Item = &ScopedCalculation> {
        self.calculations.iter()
    }

    pub fn len(&self) -> usize {
        self.calculations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculations.is_empty()
    }

    pub fn diagnostics(&self) -> &ScopingDiagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CalculationArc;

    const BS: &str = "http://example.com/role/BalanceSheet";
    const SEG: &str = "http://example.com/role/SegmentDetails";

    #[test]
    fn test_role_name_is_last_segment() {
        assert_eq!(role_name(BS), "BalanceSheet");
        assert_eq!(role_name("http://example.com/role/Trailing/"), "Trailing");
        assert_eq!(role_name("Plain"), "Plain");
    }

    #[test]
    fn test_same_parent_under_two_roles_stays_separate() {
        let networks = vec![
            CalculationNetwork::new(BS, vec![
                CalculationArc::new("us-gaap:Assets", "us-gaap:AssetsCurrent", 1.0),
                CalculationArc::new("us-gaap:Assets", "us-gaap:AssetsNoncurrent", 1.0),
            ]),
            CalculationNetwork::new(SEG, vec![CalculationArc::new("us-gaap:Assets", "custom:SegmentAssets", 1.0)]),
        ];
        let scoped = RoleScopedCalculations::from_networks(&networks);

        assert_eq!(scoped.len(), 2);
        let bs: Vec<_> = scoped.iter().filter(|c| c.role == BS).collect();
        let seg: Vec<_> = scoped.iter().filter(|c| c.role == SEG).collect();
        assert_eq!(bs[0].children.len(), 2);
        assert_eq!(seg[0].children.len(), 1);
        assert_eq!(scoped.diagnostics().multi_role_parents, vec!["assets".to_string()]);
    }

    #[test]
    fn test_arc_role_overrides_network_role_and_missing_roles_are_skipped() {
        let networks = vec![
            CalculationNetwork::new("", vec![
                CalculationArc::new("A", "B", 1.0).in_role(BS),
                CalculationArc::new("A", "C", 1.0),
            ]),
        ];
        let scoped = RoleScopedCalculations::from_networks(&networks);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped.diagnostics().arcs_without_role, 1);
        assert_eq!(scoped.iter().next().map(|c| c.role_name.as_str()), Some("BalanceSheet"));
    }

    #[test]
    fn test_repeated_arcs_are_dropped_and_order_is_bottom_up() {
        let networks = vec![CalculationNetwork::new(BS, vec![
            CalculationArc::new("Assets", "AssetsCurrent", 1.0),
            CalculationArc::new("Assets", "AssetsCurrent", 1.0),
            CalculationArc::new("AssetsCurrent", "Cash", 1.0),
        ])];
        let scoped = RoleScopedCalculations::from_networks(&networks);
        let parents: Vec<_> = scoped.iter().map(|c| (c.parent_concept.as_str(), c.depth)).collect();
        assert_eq!(parents, vec![("assetscurrent", 1), ("assets", 0)]);
        assert_eq!(scoped.diagnostics().repeated_arcs, 1);
    }

    #[test]
    fn test_cyclic_role_is_reported() {
        let networks = vec![CalculationNetwork::new(BS, vec![
            CalculationArc::new("A", "B", 1.0),
            CalculationArc::new("B", "A", -1.0),
        ])];
        let scoped = RoleScopedCalculations::from_networks(&networks);
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped.diagnostics().cyclic_roles, vec![BS.to_string()]);
    }
}

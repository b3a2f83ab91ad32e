//! Direct call graph of a module, using petgraph.
//!
//! Edges run caller → callee. Indirect call sites have no edge; they are kept
//! aside so the analysis can apply the unknown-call clobber set.

use crate::shared::models::{CallSiteId, CallTarget, FunctionId, Module};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;

/// One strongly connected component of the call graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphScc {
    /// Members in function id order
    pub members: Vec<FunctionId>,

    /// More than one member, or a single member calling itself
    pub recursive: bool,
}

impl CallGraphScc {
    pub fn singleton(function: FunctionId, self_call: bool) -> Self {
        Self {
            members: vec![function],
            recursive: self_call,
        }
    }

    pub fn contains(&self, function: FunctionId) -> bool {
        self.members.contains(&function)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SccStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub scc_count: usize,
    pub recursive_sccs: usize,
    pub largest_scc: usize,
}

pub struct CallGraph {
    graph: DiGraph<FunctionId, CallSiteId>,
    /// `FunctionId` index → node
    nodes: Vec<NodeIndex>,
    indirect_sites: Vec<CallSiteId>,
}

impl CallGraph {
    pub fn build(module: &Module) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = module.function_ids().map(|f| graph.add_node(f)).collect();
        let mut indirect_sites = Vec::new();

        for (site, call) in module.call_sites() {
            match call.target {
                CallTarget::Direct { function } => {
                    if let (Some(&from), Some(&to)) =
                        (nodes.get(call.caller.index()), nodes.get(function.index()))
                    {
                        graph.add_edge(from, to, site);
                    }
                }
                CallTarget::Indirect { .. } => indirect_sites.push(site),
            }
        }

        Self {
            graph,
            nodes,
            indirect_sites,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn indirect_sites(&self) -> &[CallSiteId] {
        &self.indirect_sites
    }

    /// Direct callees of `function`, deduplicated, in id order
    pub fn callees(&self, function: FunctionId) -> Vec<FunctionId> {
        let Some(&node) = self.nodes.get(function.index()) else {
            return Vec::new();
        };
        let mut callees: Vec<FunctionId> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        callees.sort_unstable();
        callees.dedup();
        callees
    }

    pub fn calls_itself(&self, function: FunctionId) -> bool {
        self.nodes
            .get(function.index())
            .is_some_and(|&node| self.graph.contains_edge(node, node))
    }

    /// SCCs with every callee SCC before its callers
    pub fn sccs(&self) -> Vec<CallGraphScc> {
        // tarjan_scc yields components in reverse topological order of the
        // caller → callee edges, i.e. callees first
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| {
                let mut members: Vec<FunctionId> =
                    component.iter().map(|&n| self.graph[n]).collect();
                members.sort_unstable();
                let recursive = members.len() > 1 || self.calls_itself(members[0]);
                CallGraphScc { members, recursive }
            })
            .collect()
    }

    pub fn stats(&self, sccs: &[CallGraphScc]) -> SccStats {
        SccStats {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            scc_count: sccs.len(),
            recursive_sccs: sccs.iter().filter(|s| s.recursive).count(),
            largest_scc: sccs.iter().map(|s| s.members.len()).max().unwrap_or(0),
        }
    }
}

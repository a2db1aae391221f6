// Initial Topology
//
// Builds the starting `GraphSnapshot` from the simulator configuration: the
// declared node set plus `node_topology` link tokens such as `node0--node1`
// (undirected) or `node2->node3` (directed). Direction is dropped, both
// forms become a plain undirected edge.
use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use log::info;
use serde::Deserialize;

use crate::nv_errors::{ReplayError, Result};
use crate::nv_graph::GraphSnapshot;
use crate::nv_interface::NodeName;

pub const UNDIRECTED_SEPARATOR: &str = "--";
pub const DIRECTED_SEPARATOR: &str = "->";

// ============================================================================
// Link Tokens
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkToken {
    Undirected(NodeName, NodeName),
    Directed { from: NodeName, to: NodeName },
}

impl LinkToken {
    pub fn parse(token: &str) -> Result<Self> {
        let has_undirected = token.contains(UNDIRECTED_SEPARATOR);
        let has_directed = token.contains(DIRECTED_SEPARATOR);

        let (separator, directed) = match (has_undirected, has_directed) {
            (true, false) => (UNDIRECTED_SEPARATOR, false),
            (false, true) => (DIRECTED_SEPARATOR, true),
            _ => {
                return Err(ReplayError::configuration(format!(
                    "link token `{}` must contain exactly one of `{}` or `{}`",
                    token, UNDIRECTED_SEPARATOR, DIRECTED_SEPARATOR
                )))
            }
        };

        let parts: Vec<&str> = token.split(separator).map(str::trim).collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(ReplayError::configuration(format!(
                "link token `{}` must join exactly two node names",
                token
            )));
        }

        let (a, b) = (parts[0].to_string(), parts[1].to_string());
        Ok(if directed {
            LinkToken::Directed { from: a, to: b }
        } else {
            LinkToken::Undirected(a, b)
        })
    }

    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            LinkToken::Undirected(a, b) => (a, b),
            LinkToken::Directed { from, to } => (from, to),
        }
    }
}

// ============================================================================
// Topology Builder
// ============================================================================

/// Build the initial graph: every declared node (isolated ones included)
/// and one edge per link token. Links naming undeclared nodes are rejected.
pub fn build_initial_graph<N, S, L, T>(nodes: N, links: L) -> Result<GraphSnapshot>
where
    N: IntoIterator<Item = S>,
    S: AsRef<str>,
    L: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let declared: IndexSet<NodeName> = nodes
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .collect();

    let mut graph = GraphSnapshot::with_nodes(declared.iter().cloned());

    for token in links {
        let link = LinkToken::parse(token.as_ref())?;
        let (a, b) = link.endpoints();
        for endpoint in [a, b] {
            if !declared.contains(endpoint) {
                return Err(ReplayError::configuration(format!(
                    "link `{}` references undeclared node `{}`",
                    token.as_ref(),
                    endpoint
                )));
            }
        }
        graph.add_edge(a, b);
    }

    Ok(graph)
}

// ============================================================================
// Simulator Configuration
// ============================================================================

/// The parts of `simulator_config.json` the replay needs; other keys are ignored
#[derive(Clone, Debug, Deserialize)]
pub struct SimulatorConfig {
    pub nodes: Vec<SimulatorNode>,

    #[serde(default)]
    pub node_topology: Vec<String>,

    #[serde(default)]
    pub services: SimulatorServices,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SimulatorNode {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimulatorServices {
    #[serde(default)]
    pub peer_control_service: PeerControlService,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PeerControlService {
    #[serde(default)]
    pub enable: bool,
}

impl SimulatorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn peer_control_enabled(&self) -> bool {
        self.services.peer_control_service.enable
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// With peer control enabled the simulator wires peers itself, so the
    /// static topology is ignored and only the change log creates edges.
    pub fn initial_graph(&self) -> Result<GraphSnapshot> {
        let links: &[String] = if self.peer_control_enabled() {
            &[]
        } else {
            &self.node_topology
        };
        let graph = build_initial_graph(self.node_names(), links)?;
        info!(
            "initial topology: {} nodes, {} edges (peer control {})",
            graph.node_count(),
            graph.edge_count(),
            if self.peer_control_enabled() { "on" } else { "off" }
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nv_interface::EdgeKey;

    const CONFIG_JSON: &str = r#"{
        "nodes": [
            {"name": "A", "dataset": "mnist"},
            {"name": "B"},
            {"name": "C"},
            {"name": "D"}
        ],
        "node_topology": ["A--B", "C->B"],
        "services": {
            "peer_control_service": {"enable": false, "fedavg_buffer_size": 10}
        },
        "tick_limit": 20000
    }"#;

    #[test]
    fn test_link_token_forms() {
        assert_eq!(
            LinkToken::parse("A--B").unwrap(),
            LinkToken::Undirected("A".into(), "B".into())
        );
        assert_eq!(
            LinkToken::parse(" C -> D ").unwrap(),
            LinkToken::Directed {
                from: "C".into(),
                to: "D".into()
            }
        );
    }

    #[test]
    fn test_malformed_link_tokens() {
        for token in ["AB", "A-B", "A-->B", "A--B--C", "--B", "A->"] {
            assert!(
                matches!(LinkToken::parse(token), Err(ReplayError::Configuration { .. })),
                "token {} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_build_keeps_isolated_nodes_and_drops_direction() {
        let graph = build_initial_graph(["A", "B", "C", "D"], ["A--B", "C->B", "B--A"]).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(
            graph.edges(),
            vec![EdgeKey::new("A", "B"), EdgeKey::new("B", "C")]
        );
        assert_eq!(graph.degree("D"), 0);
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let err = build_initial_graph(["A", "B"], ["A--Z"]).unwrap_err();
        assert!(err.to_string().contains("undeclared node `Z`"));
    }

    #[test]
    fn test_simulator_config_topology() {
        let config = SimulatorConfig::from_json(CONFIG_JSON).unwrap();
        assert!(!config.peer_control_enabled());
        let graph = config.initial_graph().unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge("B", "C"));
    }

    #[test]
    fn test_peer_control_ignores_static_topology() {
        let json = CONFIG_JSON.replace("\"enable\": false", "\"enable\": true");
        let config = SimulatorConfig::from_json(&json).unwrap();
        assert!(config.peer_control_enabled());
        let graph = config.initial_graph().unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_missing_services_defaults_to_static_topology() {
        let config = SimulatorConfig::from_json(r#"{"nodes": [{"name": "X"}]}"#).unwrap();
        assert!(!config.peer_control_enabled());
        assert!(config.node_topology.is_empty());
    }
}

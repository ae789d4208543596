use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::model::{Edge, Node, NodeId, NodeKind, Scene};
use std::collections::HashMap;

/// Lookup structures derived from one [`Scene`].
///
/// Read-only after compilation; shared by every dispatch until the scene is replaced.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    scene_id: String,
    order: Vec<NodeId>,
    nodes_by_id: HashMap<NodeId, Node>,
    default_successor: HashMap<NodeId, NodeId>,
    named_edges: HashMap<NodeId, HashMap<String, Edge>>,
    event_entries: HashMap<String, Vec<NodeId>>,
    edge_count: usize,
}

/// Compile a scene into its lookup structures.
///
/// Pure function of the scene. Fails with a structural fault when a node id is duplicated or an
/// edge references a node that does not exist.
///
/// Default successors are folded in edge declaration order, so when a node is the source of
/// several default-chain edges the last declared one wins and the earlier ones are ignored.
pub fn compile_scene(scene: &Scene) -> InkframeResult<SceneGraph> {
    let mut nodes_by_id = HashMap::with_capacity(scene.nodes.len());
    let mut order = Vec::with_capacity(scene.nodes.len());
    let mut event_entries: HashMap<String, Vec<NodeId>> = HashMap::new();

    for node in &scene.nodes {
        if nodes_by_id.insert(node.id.clone(), node.clone()).is_some() {
            return Err(InkframeError::structural(format!(
                "scene '{}' declares node '{}' more than once",
                scene.id, node.id
            )));
        }
        order.push(node.id.clone());
        if node.kind == NodeKind::Event {
            event_entries
                .entry(node.keyword().to_owned())
                .or_default()
                .push(node.id.clone());
        }
    }

    let mut default_successor = HashMap::new();
    let mut named_edges: HashMap<NodeId, HashMap<String, Edge>> = HashMap::new();

    for edge in &scene.edges {
        for end in [&edge.source, &edge.target] {
            if !nodes_by_id.contains_key(end) {
                return Err(InkframeError::structural(format!(
                    "edge '{}' references unknown node '{end}'",
                    edge.id
                )));
            }
        }

        if edge.is_default_chain() {
            let previous = default_successor.insert(edge.source.clone(), edge.target.clone());
            if let Some(previous) = previous {
                tracing::debug!(
                    scene = %scene.id,
                    node = %edge.source,
                    discarded = %previous,
                    kept = %edge.target,
                    "node has several default successors; last declared edge wins"
                );
            }
        }
        if let Some(handle) = edge.source_handle.as_deref().filter(|h| !h.is_empty()) {
            named_edges
                .entry(edge.source.clone())
                .or_default()
                .insert(handle.to_owned(), edge.clone());
        }
    }

    Ok(SceneGraph {
        scene_id: scene.id.clone(),
        order,
        nodes_by_id,
        default_successor,
        named_edges,
        event_entries,
        edge_count: scene.edges.len(),
    })
}

impl SceneGraph {
    /// Id of the compiled scene.
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// Look up a node.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes_by_id.get(id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes_by_id.get(id))
    }

    /// Resolved default successor of a node, if any.
    pub fn default_successor(&self, id: &str) -> Option<&str> {
        self.default_successor.get(id).map(String::as_str)
    }

    /// Edge leaving `id` through the given source handle.
    pub fn named_edge(&self, id: &str, handle: &str) -> Option<&Edge> {
        self.named_edges.get(id)?.get(handle)
    }

    /// All named edges leaving `id`, keyed by handle.
    pub fn named_edges(&self, id: &str) -> Option<&HashMap<String, Edge>> {
        self.named_edges.get(id)
    }

    /// Event nodes declaring `event`, in declaration order.
    pub fn entry_nodes(&self, event: &str) -> &[NodeId] {
        self.event_entries
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Number of edges, including those that lost the default-successor fold.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/graph.rs"]
mod tests;

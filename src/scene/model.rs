use serde::{Deserialize, Serialize};

/// Node identifier, unique within a scene.
pub type NodeId = String;

/// JSON object used for node config overrides, event payloads and scene state.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// One complete node/edge graph describing a device's configured behavior.
///
/// Immutable for the lifetime of a dispatch; replaced wholesale on reconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene identifier.
    pub id: String,
    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in declaration order. Order matters for default-chain resolution.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Scene {
    /// Parse a scene from its persisted JSON form.
    pub fn from_json_str(s: &str) -> crate::InkframeResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| crate::InkframeError::validation(format!("parse scene JSON: {e}")))
    }

    /// Check node ids, keywords and edge references, reporting every problem with its JSON path.
    pub fn validate(&self) -> crate::InkframeResult<()> {
        crate::scene::validate::validate_scene(self)
            .map_err(|e| crate::InkframeError::validation(format!("scene validation failed: {e}")))
    }
}

/// A single step (App) or trigger marker (Event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// Persisted as `"type": "event" | "app"`.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Keyword and per-node config overrides.
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// The capability (App) or event keyword this node declares.
    pub fn keyword(&self) -> &str {
        &self.data.keyword
    }
}

/// Node kind.
///
/// Unknown `type` strings are kept rather than rejected so that a scene still loads and the engine
/// can report the node as a structural fault when a dispatch actually reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Trigger marker naming an event (`render`, `button_press`, ...).
    Event,
    /// Processing step backed by an App capability.
    App,
    /// Any other persisted type.
    Unknown(String),
}

impl NodeKind {
    /// Persisted spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Event => "event",
            Self::App => "app",
            Self::Unknown(s) => s,
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "event" => Self::Event,
            "app" => Self::App,
            _ => Self::Unknown(s),
        })
    }
}

/// Node payload: `keyword` names the event or app, `config` carries field overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Event or capability keyword.
    #[serde(default)]
    pub keyword: String,
    /// Per-node field overrides.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub config: JsonMap,
}

/// Directed link between nodes.
///
/// Edges without a source handle (or with the editor's `next` handle) form the default chain.
/// Edges with any other source handle, conventionally `field/<name>`, are named branches looked up
/// by specific App behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge id.
    pub id: String,
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Optional named output handle on the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Optional named input handle on the target node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// Source handle editors use for plain "next step" links.
pub const NEXT_HANDLE: &str = "next";

/// Prefix for named branch / sub-pipeline handles.
pub const FIELD_HANDLE_PREFIX: &str = "field/";

impl Edge {
    /// Whether this edge links a node to its default successor.
    pub fn is_default_chain(&self) -> bool {
        match self.source_handle.as_deref() {
            None | Some("") => true,
            Some(h) => h == NEXT_HANDLE,
        }
    }
}

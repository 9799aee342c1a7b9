//! Arena-backed directory tree shared by both engines.
//!
//! Nodes are addressed by index; parent/child edges are stored as index
//! pairs, so the tree carries no owning back-pointers and no lifetime
//! cycles. The root is a synthetic node standing for the volume itself.

use chrono::NaiveDateTime;

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node represents on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// Engine-independent metadata every node carries.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    /// Display name: the long file name when one exists, the short name
    /// otherwise.
    pub name: String,
    /// The 8.3 short name, kept for matching when `name` is a long name.
    pub alt_name: Option<String>,
    pub kind: NodeKind,
    /// File size in bytes; 0 for directories.
    pub size: u64,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub accessed: Option<NaiveDateTime>,
}

impl NodeMeta {
    /// Metadata for a synthetic directory node (the volume root).
    pub fn directory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alt_name: None,
            kind: NodeKind::Directory,
            size: 0,
            created: None,
            modified: None,
            accessed: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

#[derive(Debug)]
struct Node<P> {
    meta: NodeMeta,
    payload: P,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Directory tree over an engine-specific payload type `P` (the decoded
/// directory entry or MFT record the node was built from).
#[derive(Debug)]
pub struct Tree<P> {
    nodes: Vec<Node<P>>,
}

impl<P> Tree<P> {
    /// Creates a tree holding only its root node.
    pub fn new(root_meta: NodeMeta, root_payload: P) -> Self {
        Self {
            nodes: vec![Node {
                meta: root_meta,
                payload: root_payload,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a node directly under `parent`.
    pub fn add_child(&mut self, parent: NodeId, meta: NodeMeta, payload: P) -> NodeId {
        let id = self.add_detached(meta, payload);
        self.attach(parent, id);
        id
    }

    /// Inserts a node with no parent edge yet. Used by the NTFS engine,
    /// which links nodes in a second pass once all records are known.
    pub fn add_detached(&mut self, meta: NodeMeta, payload: P) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            meta,
            payload,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Links `child` under `parent`. A node keeps at most one parent; a
    /// node never attached stays unreachable from the root, which is how
    /// dangling parent references are represented.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn meta(&self, id: NodeId) -> &NodeMeta {
        &self.nodes[id.0].meta
    }

    pub fn payload(&self, id: NodeId) -> &P {
        &self.nodes[id.0].payload
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }
}

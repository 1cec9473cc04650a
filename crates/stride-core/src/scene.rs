use crate::{Result, StrideError, Transform};
use std::collections::HashMap;
use std::fmt;

/// Handle to a node (joint, target, pole, home, ...) in a transform store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// World-space read/write access to the host's transform hierarchy.
pub trait TransformStore {
    fn world(&self, node: NodeId) -> Option<Transform>;

    fn set_world(&mut self, node: NodeId, world: Transform) -> Result<()>;

    fn world_position(&self, node: NodeId) -> Option<glam::Vec3> {
        self.world(node).map(|t| t.position)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub local: Transform,
}

/// Parent/child hierarchy of local transforms. World poses are composed on
/// demand, so moving a parent carries its children along.
#[derive(Debug, Clone, Default)]
pub struct TransformHierarchy {
    nodes: Vec<Node>,
    names: HashMap<String, NodeId>,
}

impl TransformHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        local: Transform,
    ) -> Result<NodeId> {
        if let Some(p) = parent {
            if self.node(p).is_none() {
                return Err(StrideError::UnknownNode(p));
            }
        }
        let id = NodeId(self.nodes.len() as u32);
        let name = name.into();
        self.names.insert(name.clone(), id);
        self.nodes.push(Node { name, parent, local });
        Ok(id)
    }

    /// Adds a node whose initial pose is given in world space.
    pub fn add_world_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        world: Transform,
    ) -> Result<NodeId> {
        let local = match parent {
            Some(p) => self
                .world(p)
                .ok_or(StrideError::UnknownNode(p))?
                .inverse()
                .mul_transform(&world),
            None => world,
        };
        self.add_node(name, parent, local)
    }

    /// Construction-time lookup; runtime code holds `NodeId`s instead.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn local(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|n| n.local)
    }

    pub fn set_local(&mut self, id: NodeId, local: Transform) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or(StrideError::UnknownNode(id))?;
        node.local = local;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TransformStore for TransformHierarchy {
    fn world(&self, node: NodeId) -> Option<Transform> {
        let n = self.node(node)?;
        match n.parent {
            Some(p) => Some(self.world(p)?.mul_transform(&n.local)),
            None => Some(n.local),
        }
    }

    fn set_world(&mut self, node: NodeId, world: Transform) -> Result<()> {
        let parent = self.node(node).ok_or(StrideError::UnknownNode(node))?.parent;
        let local = match parent {
            Some(p) => self
                .world(p)
                .ok_or(StrideError::UnknownNode(p))?
                .inverse()
                .mul_transform(&world),
            None => world,
        };
        self.set_local(node, local)
    }
}

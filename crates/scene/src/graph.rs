use glam::{Mat4, Quat, Vec3};
use roomscale_common::{Aabb, NodeId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event record produced by every mutation to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// Node was created under `parent` with the given local transform.
    Spawned {
        id: NodeId,
        parent: NodeId,
        local: Transform,
    },
    /// Node (and its subtree, which gets its own events) was removed.
    Despawned { id: NodeId },
    /// Node moved to a new parent.
    Reparented {
        id: NodeId,
        old_parent: NodeId,
        new_parent: NodeId,
    },
    /// Local transform was replaced.
    TransformUpdated {
        id: NodeId,
        old: Transform,
        new: Transform,
    },
}

/// Errors from scene graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("the root node cannot be {0}")]
    RootImmutable(&'static str),
    #[error("placing {child:?} under {parent:?} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

/// A single node: local transform relative to its parent, plus optional bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bounds: Option<Aabb>,
    name: Option<String>,
}

impl Node {
    fn new(parent: Option<NodeId>, local: Transform) -> Self {
        Self {
            local,
            parent,
            children: Vec::new(),
            bounds: None,
            name: None,
        }
    }

    pub fn local(&self) -> &Transform {
        &self.local
    }

    /// `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Bounds in the node's local space.
    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Arena-backed scene graph.
///
/// Transforms are stored parent-relative; world values are derived on demand
/// by walking the parent chain, so moving a parent carries its whole subtree.
///
/// Mutations are only logged once [`Scene::record_events`] is switched on; the
/// owner of the log must then drain it every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    #[serde(skip)]
    recording: bool,
    #[serde(skip)]
    events: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only the identity root.
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut root_node = Node::new(None, Transform::default());
        root_node.name = Some("root".into());
        let mut nodes = BTreeMap::new();
        nodes.insert(root, root_node);
        Self {
            nodes,
            root,
            recording: false,
            events: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    /// Start or stop logging mutations. Stopping discards pending events.
    pub fn record_events(&mut self, on: bool) {
        self.recording = on;
        if !on {
            self.events.clear();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn record(&mut self, event: SceneEvent) {
        if self.recording {
            self.events.push(event);
        }
    }

    /// Drain and return pending scene events.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to pending events.
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Spawn a node under `parent` with a parent-relative transform.
    pub fn spawn(&mut self, parent: NodeId, local: Transform) -> Result<NodeId, SceneError> {
        let id = NodeId::new();
        self.node_mut(parent)?.children.push(id);
        self.nodes.insert(id, Node::new(Some(parent), local));
        self.record(SceneEvent::Spawned { id, parent, local });
        Ok(id)
    }

    /// Spawn a node with a human-readable name.
    pub fn spawn_named(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local: Transform,
    ) -> Result<NodeId, SceneError> {
        let id = self.spawn(parent, local)?;
        self.node_mut(id)?.name = Some(name.into());
        Ok(id)
    }

    /// Remove a node and its whole subtree. Returns removed ids, deepest last.
    pub fn despawn(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable("despawned"));
        }
        let parent = self.node(id)?.parent;
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children.iter().copied());
                self.record(SceneEvent::Despawned { id: next });
                removed.push(next);
            }
        }
        Ok(removed)
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        self.node_mut(id)?.name = Some(name.into());
        Ok(())
    }

    /// First node carrying `name`, in id order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
    }

    /// Set local-space bounds used for world AABB queries.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Option<Aabb>) -> Result<(), SceneError> {
        self.node_mut(id)?.bounds = bounds;
        Ok(())
    }

    pub fn local(&self, id: NodeId) -> Result<Transform, SceneError> {
        Ok(self.node(id)?.local)
    }

    /// Replace a node's parent-relative transform and log the change.
    pub fn set_local(&mut self, id: NodeId, new: Transform) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let old = node.local;
        node.local = new;
        self.record(SceneEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    /// Add `delta` to a node's local position.
    pub fn translate(&mut self, id: NodeId, delta: Vec3) -> Result<(), SceneError> {
        let mut local = self.local(id)?;
        local.position += delta;
        self.set_local(id, local)
    }

    /// Composed transform from node space to world space.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.node(id)?;
        let mut m = node.local.to_matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            m = node.local.to_matrix() * m;
        }
        Ok(m)
    }

    pub fn world_transform(&self, id: NodeId) -> Result<Transform, SceneError> {
        Ok(Transform::from_matrix(&self.world_matrix(id)?))
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok(self.world_matrix(id)?.w_axis.truncate())
    }

    pub fn world_rotation(&self, id: NodeId) -> Result<Quat, SceneError> {
        Ok(self.world_transform(id)?.rotation)
    }

    /// Facing direction: the node's local -Z axis expressed in world space.
    pub fn world_direction(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok((self.world_rotation(id)? * Vec3::NEG_Z).normalize())
    }

    /// Place a node at a world position/orientation, keeping its world scale.
    pub fn set_world_pose(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), SceneError> {
        let scale = self.world_transform(id)?.scale;
        self.set_world_transform(
            id,
            Transform {
                position,
                rotation,
                scale,
            },
        )
    }

    /// Solve for the local transform that yields `world` under the current parent.
    pub fn set_world_transform(&mut self, id: NodeId, world: Transform) -> Result<(), SceneError> {
        let target = world.to_matrix();
        let local = match self.node(id)?.parent {
            Some(parent) => self.world_matrix(parent)?.inverse() * target,
            None => target,
        };
        self.set_local(id, Transform::from_matrix(&local))
    }

    /// World-space box enclosing the node's local bounds, if it has any.
    pub fn world_bounds(&self, id: NodeId) -> Result<Option<Aabb>, SceneError> {
        let Some(bounds) = self.node(id)?.bounds else {
            return Ok(None);
        };
        Ok(Some(bounds.transformed(&self.world_matrix(id)?)))
    }

    /// True if `ancestor` appears on `id`'s parent chain (or equals it).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if c == ancestor {
                return true;
            }
            cursor = self.nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    /// Move a node under `new_parent`, keeping its local transform.
    ///
    /// The apparent world pose changes whenever the old and new parent
    /// chains differ; use [`Scene::attach`] to keep it.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable("reparented"));
        }
        self.node(new_parent)?;
        if self.is_ancestor(id, new_parent) {
            return Err(SceneError::Cycle {
                child: id,
                parent: new_parent,
            });
        }
        let old_parent = self.node(id)?.parent.unwrap_or(self.root);
        if old_parent == new_parent {
            return Ok(());
        }
        if let Some(p) = self.nodes.get_mut(&old_parent) {
            p.children.retain(|c| *c != id);
        }
        self.node_mut(new_parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(new_parent);
        self.record(SceneEvent::Reparented {
            id,
            old_parent,
            new_parent,
        });
        tracing::trace!(id = %id.short(), parent = %new_parent.short(), "reparented");
        Ok(())
    }

    /// Move a node under `new_parent`, keeping its world transform.
    pub fn attach(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        let world = self.world_matrix(id)?;
        self.reparent(id, new_parent)?;
        let parent_world = self.world_matrix(new_parent)?;
        self.set_local(id, Transform::from_matrix(&(parent_world.inverse() * world)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn scene_starts_with_root() {
        let s = Scene::new();
        assert_eq!(s.len(), 1);
        assert!(s.is_empty());
        assert_eq!(s.get(s.root()).unwrap().parent(), None);
        assert_eq!(s.find_by_name("root"), Some(s.root()));
    }

    #[test]
    fn spawn_records_parent_and_child() {
        let mut s = Scene::new();
        s.record_events(true);
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        assert_eq!(s.get(a).unwrap().parent(), Some(s.root()));
        assert_eq!(s.get(s.root()).unwrap().children(), &[a]);
        assert_eq!(s.events().len(), 1);
    }

    #[test]
    fn events_are_not_logged_unless_recording() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        for _ in 0..100 {
            s.translate(a, Vec3::X).unwrap();
        }
        assert!(!s.is_recording());
        assert!(s.events().is_empty());

        s.record_events(true);
        s.translate(a, Vec3::X).unwrap();
        assert_eq!(s.events().len(), 1);
        s.record_events(false);
        assert!(s.events().is_empty());
    }

    #[test]
    fn spawn_under_missing_parent_fails() {
        let mut s = Scene::new();
        let ghost = NodeId::new();
        assert_eq!(
            s.spawn(ghost, Transform::default()),
            Err(SceneError::NodeNotFound(ghost))
        );
    }

    #[test]
    fn despawn_removes_subtree() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        let b = s.spawn(a, Transform::default()).unwrap();
        let removed = s.despawn(a).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!s.contains(a));
        assert!(!s.contains(b));
        assert!(s.get(s.root()).unwrap().children().is_empty());
    }

    #[test]
    fn root_is_immutable() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        assert!(matches!(s.despawn(s.root()), Err(SceneError::RootImmutable(_))));
        assert!(matches!(
            s.reparent(s.root(), a),
            Err(SceneError::RootImmutable(_))
        ));
    }

    #[test]
    fn world_matrix_composes_parent_chain() {
        let mut s = Scene::new();
        let turned = Transform::from_position_rotation(Vec3::X, Quat::from_rotation_y(FRAC_PI_2));
        let parent = s.spawn(s.root(), turned).unwrap();
        let child = s
            .spawn(parent, Transform::from_position(Vec3::NEG_Z))
            .unwrap();
        // Rotating -Z by +90° about Y yields -X.
        let p = s.world_position(child).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 0.0), EPS), "{p:?}");
    }

    #[test]
    fn world_direction_defaults_to_negative_z() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        assert!(s.world_direction(a).unwrap().abs_diff_eq(Vec3::NEG_Z, EPS));

        let turned = Transform {
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            ..Transform::default()
        };
        s.set_local(a, turned).unwrap();
        assert!(s.world_direction(a).unwrap().abs_diff_eq(Vec3::NEG_X, EPS));
    }

    #[test]
    fn reparent_keeps_local_attach_keeps_world() {
        let mut s = Scene::new();
        let holder = s
            .spawn(s.root(), Transform::from_position(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        let a = s
            .spawn(s.root(), Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        let b = s
            .spawn(s.root(), Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();

        s.reparent(a, holder).unwrap();
        assert!(s.world_position(a).unwrap().abs_diff_eq(Vec3::new(6.0, 2.0, 3.0), EPS));

        s.attach(b, holder).unwrap();
        assert!(s.world_position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), EPS));
        assert!(s.local(b).unwrap().position.abs_diff_eq(Vec3::new(-4.0, 2.0, 3.0), EPS));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        let b = s.spawn(a, Transform::default()).unwrap();
        assert_eq!(
            s.reparent(a, b),
            Err(SceneError::Cycle { child: a, parent: b })
        );
        assert_eq!(s.reparent(a, a), Err(SceneError::Cycle { child: a, parent: a }));
    }

    #[test]
    fn reparent_logs_event() {
        let mut s = Scene::new();
        s.record_events(true);
        let a = s.spawn(s.root(), Transform::default()).unwrap();
        let b = s.spawn(s.root(), Transform::default()).unwrap();
        s.drain_events();
        s.reparent(b, a).unwrap();
        assert_eq!(
            s.events(),
            &[SceneEvent::Reparented {
                id: b,
                old_parent: s.root(),
                new_parent: a
            }]
        );
        assert_eq!(s.get(a).unwrap().children(), &[b]);
        assert_eq!(s.get(s.root()).unwrap().children(), &[a]);
    }

    #[test]
    fn set_world_pose_under_rotated_parent() {
        let mut s = Scene::new();
        let tilted = Transform::from_position_rotation(Vec3::Y, Quat::from_rotation_z(0.4));
        let parent = s.spawn(s.root(), tilted).unwrap();
        let child = s.spawn(parent, Transform::default()).unwrap();
        let target_rot = Quat::from_rotation_x(0.25);
        s.set_world_pose(child, Vec3::splat(2.0), target_rot).unwrap();
        let world = s.world_transform(child).unwrap();
        assert!(world.position.abs_diff_eq(Vec3::new(2.0, 2.0, 2.0), EPS));
        assert!(
            world.rotation.abs_diff_eq(target_rot, EPS)
                || world.rotation.abs_diff_eq(-target_rot, EPS)
        );
    }

    #[test]
    fn world_bounds_follow_parent() {
        let mut s = Scene::new();
        let parent = s
            .spawn(s.root(), Transform::from_position(Vec3::new(0.0, 0.0, -2.0)))
            .unwrap();
        let a = s.spawn(parent, Transform::default()).unwrap();
        assert_eq!(s.world_bounds(a).unwrap(), None);

        s.set_bounds(a, Some(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))))
            .unwrap();
        let wb = s.world_bounds(a).unwrap().unwrap();
        assert!(wb.center().abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), EPS));
    }

    #[test]
    fn translate_adds_to_local_position() {
        let mut s = Scene::new();
        let a = s.spawn(s.root(), Transform::from_position(Vec3::ONE)).unwrap();
        s.translate(a, Vec3::new(0.5, 0.0, -0.5)).unwrap();
        assert_eq!(s.local(a).unwrap().position, Vec3::new(1.5, 1.0, 0.5));
    }
}

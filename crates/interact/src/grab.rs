use roomscale_common::{Aabb, NodeId, Transform};
use roomscale_input::{InputSampler, InputSource};
use roomscale_scene::Scene;
use std::collections::BTreeMap;

use crate::{GrabConfig, InteractError};

/// Scene objects eligible for grabbing, in registration order.
///
/// Populated explicitly by the host; order decides ties between overlapping
/// candidates.
#[derive(Debug, Clone, Default)]
pub struct InteractableRegistry {
    nodes: Vec<NodeId>,
}

impl InteractableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the node was already registered.
    pub fn register(&mut self, id: NodeId) -> bool {
        if self.nodes.contains(&id) {
            return false;
        }
        self.nodes.push(id);
        true
    }

    pub fn unregister(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| *n != id);
        self.nodes.len() != before
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A tracked hand: its attach-point node and its input.
#[derive(Debug)]
pub struct HandController<S> {
    pub node: NodeId,
    pub input: InputSampler<S>,
}

impl<S: InputSource> HandController<S> {
    pub fn new(node: NodeId, input: InputSampler<S>) -> Self {
        Self { node, input }
    }
}

/// An object held by a controller, with its pose in the controller's frame
/// captured at grab time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabBinding {
    pub object: NodeId,
    pub relative: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabEvent {
    Acquired { controller: NodeId, object: NodeId },
    Released { controller: NodeId, object: NodeId },
}

/// Pick-up and put-down of interactables by hand controllers.
///
/// While held, an object is a child of its controller node and follows it
/// through ordinary parent propagation; its world pose is recomputed and
/// frozen at the moment of release.
#[derive(Debug, Clone)]
pub struct GrabSystem {
    config: GrabConfig,
    bindings: BTreeMap<NodeId, GrabBinding>,
}

impl GrabSystem {
    pub fn new(config: GrabConfig) -> Self {
        Self {
            config,
            bindings: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Binding held by a controller, if any.
    pub fn binding(&self, controller: NodeId) -> Option<&GrabBinding> {
        self.bindings.get(&controller)
    }

    /// Controller currently holding `object`.
    pub fn holder_of(&self, object: NodeId) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|(_, b)| b.object == object)
            .map(|(c, _)| *c)
    }

    pub fn held_count(&self) -> usize {
        self.bindings.len()
    }

    /// Evaluate acquire/release for every hand, in slice order.
    ///
    /// A release completes (object back under the root) before the next
    /// hand is evaluated, so an object dropped by one hand can be picked up
    /// by a later hand on the same tick.
    pub fn update<S: InputSource>(
        &mut self,
        scene: &mut Scene,
        registry: &InteractableRegistry,
        hands: &mut [HandController<S>],
    ) -> Result<Vec<GrabEvent>, InteractError> {
        let mut events = Vec::new();
        for hand in hands.iter_mut() {
            if let Some(binding) = self.bindings.get(&hand.node).copied() {
                if !hand.input.button(&self.config.button)? {
                    self.release(scene, hand.node, binding)?;
                    events.push(GrabEvent::Released {
                        controller: hand.node,
                        object: binding.object,
                    });
                }
                continue;
            }

            if !hand.input.button_down(&self.config.button)? {
                continue;
            }
            let Some(object) = self.find_target(scene, registry, hand.node)? else {
                tracing::trace!(controller = %hand.node.short(), "squeeze with nothing in reach");
                continue;
            };
            self.acquire(scene, hand.node, object)?;
            self.pulse(hand)?;
            events.push(GrabEvent::Acquired {
                controller: hand.node,
                object,
            });
        }
        Ok(events)
    }

    /// First registered, unheld interactable whose world box overlaps the hand box.
    pub fn find_target(
        &self,
        scene: &Scene,
        registry: &InteractableRegistry,
        controller: NodeId,
    ) -> Result<Option<NodeId>, InteractError> {
        let hand_box = Aabb::from_center_half_extents(
            scene.world_position(controller)?,
            self.config.hand_half_extents,
        );
        for candidate in registry.iter() {
            if !scene.contains(candidate)
                || self.holder_of(candidate).is_some()
                || scene.is_ancestor(candidate, controller)
            {
                continue;
            }
            let Some(bounds) = scene.world_bounds(candidate)? else {
                continue;
            };
            if bounds.intersects(&hand_box) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn acquire(
        &mut self,
        scene: &mut Scene,
        controller: NodeId,
        object: NodeId,
    ) -> Result<(), InteractError> {
        let offset = scene.world_matrix(controller)?.inverse() * scene.world_matrix(object)?;
        let relative = Transform::from_matrix(&offset);
        scene.reparent(object, controller)?;
        scene.set_local(object, relative)?;
        self.bindings
            .insert(controller, GrabBinding { object, relative });
        tracing::debug!(
            controller = %controller.short(),
            object = %object.short(),
            "grabbed"
        );
        Ok(())
    }

    fn release(
        &mut self,
        scene: &mut Scene,
        controller: NodeId,
        binding: GrabBinding,
    ) -> Result<(), InteractError> {
        self.bindings.remove(&controller);
        if !scene.contains(binding.object) {
            tracing::debug!(
                object = %binding.object.short(),
                "held object vanished; binding dropped"
            );
            return Ok(());
        }
        // Capture before reparenting: the parent chain is about to change.
        let world = scene.world_transform(binding.object)?;
        scene.reparent(binding.object, scene.root())?;
        scene.set_world_transform(binding.object, world)?;
        tracing::debug!(
            controller = %controller.short(),
            object = %binding.object.short(),
            "released"
        );
        Ok(())
    }

    /// Drop everything currently held, e.g. when controllers disconnect.
    pub fn release_all(&mut self, scene: &mut Scene) -> Result<Vec<GrabEvent>, InteractError> {
        let held: Vec<(NodeId, GrabBinding)> =
            self.bindings.iter().map(|(c, b)| (*c, *b)).collect();
        let mut events = Vec::with_capacity(held.len());
        for (controller, binding) in held {
            self.release(scene, controller, binding)?;
            events.push(GrabEvent::Released {
                controller,
                object: binding.object,
            });
        }
        Ok(events)
    }

    fn pulse<S: InputSource>(&self, hand: &mut HandController<S>) -> Result<(), InteractError> {
        if self.config.haptic_intensity <= 0.0 || hand.input.source().haptic_actuator_count() == 0 {
            return Ok(());
        }
        hand.input
            .haptic_actuator(0)?
            .pulse(self.config.haptic_intensity, self.config.haptic_duration());
        Ok(())
    }
}

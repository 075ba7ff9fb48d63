use roomscale_common::{NodeId, Transform};
use roomscale_scene::{Scene, SceneError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::Ease;

/// Handle to a scheduled tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// Which scalar of a node's local transform a tween drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenProperty {
    PositionX,
    PositionY,
    PositionZ,
}

impl TweenProperty {
    fn read(self, t: &Transform) -> f32 {
        match self {
            Self::PositionX => t.position.x,
            Self::PositionY => t.position.y,
            Self::PositionZ => t.position.z,
        }
    }

    fn write(self, t: &mut Transform, value: f32) {
        match self {
            Self::PositionX => t.position.x = value,
            Self::PositionY => t.position.y = value,
            Self::PositionZ => t.position.z = value,
        }
    }
}

/// Target, duration and curve of a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSpec {
    pub to: f32,
    pub duration: Duration,
    pub ease: Ease,
}

/// Emitted exactly once when a tween reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenCompleted {
    pub id: TweenId,
    pub node: NodeId,
    pub property: TweenProperty,
}

#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone)]
struct Tween {
    node: NodeId,
    property: TweenProperty,
    from: f32,
    spec: TweenSpec,
    elapsed: Duration,
}

/// Frame-driven tween scheduler.
///
/// The host calls [`Tweener::advance`] once per tick; completions come back
/// as values so consumers handle them synchronously on that tick.
#[derive(Debug, Default)]
pub struct Tweener {
    tweens: BTreeMap<TweenId, Tween>,
    next_id: u64,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a tween from the property's current value to `spec.to`.
    pub fn animate(
        &mut self,
        scene: &Scene,
        node: NodeId,
        property: TweenProperty,
        spec: TweenSpec,
    ) -> Result<TweenId, TweenError> {
        let from = property.read(&scene.local(node)?);
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.insert(
            id,
            Tween {
                node,
                property,
                from,
                spec,
                elapsed: Duration::ZERO,
            },
        );
        tracing::trace!(
            ?id,
            node = %node.short(),
            ?property,
            from,
            to = spec.to,
            "tween scheduled"
        );
        Ok(id)
    }

    /// Drop a tween without completing it.
    pub fn cancel(&mut self, id: TweenId) -> bool {
        self.tweens.remove(&id).is_some()
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.tweens.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Step every tween by `dt`, write eased values, and report completions.
    ///
    /// A tween whose node has disappeared is dropped without completing.
    pub fn advance(&mut self, scene: &mut Scene, dt: Duration) -> Vec<TweenCompleted> {
        let mut completed = Vec::new();
        let mut orphaned = Vec::new();

        for (id, tween) in self.tweens.iter_mut() {
            tween.elapsed = tween.elapsed.saturating_add(dt);
            let t = if tween.spec.duration.is_zero() {
                1.0
            } else {
                (tween.elapsed.as_secs_f32() / tween.spec.duration.as_secs_f32()).min(1.0)
            };
            let done = t >= 1.0;
            let value = if done {
                tween.spec.to
            } else {
                tween.from + (tween.spec.to - tween.from) * tween.spec.ease.apply(t)
            };

            let Ok(mut local) = scene.local(tween.node) else {
                orphaned.push(*id);
                continue;
            };
            tween.property.write(&mut local, value);
            if scene.set_local(tween.node, local).is_err() {
                orphaned.push(*id);
                continue;
            }

            if done {
                completed.push(TweenCompleted {
                    id: *id,
                    node: tween.node,
                    property: tween.property,
                });
            }
        }

        for id in orphaned {
            tracing::warn!(?id, "tween target vanished; dropping without completion");
            self.tweens.remove(&id);
        }
        for c in &completed {
            self.tweens.remove(&c.id);
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn setup() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let node = scene
            .spawn(scene.root(), Transform::from_position(Vec3::new(2.0, 0.0, 3.0)))
            .unwrap();
        (scene, node)
    }

    fn spec(to: f32, ms: u64) -> TweenSpec {
        TweenSpec {
            to,
            duration: Duration::from_millis(ms),
            ease: Ease::Linear,
        }
    }

    #[test]
    fn linear_tween_reaches_target_and_completes_once() {
        let (mut scene, node) = setup();
        let mut tw = Tweener::new();
        let id = tw
            .animate(&scene, node, TweenProperty::PositionY, spec(1.0, 100))
            .unwrap();

        assert!(tw.advance(&mut scene, Duration::from_millis(50)).is_empty());
        let y = scene.local(node).unwrap().position.y;
        assert!((y - 0.5).abs() < 1e-4);

        let done = tw.advance(&mut scene, Duration::from_millis(60));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, id);
        assert_eq!(scene.local(node).unwrap().position.y, 1.0);
        assert!(!tw.is_active(id));

        assert!(tw.advance(&mut scene, Duration::from_millis(60)).is_empty());
    }

    #[test]
    fn only_the_driven_axis_changes() {
        let (mut scene, node) = setup();
        let mut tw = Tweener::new();
        tw.animate(&scene, node, TweenProperty::PositionY, spec(1.0, 100))
            .unwrap();
        scene.translate(node, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        tw.advance(&mut scene, Duration::from_millis(100));
        assert_eq!(scene.local(node).unwrap().position, Vec3::new(3.0, 1.0, 3.0));
    }

    #[test]
    fn zero_duration_completes_on_next_advance() {
        let (mut scene, node) = setup();
        let mut tw = Tweener::new();
        tw.animate(&scene, node, TweenProperty::PositionX, spec(-1.0, 0))
            .unwrap();
        assert_eq!(tw.advance(&mut scene, Duration::ZERO).len(), 1);
        assert_eq!(scene.local(node).unwrap().position.x, -1.0);
    }

    #[test]
    fn cancelled_tween_never_completes() {
        let (mut scene, node) = setup();
        let mut tw = Tweener::new();
        let id = tw
            .animate(&scene, node, TweenProperty::PositionY, spec(1.0, 10))
            .unwrap();
        assert!(tw.cancel(id));
        assert!(tw.advance(&mut scene, Duration::from_secs(1)).is_empty());
        assert_eq!(tw.active_count(), 0);
    }

    #[test]
    fn orphaned_tween_is_dropped() {
        let (mut scene, node) = setup();
        let mut tw = Tweener::new();
        tw.animate(&scene, node, TweenProperty::PositionY, spec(1.0, 10))
            .unwrap();
        scene.despawn(node).unwrap();
        assert!(tw.advance(&mut scene, Duration::from_secs(1)).is_empty());
        assert_eq!(tw.active_count(), 0);
    }

    #[test]
    fn animate_unknown_node_fails() {
        let (scene, _) = setup();
        let mut tw = Tweener::new();
        assert!(matches!(
            tw.animate(&scene, NodeId::new(), TweenProperty::PositionY, spec(1.0, 10)),
            Err(TweenError::Scene(SceneError::NodeNotFound(_)))
        ));
    }
}

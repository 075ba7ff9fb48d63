use glam::Vec3;
use roomscale_common::{Aabb, NodeId, Transform};
use roomscale_input::{Handedness, InputSampler, InputSource};
use roomscale_scene::Scene;
use roomscale_tween::Tweener;
use std::time::Duration;

use crate::{
    GrabEvent, GrabSystem, HandController, InteractConfig, InteractError, InteractableRegistry,
    JumpController, JumpPhase, LocomotionController,
};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Horizontal step taken by the avatar, if any.
    pub moved: Option<Vec3>,
    pub jump_phase: JumpPhase,
    pub grab_events: Vec<GrabEvent>,
    /// Scene mutations recorded (and drained) this tick.
    pub scene_events: usize,
}

/// Reference host: owns the scene, the avatar rig, the controllers and the
/// interactable registry, and sequences the systems once per frame.
///
/// Controllers are children of the avatar node, so locomotion and jumps
/// carry the hands (and anything they hold) with the rig.
pub struct RoomSession<S> {
    scene: Scene,
    tweener: Tweener,
    avatar: NodeId,
    hands: Vec<HandController<S>>,
    registry: InteractableRegistry,
    locomotion: LocomotionController,
    jump: JumpController,
    grab: GrabSystem,
    config: InteractConfig,
    frame: u64,
}

impl<S: InputSource> RoomSession<S> {
    /// Empty scene with an avatar rig at the origin.
    pub fn new(config: InteractConfig) -> Result<Self, InteractError> {
        let mut scene = Scene::new();
        scene.record_events(true);
        let avatar = scene.spawn_named(scene.root(), "avatar", Transform::default())?;
        Ok(Self {
            scene,
            tweener: Tweener::new(),
            avatar,
            hands: Vec::new(),
            registry: InteractableRegistry::new(),
            locomotion: LocomotionController::new(config.locomotion.clone()),
            jump: JumpController::new(config.jump.clone()),
            grab: GrabSystem::new(config.grab.clone()),
            config,
            frame: 0,
        })
    }

    /// A small room: a floor slab and a row of grabbable boxes on a table.
    pub fn with_room(config: InteractConfig) -> Result<Self, InteractError> {
        let mut session = Self::new(config)?;
        let root = session.scene.root();
        let floor = session.scene.spawn_named(
            root,
            "floor",
            Transform::from_position(Vec3::new(0.0, -0.05, 0.0)),
        )?;
        session.scene.set_bounds(
            floor,
            Some(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(5.0, 0.05, 5.0))),
        )?;
        for (i, x) in [-0.4f32, 0.0, 0.4].into_iter().enumerate() {
            session.spawn_interactable(
                format!("box-{i}"),
                Transform::from_position(Vec3::new(x, 1.0, -1.0)),
                Vec3::splat(0.1),
            )?;
        }
        Ok(session)
    }

    /// Bind a device and mount it on the avatar rig.
    pub fn add_controller(&mut self, source: S) -> Result<NodeId, InteractError> {
        let name = format!("controller-{:?}", source.handedness()).to_lowercase();
        let input = InputSampler::new(source, self.config.thresholds)?;
        let node = self
            .scene
            .spawn_named(self.avatar, name, Transform::default())?;
        self.hands.push(HandController::new(node, input));
        Ok(node)
    }

    /// Spawn a box-bounded object under the root and register it.
    pub fn spawn_interactable(
        &mut self,
        name: impl Into<String>,
        world: Transform,
        half_extents: Vec3,
    ) -> Result<NodeId, InteractError> {
        let id = self.scene.spawn_named(self.scene.root(), name, world)?;
        self.scene
            .set_bounds(id, Some(Aabb::from_center_half_extents(Vec3::ZERO, half_extents)))?;
        self.registry.register(id);
        Ok(id)
    }

    /// Write a tracked controller pose, relative to the avatar rig.
    pub fn set_controller_pose(
        &mut self,
        controller: NodeId,
        local: Transform,
    ) -> Result<(), InteractError> {
        self.scene.set_local(controller, local)?;
        Ok(())
    }

    /// Run one frame: sample input, advance tweens, then locomotion, jump and grab.
    pub fn tick(&mut self, dt: Duration) -> Result<FrameReport, InteractError> {
        self.frame += 1;
        let _span = tracing::info_span!("room_tick", frame = self.frame).entered();

        for hand in &mut self.hands {
            hand.input.update();
        }
        let completed = self.tweener.advance(&mut self.scene, dt);

        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        let mover = self.config.locomotion.hand;
        if let Some(hand) = self.hands.iter().find(|h| h.input.source().handedness() == mover) {
            report.moved = self
                .locomotion
                .update(&mut self.scene, self.avatar, &hand.input, dt)?;
        }

        let jumper = self.config.jump.hand;
        let jump_hand = self.hands.iter().find(|h| h.input.source().handedness() == jumper);
        report.jump_phase = match jump_hand {
            Some(hand) => self.jump.update(
                &self.scene,
                &mut self.tweener,
                self.avatar,
                &hand.input,
                &completed,
            )?,
            None => self.jump.phase(),
        };

        report.grab_events = self
            .grab
            .update(&mut self.scene, &self.registry, &mut self.hands)?;

        report.scene_events = self.scene.drain_events().len();
        tracing::trace!(
            moved = report.moved.is_some(),
            phase = ?report.jump_phase,
            grabs = report.grab_events.len(),
            "tick complete"
        );
        Ok(report)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn avatar(&self) -> NodeId {
        self.avatar
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &InteractConfig {
        &self.config
    }

    pub fn hands(&self) -> &[HandController<S>] {
        &self.hands
    }

    /// Controller node held in the given hand.
    pub fn controller(&self, hand: Handedness) -> Option<NodeId> {
        self.hands
            .iter()
            .find(|h| h.input.source().handedness() == hand)
            .map(|h| h.node)
    }

    pub fn registry(&self) -> &InteractableRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut InteractableRegistry {
        &mut self.registry
    }

    pub fn jump(&self) -> &JumpController {
        &self.jump
    }

    pub fn grab(&self) -> &GrabSystem {
        &self.grab
    }

    pub fn tweener_mut(&mut self) -> &mut Tweener {
        &mut self.tweener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomscale_input::{ControlLayout, DeviceFrame, ScriptedSource, controls};

    const TICK: Duration = Duration::from_millis(16);
    const XR: &str = "xr-standard";

    fn slot(name: &str) -> usize {
        ControlLayout::XrStandard.button_index(name).unwrap()
    }

    fn frames(n: usize, f: impl Fn(usize) -> DeviceFrame) -> Vec<DeviceFrame> {
        (0..n).map(f).collect()
    }

    fn session(left: Vec<DeviceFrame>, right: Vec<DeviceFrame>) -> RoomSession<ScriptedSource> {
        session_with(InteractConfig::default(), left, right)
    }

    fn session_with(
        config: InteractConfig,
        left: Vec<DeviceFrame>,
        right: Vec<DeviceFrame>,
    ) -> RoomSession<ScriptedSource> {
        let mut s = RoomSession::with_room(config).unwrap();
        s.add_controller(ScriptedSource::new(XR, Handedness::Left, left))
            .unwrap();
        s.add_controller(ScriptedSource::new(XR, Handedness::Right, right))
            .unwrap();
        s
    }

    #[test]
    fn room_has_three_registered_boxes() {
        let s: RoomSession<ScriptedSource> =
            RoomSession::with_room(InteractConfig::default()).unwrap();
        assert_eq!(s.registry().len(), 3);
        assert!(s.scene().find_by_name("floor").is_some());
        assert!(!s.registry().contains(s.scene().find_by_name("floor").unwrap()));
    }

    #[test]
    fn controllers_mount_on_the_rig() {
        let s = session(Vec::new(), Vec::new());
        let left = s.controller(Handedness::Left).unwrap();
        assert_eq!(s.scene().get(left).unwrap().parent(), Some(s.avatar()));
        assert!(s.controller(Handedness::None).is_none());
    }

    #[test]
    fn unknown_layout_is_rejected_at_mount() {
        let mut s: RoomSession<ScriptedSource> =
            RoomSession::new(InteractConfig::default()).unwrap();
        let err = s.add_controller(ScriptedSource::new("joycon", Handedness::Left, Vec::new()));
        assert!(matches!(err, Err(InteractError::Input(_))));
    }

    #[test]
    fn left_stick_walks_the_rig_and_its_hands() {
        let stick_forward = frames(10, |_| DeviceFrame::default().with_axis(3, -1.0));
        let mut s = session(stick_forward, Vec::new());
        s.scene_mut().drain_events();
        for _ in 0..10 {
            let report = s.tick(TICK).unwrap();
            assert!(report.moved.is_some());
            assert_eq!(report.scene_events, 1);
        }
        assert!(s.scene().events().is_empty());
        let p = s.scene().world_position(s.avatar()).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -0.1), 1e-5), "{p:?}");
        let hand = s.controller(Handedness::Left).unwrap();
        assert!(s.scene().world_position(hand).unwrap().abs_diff_eq(p, 1e-5));
    }

    #[test]
    fn right_button_release_jumps_and_lands() {
        let a = slot(controls::BUTTON_A);
        let right = vec![
            DeviceFrame::default().with_button(a, 1.0),
            DeviceFrame::default().with_button(a, 0.0),
        ];
        let mut s = session(Vec::new(), right);
        s.tick(TICK).unwrap();
        let report = s.tick(TICK).unwrap();
        assert_eq!(report.jump_phase, JumpPhase::Ascending);

        let mut landed = false;
        for _ in 0..60 {
            if s.tick(TICK).unwrap().jump_phase == JumpPhase::Grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(s.scene().local(s.avatar()).unwrap().position.y, 0.0);
    }

    #[test]
    fn very_long_jump_phase_does_not_overflow() {
        let a = slot(controls::BUTTON_A);
        let mut config = InteractConfig::default();
        config.jump.ascent_millis = u64::MAX;
        let right = vec![
            DeviceFrame::default().with_button(a, 1.0),
            DeviceFrame::default().with_button(a, 0.0),
        ];
        let mut s = session_with(config, Vec::new(), right);
        s.tick(TICK).unwrap();
        assert_eq!(s.tick(TICK).unwrap().jump_phase, JumpPhase::Ascending);
        for _ in 0..10 {
            assert_eq!(s.tick(TICK).unwrap().jump_phase, JumpPhase::Ascending);
        }
    }

    #[test]
    fn grab_carry_and_release_a_box() {
        let squeeze = slot(controls::SQUEEZE);
        let mut right = vec![DeviceFrame::default()];
        right.extend(frames(5, |_| DeviceFrame::default().with_button(squeeze, 1.0)));
        right.push(DeviceFrame::default());
        let mut s = session(Vec::new(), right);

        let target = s.scene().find_by_name("box-1").unwrap();
        let hand = s.controller(Handedness::Right).unwrap();
        s.set_controller_pose(hand, Transform::from_position(Vec3::new(0.0, 1.0, -1.0)))
            .unwrap();

        s.tick(TICK).unwrap();
        let report = s.tick(TICK).unwrap();
        assert_eq!(
            report.grab_events,
            vec![GrabEvent::Acquired { controller: hand, object: target }]
        );

        // Carry half a metre to the right while squeezing.
        for i in 1..=4 {
            let x = 0.125 * i as f32;
            s.set_controller_pose(hand, Transform::from_position(Vec3::new(x, 1.0, -1.0)))
                .unwrap();
            s.tick(TICK).unwrap();
        }
        let report = s.tick(TICK).unwrap();
        assert!(matches!(report.grab_events[..], [GrabEvent::Released { .. }]));
        let p = s.scene().world_position(target).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.5, 1.0, -1.0), 1e-4), "{p:?}");
        assert_eq!(s.scene().get(target).unwrap().parent(), Some(s.scene().root()));
    }
}

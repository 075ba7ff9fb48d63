use roomscale_common::NodeId;
use roomscale_input::{InputSampler, InputSource};
use roomscale_scene::Scene;
use roomscale_tween::{TweenCompleted, TweenId, TweenProperty, TweenSpec, Tweener};

use crate::{InteractError, JumpConfig};

/// Where the avatar is in its hop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpPhase {
    #[default]
    Grounded,
    Ascending,
    Descending,
}

/// Per-avatar jump state machine: `Grounded → Ascending → Descending → Grounded`.
///
/// `is_jumping` is raised before any animation is scheduled and cleared only
/// when the descent tween's completion is consumed. If that completion never
/// arrives (the tween was cancelled elsewhere) the avatar stays airborne and
/// can no longer jump.
#[derive(Debug, Clone)]
pub struct JumpController {
    config: JumpConfig,
    is_jumping: bool,
    phase: JumpPhase,
    ground_y: f32,
    pending: Option<TweenId>,
}

impl JumpController {
    pub fn new(config: JumpConfig) -> Self {
        Self {
            config,
            is_jumping: false,
            phase: JumpPhase::Grounded,
            ground_y: 0.0,
            pending: None,
        }
    }

    pub fn config(&self) -> &JumpConfig {
        &self.config
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    /// Tween currently driving the avatar, if airborne.
    pub fn pending_tween(&self) -> Option<TweenId> {
        self.pending
    }

    /// Consume this tick's tween completions, then start a jump on a
    /// release edge of the jump button if grounded.
    pub fn update<S: InputSource>(
        &mut self,
        scene: &Scene,
        tweener: &mut Tweener,
        avatar: NodeId,
        input: &InputSampler<S>,
        completed: &[TweenCompleted],
    ) -> Result<JumpPhase, InteractError> {
        let finished = self
            .pending
            .is_some_and(|p| completed.iter().any(|c| c.id == p));
        if finished {
            self.advance_phase(scene, tweener, avatar)?;
        }

        if self.is_jumping {
            return Ok(self.phase);
        }

        if input.button_up(&self.config.button)? {
            self.start(scene, tweener, avatar)?;
        }
        Ok(self.phase)
    }

    fn start(
        &mut self,
        scene: &Scene,
        tweener: &mut Tweener,
        avatar: NodeId,
    ) -> Result<(), InteractError> {
        self.is_jumping = true;
        if let Err(e) = self.schedule_ascent(scene, tweener, avatar) {
            self.is_jumping = false;
            return Err(e);
        }
        self.phase = JumpPhase::Ascending;
        tracing::debug!(ground = self.ground_y, height = self.config.height, "jump started");
        Ok(())
    }

    fn schedule_ascent(
        &mut self,
        scene: &Scene,
        tweener: &mut Tweener,
        avatar: NodeId,
    ) -> Result<(), InteractError> {
        self.ground_y = scene.local(avatar)?.position.y;
        let spec = TweenSpec {
            to: self.ground_y + self.config.height,
            duration: self.config.ascent(),
            ease: self.config.ascent_ease,
        };
        self.pending = Some(tweener.animate(scene, avatar, TweenProperty::PositionY, spec)?);
        Ok(())
    }

    fn advance_phase(
        &mut self,
        scene: &Scene,
        tweener: &mut Tweener,
        avatar: NodeId,
    ) -> Result<(), InteractError> {
        match self.phase {
            JumpPhase::Ascending => {
                let spec = TweenSpec {
                    to: self.ground_y,
                    duration: self.config.descent(),
                    ease: self.config.descent_ease,
                };
                let id = tweener.animate(scene, avatar, TweenProperty::PositionY, spec)?;
                self.pending = Some(id);
                self.phase = JumpPhase::Descending;
                tracing::debug!("jump apex reached");
            }
            JumpPhase::Descending => {
                self.pending = None;
                self.phase = JumpPhase::Grounded;
                self.is_jumping = false;
                tracing::debug!("jump landed");
            }
            JumpPhase::Grounded => {
                self.pending = None;
            }
        }
        Ok(())
    }
}

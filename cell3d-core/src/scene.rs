/// Scene capability: one-time setup plus a per-frame hook
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Mesh;
use crate::pipeline::{FrameOutput, FrameTransforms, Pipeline, PipelineConfig};
use crate::projection::{Camera, Viewport};
use crate::transform::Transform;

/// Logical keys a scene can poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    LookUp,
    LookDown,
    Quit,
}

/// Polled keyboard state
pub trait KeyState {
    /// Whether `key` is held during the current frame
    fn is_held(&self, key: Key) -> bool;
}

impl KeyState for HashSet<Key> {
    fn is_held(&self, key: Key) -> bool {
        self.contains(&key)
    }
}

/// A renderable scene driven by the frame loop
pub trait Scene: Sized {
    type Setup;

    fn on_init(setup: Self::Setup) -> Result<Self>;

    /// Advance by `elapsed` seconds and produce the frame's triangles
    fn on_frame(&mut self, elapsed: f32, input: &dyn KeyState) -> Result<FrameOutput>;

    /// Adopt a new output size
    fn on_resize(&mut self, viewport: Viewport) -> Result<()>;
}

/// Motion parameters for [`SpinningMeshScene`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Distance from the origin along +z at which the mesh spins
    pub model_distance: f32,
    /// Radians per second about x (half that about z)
    pub spin_speed: f32,
    /// Camera units per second
    pub move_speed: f32,
    /// Camera radians per second
    pub turn_speed: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_distance: 8.0,
            spin_speed: 1.0,
            move_speed: 8.0,
            turn_speed: 2.0,
        }
    }
}

/// Everything [`SpinningMeshScene::on_init`] needs
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub mesh: Mesh,
    pub pipeline: PipelineConfig,
    pub scene: SceneConfig,
    pub viewport: Viewport,
}

/// A mesh tumbling in front of a free-look camera
#[derive(Debug, Clone)]
pub struct SpinningMeshScene {
    mesh: Mesh,
    pipeline: Pipeline,
    config: SceneConfig,
    camera: Camera,
    theta: f32,
}

impl SpinningMeshScene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    fn apply_input(&mut self, elapsed: f32, input: &dyn KeyState) {
        let step = self.config.move_speed * elapsed;
        let turn = self.config.turn_speed * elapsed;

        if input.is_held(Key::Up) {
            self.camera.position.y += step;
        }
        if input.is_held(Key::Down) {
            self.camera.position.y -= step;
        }
        if input.is_held(Key::Left) {
            self.camera.position.x -= step;
        }
        if input.is_held(Key::Right) {
            self.camera.position.x += step;
        }
        if input.is_held(Key::Forward) {
            self.camera.move_forward(step);
        }
        if input.is_held(Key::Back) {
            self.camera.move_forward(-step);
        }
        if input.is_held(Key::TurnLeft) {
            self.camera.turn(-turn, 0.0);
        }
        if input.is_held(Key::TurnRight) {
            self.camera.turn(turn, 0.0);
        }
        if input.is_held(Key::LookUp) {
            self.camera.turn(0.0, -turn);
        }
        if input.is_held(Key::LookDown) {
            self.camera.turn(0.0, turn);
        }
    }
}

impl Scene for SpinningMeshScene {
    type Setup = SceneSetup;

    fn on_init(setup: SceneSetup) -> Result<Self> {
        let pipeline = Pipeline::new(setup.pipeline, setup.viewport)?;
        log::info!(
            "Scene ready: {} triangles at distance {}",
            setup.mesh.len(),
            setup.scene.model_distance
        );

        Ok(Self {
            mesh: setup.mesh,
            pipeline,
            config: setup.scene,
            camera: Camera::default(),
            theta: 0.0,
        })
    }

    fn on_frame(&mut self, elapsed: f32, input: &dyn KeyState) -> Result<FrameOutput> {
        self.apply_input(elapsed, input);
        self.theta += self.config.spin_speed * elapsed;

        let world = Transform::compose(&[
            Transform::rotation_z(self.theta * 0.5),
            Transform::rotation_x(self.theta),
            Transform::translation(0.0, 0.0, self.config.model_distance),
        ]);
        let transforms = FrameTransforms {
            world,
            view: Some(self.camera.view_matrix()?),
            eye: self.camera.position,
        };

        Ok(self.pipeline.render(&self.mesh, &transforms))
    }

    fn on_resize(&mut self, viewport: Viewport) -> Result<()> {
        self.pipeline.resize(viewport)?;
        Ok(())
    }
}

use super::{ScenePools, build_into};
use crate::model::Scene;
use crate::rackmap::RoomGrid;
use rackwright_core::{AllocatedCpus, Diagnostics, LayoutConfig, RackSet, SlurmNodes};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLoopState {
    #[default]
    Idle,
    Running,
    Cancelled,
}

/// Render-loop bookkeeping. The loop never mutates the scene; it only hands it out to the
/// per-frame callback while running.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    state: FrameLoopState,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameLoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == FrameLoopState::Running
    }

    /// Frames rendered since the last start.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = FrameLoopState::Running;
        self.frames = 0;
        true
    }

    /// Runs one frame. Returns `false` without calling `render` unless the loop is running.
    pub fn tick<F: FnOnce(&Scene, u64)>(&mut self, scene: &Scene, render: F) -> bool {
        if !self.is_running() {
            return false;
        }
        render(scene, self.frames);
        self.frames += 1;
        true
    }

    /// Stops the loop. Safe to call any number of times, including before `start`.
    pub fn cancel(&mut self) {
        self.state = FrameLoopState::Cancelled;
    }
}

/// One 3D view: the scratch pools its scene is built into and the loop that renders it.
#[derive(Debug, Default)]
pub struct SceneSession {
    pools: ScenePools,
    built: bool,
    frame_loop: FrameLoop,
}

impl SceneSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the scene from scratch, reusing the pools' allocations.
    pub fn build(
        &mut self,
        grid: &RoomGrid,
        racks: &RackSet,
        slurm_nodes: Option<&SlurmNodes>,
        allocations: &AllocatedCpus,
        config: &LayoutConfig,
        diag: &mut Diagnostics,
    ) -> &Scene {
        build_into(
            &mut self.pools,
            grid,
            racks,
            slurm_nodes,
            allocations,
            config,
            diag,
        );
        self.built = true;
        self.pools.scene()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.built.then(|| self.pools.scene())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    /// Starts rendering. A session without a scene has nothing to render and stays idle.
    pub fn start(&mut self) -> bool {
        self.built && self.frame_loop.start()
    }

    pub fn tick<F: FnOnce(&Scene, u64)>(&mut self, render: F) -> bool {
        if !self.built {
            return false;
        }
        self.frame_loop.tick(self.pools.scene(), render)
    }

    pub fn cancel(&mut self) {
        self.frame_loop.cancel();
    }

    /// Stops rendering and releases every generated primitive. Idempotent.
    pub fn clean(&mut self) {
        self.frame_loop.cancel();
        if self.built {
            tracing::debug!("scene session cleaned");
        }
        self.pools.release();
        self.built = false;
    }
}

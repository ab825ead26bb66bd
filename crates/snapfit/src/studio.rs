//! One scene with its scheduler, assembly manager and camera director.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::join;
use snapfit_assembly::{
    AssembleOptions, AssemblyManager, AssemblyOutcome, DisassembleOptions, DisassemblyOutcome,
};
use snapfit_camera::{
    CameraDirector, CameraRig, CinematicOutcome, SequenceReport, SharedCamera,
};
use snapfit_config::ConfigStore;
use snapfit_motion::{drive_frames, MotionScheduler};
use snapfit_scene::{SceneDebugVisualizer, SceneGraph, SharedScene, SharedVisualizer};

use crate::error::Result;

/// Frame step used by [`ManualStudio::play`] callers without a render loop.
pub const DEFAULT_FRAME: Duration = Duration::from_millis(16);

/// Assembly playback and camera choreography over one scene.
///
/// Both services share one [`MotionScheduler`], so a part animation and a
/// camera move advance on the same [`tick`](Self::tick).
pub struct ManualStudio {
    scene: SharedScene,
    scheduler: MotionScheduler,
    visualizer: SharedVisualizer,
    assembly: AssemblyManager,
    director: CameraDirector,
}

impl ManualStudio {
    /// A studio over `scene` with a scene-backed debug visualizer and a
    /// default camera.
    pub fn new(scene: SceneGraph, configs: ConfigStore) -> Self {
        Self::with_parts(
            Rc::new(RefCell::new(scene)),
            Rc::new(configs),
            Rc::new(RefCell::new(SceneDebugVisualizer::new())),
            CameraRig::default().shared(),
        )
    }

    /// A studio over shared parts owned by the host.
    pub fn with_parts(
        scene: SharedScene,
        configs: Rc<ConfigStore>,
        visualizer: SharedVisualizer,
        camera: SharedCamera,
    ) -> Self {
        let scheduler = MotionScheduler::new();
        let assembly = AssemblyManager::new(scheduler.clone(), configs, visualizer.clone());
        let director = CameraDirector::new(scheduler.clone(), camera, visualizer.clone());
        assembly.initialize(scene.clone());
        director.initialize(scene.clone());
        Self {
            scene,
            scheduler,
            visualizer,
            assembly,
            director,
        }
    }

    /// The scene graph.
    pub fn scene(&self) -> SharedScene {
        self.scene.clone()
    }

    /// The shared scheduler.
    pub fn scheduler(&self) -> &MotionScheduler {
        &self.scheduler
    }

    /// The debug visualizer.
    pub fn visualizer(&self) -> SharedVisualizer {
        self.visualizer.clone()
    }

    /// The camera moved by the director.
    pub fn camera(&self) -> SharedCamera {
        self.director.camera()
    }

    /// The assembly manager.
    pub fn assembly(&self) -> &AssemblyManager {
        &self.assembly
    }

    /// The camera director.
    pub fn director(&self) -> &CameraDirector {
        &self.director
    }

    /// Move `plug` into `socket`.
    pub async fn assemble(&self, plug: &str, socket: &str, options: AssembleOptions) -> Result<AssemblyOutcome> {
        Ok(self.assembly.assemble(plug, socket, options).await?)
    }

    /// Move `plug` into `socket` while the camera focuses on `socket`.
    pub async fn assemble_with_focus(
        &self,
        plug: &str,
        socket: &str,
        options: AssembleOptions,
    ) -> Result<(AssemblyOutcome, CinematicOutcome)> {
        let (part, camera) = join(
            self.assembly.assemble(plug, socket, options),
            self.director.run_cinematic_focus(socket),
        )
        .await;
        Ok((part?, camera?))
    }

    /// Return an assembled part to where it was.
    pub async fn disassemble(&self, node: &str, options: DisassembleOptions) -> Result<DisassemblyOutcome> {
        Ok(self.assembly.disassemble(node, options).await?)
    }

    /// Progress of the latest part animation.
    pub fn get_progress(&self) -> f64 {
        self.assembly.get_progress()
    }

    /// True while a part or the camera is moving.
    pub fn is_playing(&self) -> bool {
        self.assembly.is_playing() || self.director.is_moving()
    }

    /// Align with and approach `node`.
    pub async fn run_cinematic_focus(&self, node: &str) -> Result<CinematicOutcome> {
        Ok(self.director.run_cinematic_focus(node).await?)
    }

    /// Focus each node in turn with the configured pause between moves.
    pub async fn run_disassembly_sequence(&self, nodes: &[&str]) -> Result<SequenceReport> {
        Ok(self.director.run_disassembly_sequence(nodes).await?)
    }

    /// Advance every running animation by `dt`. Call once per frame.
    pub fn tick(&self, dt: Duration) {
        self.scheduler.tick(dt);
    }

    /// Run `future` to completion without a render loop, ticking by `frame`.
    pub fn play<F: Future>(&self, frame: Duration, future: F) -> Result<F::Output> {
        Ok(drive_frames(&self.scheduler, frame, future)?)
    }

    /// Stop everything, remove highlights and unbind both services.
    pub fn dispose(&self) {
        self.assembly.dispose();
        self.director.dispose();
        let cancelled = self.scheduler.cancel_all();
        tracing::debug!("studio disposed, {cancelled} motions cancelled");
    }
}

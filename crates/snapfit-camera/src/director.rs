//! Multi-phase camera moves onto scene nodes.
//!
//! A focus move runs two chained phases on the shared camera:
//!
//! 1. Alignment: the eye moves in front of the target, along the target's
//!    front axis at a multiple of its depth, while the look-at point drifts
//!    toward the target center by a fixed fraction per tick.
//! 2. Approach: the eye moves to the distance at which the target's
//!    bounding diagonal fills the view, straight or along a Bezier arc, and
//!    the look-at point settles on the center.
//!
//! Every phase is keyed on the camera, so a new move cancels the previous
//! one instead of fighting it.

use std::cell::RefCell;
use std::time::Duration;

use snapfit_math::{lerp_point, quadratic_bezier, Point3, Vec3};
use snapfit_motion::{AnimateOptions, MotionOutcome, MotionScheduler, PropertyKey};
use snapfit_scene::{DebugPrimitive, DebugSession, NodeId, SharedScene, SharedVisualizer};

use crate::error::{CameraError, Result};
use crate::rig::SharedCamera;
use crate::settings::CinematicSettings;

const CAMERA_KEY: PropertyKey = PropertyKey::new("camera", 0);

/// Below this the target is treated as a point for framing.
const MIN_DIAGONAL: f64 = 1e-3;

/// Direction of one-shot framing moves, before normalization.
const FRAMING_DIRECTION: [f64; 3] = [0.5, 0.8, 1.0];

/// How a camera move ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CinematicOutcome {
    /// Every phase ran to the end.
    Completed,
    /// Another camera move took over.
    Cancelled,
    /// The node does not exist. The camera did not move.
    NodeNotFound(String),
}

/// Geometry of a focus move, computed from the scene before any motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPlan {
    /// Target node.
    pub node: NodeId,
    /// World-space center of the target's box.
    pub center: Point3,
    /// Diagonal of the target's box.
    pub diagonal: f64,
    /// Unit front axis of the target, world space.
    pub front: Vec3,
    /// Extent of the target's box along `front`.
    pub depth: f64,
    /// Eye position at the end of the alignment phase.
    pub align_position: Point3,
    /// Eye position at the end of the approach phase.
    pub final_position: Point3,
}

/// Options for [`CameraDirector::run_curved_focus`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveOptions {
    /// Bend direction of the arc. Defaults to the settings' direction.
    pub bend_direction: Option<Vec3>,
    /// Draw the sampled arc while the camera travels it.
    pub show_path: bool,
}

/// One finished step of [`CameraDirector::run_disassembly_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStep {
    /// Node name.
    pub node: String,
    /// How the focus move ended.
    pub outcome: CinematicOutcome,
    /// Scheduler time when the move started.
    pub started_at: Duration,
    /// Scheduler time when the move ended.
    pub finished_at: Duration,
}

/// Result of a disassembly sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceReport {
    /// Steps in execution order. Stops early after a cancelled step.
    pub steps: Vec<SequenceStep>,
}

impl SequenceReport {
    /// True if every requested node was focused.
    pub fn all_completed(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.outcome == CinematicOutcome::Completed)
    }
}

#[derive(Clone, Copy)]
enum Path {
    Line(Point3, Point3),
    Arc(Point3, Point3, Point3),
}

impl Path {
    fn at(&self, t: f64) -> Point3 {
        match *self {
            Path::Line(_, end) | Path::Arc(_, _, end) if t >= 1.0 => end,
            Path::Line(start, end) => lerp_point(&start, &end, t),
            Path::Arc(start, control, end) => quadratic_bezier(&start, &control, &end, t),
        }
    }
}

#[derive(Clone, Copy)]
enum LookAt {
    /// Close `factor` of the remaining distance each tick, optionally
    /// landing on the point when the phase ends.
    Drift { toward: Point3, factor: f64, settle: bool },
    /// Interpolate with the phase's eased progress.
    Track { from: Point3, to: Point3 },
}

/// Choreographs the shared camera around scene nodes.
pub struct CameraDirector {
    scheduler: MotionScheduler,
    camera: SharedCamera,
    visualizer: SharedVisualizer,
    settings: CinematicSettings,
    scene: RefCell<Option<SharedScene>>,
}

impl CameraDirector {
    /// A director with default settings.
    pub fn new(scheduler: MotionScheduler, camera: SharedCamera, visualizer: SharedVisualizer) -> Self {
        Self {
            scheduler,
            camera,
            visualizer,
            settings: CinematicSettings::default(),
            scene: RefCell::new(None),
        }
    }

    /// Replace the settings after validating them.
    pub fn with_settings(mut self, settings: CinematicSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    /// Current settings.
    pub fn settings(&self) -> &CinematicSettings {
        &self.settings
    }

    /// The camera this director moves.
    pub fn camera(&self) -> SharedCamera {
        self.camera.clone()
    }

    /// Bind to a scene.
    pub fn initialize(&self, scene: SharedScene) {
        *self.scene.borrow_mut() = Some(scene);
    }

    /// Stop the camera and unbind.
    pub fn dispose(&self) {
        self.cancel();
        *self.scene.borrow_mut() = None;
    }

    /// True between `initialize` and `dispose`.
    pub fn is_initialized(&self) -> bool {
        self.scene.borrow().is_some()
    }

    /// Stop the running camera move, if any, where it is.
    pub fn cancel(&self) -> bool {
        self.scheduler.cancel(CAMERA_KEY)
    }

    /// True while a camera move is running.
    pub fn is_moving(&self) -> bool {
        self.scheduler.is_animating(CAMERA_KEY)
    }

    fn scene(&self, operation: &'static str) -> Result<SharedScene> {
        self.scene
            .borrow()
            .clone()
            .ok_or(CameraError::NotInitialized(operation))
    }

    /// Compute the focus move onto `name` without moving the camera.
    pub fn plan_focus(&self, name: &str) -> Result<Option<FocusPlan>> {
        let scene = self.scene("plan_focus")?;
        let graph = scene.borrow();
        let Some(node) = graph.find_by_name(name) else {
            return Ok(None);
        };
        let bounds = graph.focus_bounding_box(node);
        let center = bounds.center();
        let diagonal = bounds.diagonal().max(MIN_DIAGONAL);

        let front = (graph.world_rotation(node) * self.settings.approach_direction)
            .try_normalize(1e-12)
            .unwrap_or_else(Vec3::z);
        let size = bounds.size();
        let depth = front.iter().zip(size.iter()).map(|(d, s)| d.abs() * s).sum::<f64>();
        // A target flat along its front axis still needs some standoff.
        let depth = if depth > 1e-9 { depth } else { diagonal };

        let distance = self.camera.borrow().fit_distance(diagonal, self.settings.zoom_ratio);
        Ok(Some(FocusPlan {
            node,
            center,
            diagonal,
            front,
            depth,
            align_position: center + front * (depth * self.settings.front_offset_factor),
            final_position: center + front * distance,
        }))
    }

    /// Align with and approach `name` along a straight line.
    pub async fn run_cinematic_focus(&self, name: &str) -> Result<CinematicOutcome> {
        self.scene("run_cinematic_focus")?;
        let Some(plan) = self.plan_focus(name)? else {
            tracing::warn!("cinematic focus: node {name} not found");
            return Ok(CinematicOutcome::NodeNotFound(name.to_string()));
        };
        tracing::info!("cinematic focus on {name}");
        if self.align(&plan).await == MotionOutcome::Cancelled {
            return Ok(CinematicOutcome::Cancelled);
        }
        let path = Path::Line(plan.align_position, plan.final_position);
        Ok(outcome(self.approach(&plan, path).await))
    }

    /// Align with `name`, then approach along a quadratic arc bent away
    /// from the straight line by a fraction of the target's diagonal.
    pub async fn run_curved_focus(&self, name: &str, options: CurveOptions) -> Result<CinematicOutcome> {
        let scene = self.scene("run_curved_focus")?;
        let Some(plan) = self.plan_focus(name)? else {
            tracing::warn!("curved focus: node {name} not found");
            return Ok(CinematicOutcome::NodeNotFound(name.to_string()));
        };
        tracing::info!("curved focus on {name}");
        if self.align(&plan).await == MotionOutcome::Cancelled {
            return Ok(CinematicOutcome::Cancelled);
        }

        let bend = options
            .bend_direction
            .and_then(|d| d.try_normalize(1e-12))
            .or_else(|| self.settings.curve_bend_direction.try_normalize(1e-12))
            .unwrap_or_else(|| -Vec3::y());
        let midpoint = lerp_point(&plan.align_position, &plan.final_position, 0.5);
        let control = midpoint + bend * (self.settings.curve_bend_factor * plan.diagonal);
        let path = Path::Arc(plan.align_position, control, plan.final_position);

        let _path_overlay = options.show_path.then(|| {
            let n = self.settings.debug_path_samples;
            let points = (0..=n).map(|i| path.at(i as f64 / n as f64)).collect();
            let mut session = DebugSession::begin(scene.clone(), self.visualizer.clone());
            session.add(
                "camera_path",
                DebugPrimitive::Polyline {
                    points,
                    color: 0xff8800,
                },
            );
            session
        });
        Ok(outcome(self.approach(&plan, path).await))
    }

    /// Frame `name` in a single move from a fixed diagonal direction, with
    /// a margin that grows for small targets.
    pub async fn frame_node(&self, name: &str) -> Result<CinematicOutcome> {
        self.scene("frame_node")?;
        let Some(plan) = self.plan_focus(name)? else {
            tracing::warn!("frame: node {name} not found");
            return Ok(CinematicOutcome::NodeNotFound(name.to_string()));
        };
        let zoom = CinematicSettings::adaptive_zoom(plan.diagonal);
        let (start, from, distance) = {
            let rig = self.camera.borrow();
            (rig.position, rig.target, rig.fit_distance(plan.diagonal, zoom))
        };
        let direction = Vec3::from(FRAMING_DIRECTION).normalize();
        let end = plan.center + direction * distance;
        let timing = AnimateOptions::new(self.settings.approach_duration)
            .with_easing(self.settings.align_easing);
        let look = LookAt::Track {
            from,
            to: plan.center,
        };
        Ok(outcome(self.run_phase(Path::Line(start, end), look, timing).await))
    }

    /// Focus each node in turn, pausing between moves.
    ///
    /// The pause is a fixed setting meant to stay in step with a parallel
    /// part animation; it is not derived from that animation. Missing
    /// nodes are recorded and skipped; a cancelled move ends the sequence.
    pub async fn run_disassembly_sequence(&self, names: &[&str]) -> Result<SequenceReport> {
        self.scene("run_disassembly_sequence")?;
        let mut report = SequenceReport::default();
        for (i, &name) in names.iter().enumerate() {
            if i > 0
                && self.scheduler.delay(self.settings.sequence_pause).await == MotionOutcome::Cancelled
            {
                break;
            }
            let started_at = self.scheduler.now();
            let outcome = self.run_cinematic_focus(name).await?;
            let cancelled = outcome == CinematicOutcome::Cancelled;
            report.steps.push(SequenceStep {
                node: name.to_string(),
                outcome,
                started_at,
                finished_at: self.scheduler.now(),
            });
            if cancelled {
                tracing::info!("disassembly sequence interrupted at {name}");
                break;
            }
        }
        Ok(report)
    }

    async fn align(&self, plan: &FocusPlan) -> MotionOutcome {
        let start = self.camera.borrow().position;
        let timing = AnimateOptions::new(self.settings.align_duration)
            .with_easing(self.settings.align_easing);
        let look = LookAt::Drift {
            toward: plan.center,
            factor: self.settings.align_look_lerp,
            settle: false,
        };
        self.run_phase(Path::Line(start, plan.align_position), look, timing).await
    }

    async fn approach(&self, plan: &FocusPlan, path: Path) -> MotionOutcome {
        let timing = AnimateOptions::new(self.settings.approach_duration)
            .with_easing(self.settings.approach_easing);
        let look = LookAt::Drift {
            toward: plan.center,
            factor: self.settings.approach_look_lerp,
            settle: true,
        };
        self.run_phase(path, look, timing).await
    }

    async fn run_phase(&self, path: Path, look: LookAt, timing: AnimateOptions) -> MotionOutcome {
        let camera = self.camera.clone();
        self.scheduler
            .animate_property(
                CAMERA_KEY,
                move |_, eased| {
                    let Ok(mut rig) = camera.try_borrow_mut() else {
                        tracing::error!("camera is borrowed during a motion tick");
                        return;
                    };
                    rig.position = path.at(eased);
                    rig.target = match look {
                        LookAt::Drift { toward, settle, .. } if settle && eased >= 1.0 => toward,
                        LookAt::Drift { toward, factor, .. } => lerp_point(&rig.target, &toward, factor),
                        LookAt::Track { to, .. } if eased >= 1.0 => to,
                        LookAt::Track { from, to } => lerp_point(&from, &to, eased),
                    };
                },
                timing,
            )
            .await
    }
}

fn outcome(motion: MotionOutcome) -> CinematicOutcome {
    match motion {
        MotionOutcome::Completed => CinematicOutcome::Completed,
        MotionOutcome::Cancelled => CinematicOutcome::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::CameraRig;
    use approx::assert_abs_diff_eq;
    use snapfit_math::Quat;
    use snapfit_motion::drive_frames;
    use snapfit_scene::{
        overlay_count, LocalTransform, MeshGeometry, SceneDebugVisualizer, SceneGraph, SceneNode,
    };
    use std::rc::Rc;
    use std::task::Poll;
    use tokio_test::{assert_pending, assert_ready};

    const FRAME: Duration = Duration::from_millis(16);

    fn cube(half: f64) -> MeshGeometry {
        MeshGeometry::cuboid(Point3::new(-half, -half, -half), Point3::new(half, half, half))
    }

    struct Fixture {
        scene: SharedScene,
        scheduler: MotionScheduler,
        camera: SharedCamera,
        director: CameraDirector,
    }

    fn fixture() -> Fixture {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .add_child(
                root,
                SceneNode::new("Door_Cover")
                    .with_geometry(cube(1.0))
                    .with_position(Vec3::new(5.0, 0.0, 0.0)),
            )
            .unwrap();
        graph
            .add_child(
                root,
                SceneNode::new("Lever_Part")
                    .with_geometry(cube(0.5))
                    .with_transform(LocalTransform {
                        position: Vec3::new(0.0, 2.0, 0.0),
                        rotation: Quat::from_axis_angle(&Vec3::y_axis(), std::f64::consts::FRAC_PI_2),
                        scale: Vec3::repeat(1.0),
                    }),
            )
            .unwrap();
        graph
            .add_child(root, SceneNode::new("Hinge_Assembly").with_geometry(cube(2.0)))
            .unwrap();

        let scene: SharedScene = Rc::new(RefCell::new(graph));
        let scheduler = MotionScheduler::new();
        let camera = CameraRig::default().shared();
        let visualizer: SharedVisualizer = Rc::new(RefCell::new(SceneDebugVisualizer::new()));
        let director = CameraDirector::new(scheduler.clone(), camera.clone(), visualizer);
        director.initialize(scene.clone());
        Fixture {
            scene,
            scheduler,
            camera,
            director,
        }
    }

    #[test]
    fn test_requires_initialize() {
        let director = CameraDirector::new(
            MotionScheduler::new(),
            CameraRig::default().shared(),
            Rc::new(RefCell::new(SceneDebugVisualizer::new())),
        );
        let result = tokio_test::block_on(director.run_cinematic_focus("Door_Cover"));
        assert_eq!(result, Err(CameraError::NotInitialized("run_cinematic_focus")));
        let result = tokio_test::block_on(director.run_disassembly_sequence(&["Door_Cover"]));
        assert_eq!(result, Err(CameraError::NotInitialized("run_disassembly_sequence")));
    }

    #[test]
    fn test_plan_geometry() {
        let f = fixture();
        let plan = f.director.plan_focus("Door_Cover").unwrap().unwrap();
        assert_abs_diff_eq!(plan.center, Point3::new(5.0, 0.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(plan.diagonal, 12f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(plan.front, Vec3::z(), epsilon = 1e-12);
        assert_abs_diff_eq!(plan.depth, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.align_position, Point3::new(5.0, 0.0, 6.0), epsilon = 1e-9);

        let distance = f.camera.borrow().fit_distance(12f64.sqrt(), 1.3);
        assert_abs_diff_eq!(plan.final_position, Point3::new(5.0, 0.0, distance), epsilon = 1e-9);
        assert!(f.director.plan_focus("Nope").unwrap().is_none());
    }

    #[test]
    fn test_front_axis_follows_node_rotation() {
        let f = fixture();
        let plan = f.director.plan_focus("Lever_Part").unwrap().unwrap();
        assert_abs_diff_eq!(plan.front, Vec3::x(), epsilon = 1e-9);
        assert_abs_diff_eq!(plan.align_position, Point3::new(3.0, 2.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_focus_ends_framed_on_target() {
        let f = fixture();
        let plan = f.director.plan_focus("Door_Cover").unwrap().unwrap();
        let outcome = drive_frames(&f.scheduler, FRAME, f.director.run_cinematic_focus("Door_Cover"))
            .unwrap()
            .unwrap();
        assert_eq!(outcome, CinematicOutcome::Completed);
        let rig = *f.camera.borrow();
        assert_eq!(rig.position, plan.final_position);
        assert_eq!(rig.target, plan.center);
        assert!(f.scheduler.now() >= Duration::from_millis(2500));
        assert!(!f.director.is_moving());
    }

    #[test]
    fn test_look_at_swings_gradually() {
        let f = fixture();
        let mut focus = tokio_test::task::spawn(f.director.run_cinematic_focus("Door_Cover"));
        assert_pending!(focus.poll());
        f.scheduler.tick(FRAME);
        // Default camera looks at the origin; the target center is 5 units away.
        assert_abs_diff_eq!(f.camera.borrow().target, Point3::new(0.25, 0.0, 0.0), epsilon = 1e-9);
        f.scheduler.tick(FRAME);
        assert_abs_diff_eq!(f.camera.borrow().target.x, 0.25 + 4.75 * 0.05, epsilon = 1e-9);
        assert_pending!(focus.poll());
    }

    #[test]
    fn test_missing_node_leaves_camera() {
        let f = fixture();
        let before = *f.camera.borrow();
        let outcome = tokio_test::block_on(f.director.run_cinematic_focus("Ghost"));
        assert_eq!(outcome, Ok(CinematicOutcome::NodeNotFound("Ghost".into())));
        assert_eq!(*f.camera.borrow(), before);
        assert_eq!(f.scheduler.now(), Duration::ZERO);
    }

    #[test]
    fn test_new_move_cancels_running_one() {
        let f = fixture();
        let mut first = tokio_test::task::spawn(f.director.run_cinematic_focus("Door_Cover"));
        assert_pending!(first.poll());
        f.scheduler.tick(FRAME);

        let second = drive_frames(&f.scheduler, FRAME, f.director.run_cinematic_focus("Hinge_Assembly"))
            .unwrap()
            .unwrap();
        assert_eq!(second, CinematicOutcome::Completed);
        assert_eq!(assert_ready!(first.poll()), Ok(CinematicOutcome::Cancelled));
        assert_eq!(f.camera.borrow().target, Point3::origin());
    }

    #[test]
    fn test_curved_approach_bends_and_cleans_up() {
        let f = fixture();
        let options = CurveOptions {
            show_path: true,
            ..CurveOptions::default()
        };
        let plan = f.director.plan_focus("Door_Cover").unwrap().unwrap();
        let mut focus = tokio_test::task::spawn(f.director.run_curved_focus("Door_Cover", options));
        assert_pending!(focus.poll());
        // Finish the alignment phase, then start the arc.
        let align_ticks = 1000 / 16 + 1;
        for _ in 0..align_ticks {
            f.scheduler.tick(FRAME);
        }
        assert_pending!(focus.poll());
        assert_eq!(overlay_count(&f.scene.borrow()), 1);

        for _ in 0..40 {
            f.scheduler.tick(FRAME);
        }
        // Both ends lie at y = 0; the arc dips below.
        assert!(f.camera.borrow().position.y < -1e-3);

        let outcome = loop {
            if let Poll::Ready(outcome) = focus.poll() {
                break outcome;
            }
            f.scheduler.tick(FRAME);
        };
        assert_eq!(outcome, Ok(CinematicOutcome::Completed));
        assert_eq!(f.camera.borrow().position, plan.final_position);
        assert_eq!(overlay_count(&f.scene.borrow()), 0);
    }

    #[test]
    fn test_frame_node_uses_adaptive_zoom() {
        let f = fixture();
        let outcome = drive_frames(&f.scheduler, FRAME, f.director.frame_node("Door_Cover"))
            .unwrap()
            .unwrap();
        assert_eq!(outcome, CinematicOutcome::Completed);
        let rig = *f.camera.borrow();
        let center = Point3::new(5.0, 0.0, 0.0);
        let expected = rig.fit_distance(12f64.sqrt(), 3.0);
        assert_eq!(rig.target, center);
        assert_abs_diff_eq!((rig.position - center).norm(), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(
            (rig.position - center).normalize(),
            Vec3::new(0.5, 0.8, 1.0).normalize(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_sequence_runs_in_order_with_pauses() {
        let f = fixture();
        let names = ["Door_Cover", "Lever_Part", "Hinge_Assembly"];
        let report = drive_frames(&f.scheduler, FRAME, f.director.run_disassembly_sequence(&names))
            .unwrap()
            .unwrap();
        let order: Vec<&str> = report.steps.iter().map(|s| s.node.as_str()).collect();
        assert_eq!(order, names);
        assert!(report.all_completed());
        for pair in report.steps.windows(2) {
            assert!(pair[1].started_at >= pair[0].finished_at + Duration::from_millis(500));
        }
        for step in &report.steps {
            assert!(step.finished_at - step.started_at >= Duration::from_millis(2500));
        }
        let hinge = f.director.plan_focus("Hinge_Assembly").unwrap().unwrap();
        assert_eq!(f.camera.borrow().position, hinge.final_position);
    }

    #[test]
    fn test_sequence_skips_missing_nodes() {
        let f = fixture();
        let report = drive_frames(
            &f.scheduler,
            FRAME,
            f.director.run_disassembly_sequence(&["Door_Cover", "Ghost", "Hinge_Assembly"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[1].outcome, CinematicOutcome::NodeNotFound("Ghost".into()));
        assert!(!report.all_completed());
        assert_eq!(report.steps[2].outcome, CinematicOutcome::Completed);
    }
}

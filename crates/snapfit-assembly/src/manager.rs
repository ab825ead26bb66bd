//! Animated assembly and disassembly of named parts.
//!
//! The manager is bound to one scene through [`AssemblyManager::initialize`]
//! and released with [`AssemblyManager::dispose`]. Every operation before
//! initialization fails with [`AssemblyError::NotInitialized`]; every other
//! problem (unknown node, unresolvable geometry) is an outcome, and the
//! scene is left untouched.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use snapfit_config::{AssemblyConfig, ConfigStore, GrooveDetection};
use snapfit_detect::{detect_facing_faces, detect_inner_groove_edges, inner_window};
use snapfit_math::{Point3, Vec3};
use snapfit_motion::{AnimateOptions, Easing, MotionOutcome, MotionScheduler, PropertyKey};
use snapfit_scene::{DebugPrimitive, DebugSession, NodeId, SharedScene, SharedVisualizer};

use crate::error::{AssemblyError, Result};
use crate::resolver::{AssemblyAttempt, AssemblyResolver};
use crate::strategy::StrategyTag;

/// Default assemble/disassemble duration.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(1500);

/// Default assemble/disassemble easing.
pub const DEFAULT_EASING: Easing = Easing::CubicInOut;

const POSITION: &str = "position";

/// Callback receiving eased progress in `[0, 1]`.
pub type ProgressFn = Rc<dyn Fn(f64)>;

/// Per-call options for [`AssemblyManager::assemble`].
#[derive(Clone, Default)]
pub struct AssembleOptions {
    /// Config key to look up. Without one only the geometric tiers run.
    pub config_key: Option<String>,
    /// Overrides the config's and the default duration.
    pub duration: Option<Duration>,
    /// Overrides the config's and the default easing.
    pub easing: Option<Easing>,
    /// Called on every frame with eased progress.
    pub on_progress: Option<ProgressFn>,
    /// Draw plug and hole markers while the part moves.
    pub debug: bool,
}

impl AssembleOptions {
    /// Options resolving through the config stored under `key`.
    pub fn with_config(key: impl Into<String>) -> Self {
        Self {
            config_key: Some(key.into()),
            ..Self::default()
        }
    }
}

/// Per-call options for [`AssemblyManager::disassemble`].
#[derive(Clone, Default)]
pub struct DisassembleOptions {
    /// Overrides the default duration.
    pub duration: Option<Duration>,
    /// Overrides the default easing.
    pub easing: Option<Easing>,
    /// Called on every frame with eased progress.
    pub on_progress: Option<ProgressFn>,
}

/// How an assemble call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyOutcome {
    /// The part reached its target.
    Completed {
        /// Tier that produced the target.
        strategy: StrategyTag,
        /// Final local position.
        target: Vec3,
    },
    /// Another motion on the same part took over.
    Cancelled,
    /// No tier could place the part. Nothing moved.
    Unresolved,
    /// A named node does not exist. Nothing moved.
    NodeNotFound(String),
}

/// How a disassemble call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DisassemblyOutcome {
    /// The part is back at its pre-assembly position.
    Completed,
    /// Another motion on the same part took over.
    Cancelled,
    /// The part was never assembled by this manager.
    NotAssembled,
    /// The node does not exist.
    NodeNotFound(String),
}

/// Decrements the in-flight counter however the owning future ends.
struct PlayingGuard(Rc<Cell<usize>>);

impl PlayingGuard {
    fn start(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter.clone())
    }
}

impl Drop for PlayingGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Moves parts into and out of their grooves.
pub struct AssemblyManager {
    scheduler: MotionScheduler,
    configs: Rc<ConfigStore>,
    resolver: AssemblyResolver,
    visualizer: SharedVisualizer,
    scene: RefCell<Option<SharedScene>>,
    /// Pre-assembly local positions of assembled parts.
    home: RefCell<HashMap<NodeId, Vec3>>,
    highlights: RefCell<Vec<NodeId>>,
    progress: Rc<Cell<f64>>,
    playing: Rc<Cell<usize>>,
}

impl AssemblyManager {
    /// A manager using the standard resolver tiers.
    pub fn new(scheduler: MotionScheduler, configs: Rc<ConfigStore>, visualizer: SharedVisualizer) -> Self {
        Self::with_resolver(scheduler, configs, visualizer, AssemblyResolver::standard())
    }

    /// A manager with a custom resolver.
    pub fn with_resolver(
        scheduler: MotionScheduler,
        configs: Rc<ConfigStore>,
        visualizer: SharedVisualizer,
        resolver: AssemblyResolver,
    ) -> Self {
        Self {
            scheduler,
            configs,
            resolver,
            visualizer,
            scene: RefCell::new(None),
            home: RefCell::new(HashMap::new()),
            highlights: RefCell::new(Vec::new()),
            progress: Rc::new(Cell::new(0.0)),
            playing: Rc::new(Cell::new(0)),
        }
    }

    /// Bind to a scene. Rebinding drops state recorded for the old one.
    pub fn initialize(&self, scene: SharedScene) {
        if self.scene.borrow().is_some() {
            self.dispose();
        }
        *self.scene.borrow_mut() = Some(scene);
        tracing::debug!("assembly manager initialized");
    }

    /// Cancel this manager's motions, remove its overlays and unbind.
    pub fn dispose(&self) {
        let homes: Vec<NodeId> = self.home.borrow_mut().drain().map(|(id, _)| id).collect();
        for id in homes {
            self.scheduler.cancel(position_key(id));
        }
        self.clear_highlights();
        *self.scene.borrow_mut() = None;
        self.progress.set(0.0);
    }

    /// True between `initialize` and `dispose`.
    pub fn is_initialized(&self) -> bool {
        self.scene.borrow().is_some()
    }

    fn scene(&self, operation: &'static str) -> Result<SharedScene> {
        self.scene
            .borrow()
            .clone()
            .ok_or(AssemblyError::NotInitialized(operation))
    }

    /// Progress of the latest motion, in `[0, 1]`.
    pub fn get_progress(&self) -> f64 {
        self.progress.get()
    }

    /// Set progress by hand, clamped to `[0, 1]`.
    pub fn update_progress(&self, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.progress.set(value);
    }

    /// True while an assemble or disassemble is running.
    pub fn is_playing(&self) -> bool {
        self.playing.get() > 0
    }

    /// The recorded pre-assembly position of a part, if assembled.
    pub fn home_position(&self, node: NodeId) -> Option<Vec3> {
        self.home.borrow().get(&node).copied()
    }

    /// Resolve a target for `plug` without moving anything.
    pub async fn resolve(&self, plug: &str, socket: &str, config_key: Option<&str>) -> Result<Option<AssemblyAttempt>> {
        let scene = self.scene("resolve")?;
        let config = self.load_config(config_key).await;
        let scene = scene.borrow();
        let (Some(plug), Some(socket)) = (scene.find_by_name(plug), scene.find_by_name(socket)) else {
            return Ok(None);
        };
        Ok(Some(self.resolver.resolve(&scene, plug, socket, config.as_deref())))
    }

    /// Move `plug` into `socket`.
    ///
    /// Resolves once the part is in place or the motion was superseded.
    pub async fn assemble(&self, plug: &str, socket: &str, options: AssembleOptions) -> Result<AssemblyOutcome> {
        let scene = self.scene("assemble")?;
        let config = self.load_config(options.config_key.as_deref()).await;

        let (plug_id, attempt, start) = {
            let graph = scene.borrow();
            let Some(plug_id) = graph.find_by_name(plug) else {
                tracing::warn!("assemble: node {plug} not found");
                return Ok(AssemblyOutcome::NodeNotFound(plug.to_string()));
            };
            let Some(socket_id) = graph.find_by_name(socket) else {
                tracing::warn!("assemble: node {socket} not found");
                return Ok(AssemblyOutcome::NodeNotFound(socket.to_string()));
            };
            let attempt = self.resolver.resolve(&graph, plug_id, socket_id, config.as_deref());
            let start = graph.local_position(plug_id).unwrap_or_else(Vec3::zeros);
            (plug_id, attempt, start)
        };

        let Some(target) = attempt.target() else {
            return Ok(AssemblyOutcome::Unresolved);
        };
        let strategy = attempt.strategy();
        let animation = config.as_ref().and_then(|c| c.animation.as_ref());
        let duration = match (options.duration, animation.and_then(|a| a.duration)) {
            (Some(duration), _) => duration,
            (None, Some(ms)) => duration_from_millis(ms)?,
            (None, None) => DEFAULT_DURATION,
        };
        self.home.borrow_mut().entry(plug_id).or_insert(start);

        let _debug = options.debug.then(|| self.debug_markers(&scene, &attempt));
        let easing = options
            .easing
            .or_else(|| animation.and_then(|a| a.easing.as_deref()).and_then(parse_easing))
            .unwrap_or(DEFAULT_EASING);

        let outcome = self
            .move_node(&scene, plug_id, start, target, AnimateOptions { duration, easing }, options.on_progress)
            .await;
        Ok(match outcome {
            MotionOutcome::Completed => AssemblyOutcome::Completed { strategy, target },
            MotionOutcome::Cancelled => AssemblyOutcome::Cancelled,
        })
    }

    /// Return an assembled part to its pre-assembly position.
    pub async fn disassemble(&self, node: &str, options: DisassembleOptions) -> Result<DisassemblyOutcome> {
        let scene = self.scene("disassemble")?;
        let found = {
            let graph = scene.borrow();
            graph
                .find_by_name(node)
                .map(|id| (id, graph.local_position(id).unwrap_or_else(Vec3::zeros)))
        };
        let Some((id, start)) = found else {
            tracing::warn!("disassemble: node {node} not found");
            return Ok(DisassemblyOutcome::NodeNotFound(node.to_string()));
        };
        let Some(home) = self.home_position(id) else {
            tracing::info!("disassemble: {node} is not assembled");
            return Ok(DisassemblyOutcome::NotAssembled);
        };

        let timing = AnimateOptions {
            duration: options.duration.unwrap_or(DEFAULT_DURATION),
            easing: options.easing.unwrap_or(DEFAULT_EASING),
        };
        match self.move_node(&scene, id, start, home, timing, options.on_progress).await {
            MotionOutcome::Completed => {
                self.home.borrow_mut().remove(&id);
                Ok(DisassemblyOutcome::Completed)
            }
            MotionOutcome::Cancelled => Ok(DisassemblyOutcome::Cancelled),
        }
    }

    async fn load_config(&self, key: Option<&str>) -> Option<Rc<AssemblyConfig>> {
        let key = key?;
        match self.configs.load(key).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring assembly config {key}: {e}");
                None
            }
        }
    }

    async fn move_node(
        &self,
        scene: &SharedScene,
        node: NodeId,
        from: Vec3,
        to: Vec3,
        timing: AnimateOptions,
        on_progress: Option<ProgressFn>,
    ) -> MotionOutcome {
        let _playing = PlayingGuard::start(&self.playing);
        let scene = scene.clone();
        let progress = self.progress.clone();
        progress.set(0.0);
        let handle = self.scheduler.animate_property(
            position_key(node),
            move |_, eased| {
                let position = if eased >= 1.0 { to } else { from.lerp(&to, eased) };
                match scene.try_borrow_mut() {
                    Ok(mut graph) => {
                        if let Err(e) = graph.set_local_position(node, position) {
                            tracing::warn!("cannot move node: {e}");
                        }
                    }
                    Err(_) => tracing::error!("scene is borrowed during a motion tick"),
                }
                progress.set(eased);
                if let Some(cb) = &on_progress {
                    cb(eased);
                }
            },
            timing,
        );
        handle.await
    }

    fn debug_markers(&self, scene: &SharedScene, attempt: &AssemblyAttempt) -> DebugSession {
        let mut session = DebugSession::begin(scene.clone(), self.visualizer.clone());
        for (i, p) in attempt.plug_candidates.iter().enumerate() {
            session.add(&format!("plug_candidate_{i}"), marker(*p, 0.03, 0xffaa00));
        }
        for (i, p) in attempt.hole_candidates.iter().enumerate() {
            session.add(&format!("hole_candidate_{i}"), marker(*p, 0.03, 0x00aaff));
        }
        if let Some(p) = attempt.plug_point {
            session.add("plug_point", marker(p, 0.06, 0xff0000));
        }
        if let Some(p) = attempt.hole_point {
            session.add("hole_point", marker(p, 0.06, 0x00ff00));
        }
        session
    }

    /// Outline the groove of a part: inner-bound feature edges, the full
    /// box, the inner window box and the center. Returns the number of
    /// overlays drawn (zero when the node has no geometry or is missing).
    pub fn highlight_groove(&self, node: &str, params: &GrooveDetection) -> Result<usize> {
        let scene = self.scene("highlight_groove")?;
        let primitives = {
            let graph = scene.borrow();
            let Some(id) = graph.find_by_name(node) else {
                tracing::warn!("highlight: node {node} not found");
                return Ok(0);
            };
            let Some(bounds) = graph.world_bounding_box(id) else {
                return Ok(0);
            };
            let edges = detect_inner_groove_edges(&graph, id, params.inner_bound_ratio, params.up_axis);
            let window = inner_window(&bounds, params.inner_bound_ratio, params.up_axis);
            let mut primitives = vec![
                (
                    "groove_bounds",
                    DebugPrimitive::Box {
                        bounds,
                        color: 0x00ff00,
                        opacity: 0.1,
                    },
                ),
                (
                    "groove_window",
                    DebugPrimitive::Box {
                        bounds: window,
                        color: 0xffff00,
                        opacity: 0.2,
                    },
                ),
                ("groove_center", marker(bounds.center(), 0.05, 0xff00ff)),
            ];
            if !edges.is_empty() {
                primitives.push((
                    "groove_edges",
                    DebugPrimitive::LineSegments {
                        segments: edges,
                        color: 0xff0000,
                    },
                ));
            }
            primitives
        };
        Ok(self.add_highlights(&scene, primitives))
    }

    /// Outline the faces of a part that face a camera looking along
    /// `view_direction`.
    pub fn highlight_facing_faces(&self, node: &str, view_direction: &Vec3) -> Result<usize> {
        let scene = self.scene("highlight_facing_faces")?;
        let faces = {
            let graph = scene.borrow();
            let Some(id) = graph.find_by_name(node) else {
                tracing::warn!("highlight: node {node} not found");
                return Ok(0);
            };
            detect_facing_faces(&graph, id, view_direction)
        };
        if faces.is_empty() {
            return Ok(0);
        }
        let segments = faces
            .iter()
            .flat_map(|[a, b, c]| [[*a, *b], [*b, *c], [*c, *a]])
            .collect();
        let outline = DebugPrimitive::LineSegments {
            segments,
            color: 0x00ffff,
        };
        Ok(self.add_highlights(&scene, vec![("facing_faces", outline)]))
    }

    fn add_highlights(&self, scene: &SharedScene, primitives: Vec<(&str, DebugPrimitive)>) -> usize {
        let mut graph = scene.borrow_mut();
        let mut vis = self.visualizer.borrow_mut();
        let mut highlights = self.highlights.borrow_mut();
        let before = highlights.len();
        for (label, primitive) in primitives {
            highlights.extend(vis.add_debug_mesh(&mut graph, label, primitive));
        }
        highlights.len() - before
    }

    /// Remove every highlight. Safe to call repeatedly.
    pub fn clear_highlights(&self) -> usize {
        let ids: Vec<NodeId> = self.highlights.borrow_mut().drain(..).collect();
        if ids.is_empty() {
            return 0;
        }
        let Some(scene) = self.scene.borrow().clone() else {
            return 0;
        };
        let mut graph = scene.borrow_mut();
        let mut vis = self.visualizer.borrow_mut();
        ids.into_iter().filter(|&id| vis.remove(&mut graph, id)).count()
    }
}

fn position_key(node: NodeId) -> PropertyKey {
    PropertyKey::new(POSITION, node.as_u64())
}

fn duration_from_millis(ms: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|e| AssemblyError::InvalidDuration(format!("{ms} ms: {e}")))
}

fn parse_easing(name: &str) -> Option<Easing> {
    let easing = Easing::from_name(name);
    if easing.is_none() {
        tracing::warn!("unknown easing {name}, using default");
    }
    easing
}

fn marker(position: Point3, radius: f64, color: u32) -> DebugPrimitive {
    DebugPrimitive::Marker {
        position,
        radius,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapfit_config::{AnimationParams, Insertion};
    use snapfit_motion::drive_frames;
    use snapfit_scene::{overlay_count, MeshGeometry, SceneDebugVisualizer, SceneGraph, SceneNode};
    use tokio_test::{assert_pending, assert_ready};

    const FRAME: Duration = Duration::from_millis(16);

    fn quad_z(cx: f64, cy: f64, half: f64) -> MeshGeometry {
        MeshGeometry::quad([
            Point3::new(cx - half, cy - half, 0.0),
            Point3::new(cx + half, cy - half, 0.0),
            Point3::new(cx + half, cy + half, 0.0),
            Point3::new(cx - half, cy + half, 0.0),
        ])
    }

    struct Fixture {
        scene: SharedScene,
        scheduler: MotionScheduler,
        manager: AssemblyManager,
        plug: NodeId,
    }

    fn fixture(configs: ConfigStore) -> Fixture {
        let mut graph = SceneGraph::new();
        let plug = graph
            .add_child(graph.root(), SceneNode::new("Plug").with_geometry(quad_z(0.0, 0.0, 0.25)))
            .unwrap();
        graph
            .add_child(graph.root(), SceneNode::new("Hole").with_geometry(quad_z(2.0, 0.0, 0.25)))
            .unwrap();
        graph.add_child(graph.root(), SceneNode::new("Ghost")).unwrap();
        graph.add_child(graph.root(), SceneNode::new("Void")).unwrap();

        let scene: SharedScene = Rc::new(RefCell::new(graph));
        let scheduler = MotionScheduler::new();
        let visualizer: SharedVisualizer = Rc::new(RefCell::new(SceneDebugVisualizer::new()));
        let manager = AssemblyManager::new(scheduler.clone(), Rc::new(configs), visualizer);
        manager.initialize(scene.clone());
        Fixture {
            scene,
            scheduler,
            manager,
            plug,
        }
    }

    impl Fixture {
        fn position(&self) -> Vec3 {
            self.scene.borrow().local_position(self.plug).unwrap()
        }
    }

    #[test]
    fn test_requires_initialize() {
        let manager = AssemblyManager::new(
            MotionScheduler::new(),
            Rc::new(ConfigStore::empty()),
            Rc::new(RefCell::new(SceneDebugVisualizer::new())),
        );
        let result = tokio_test::block_on(manager.assemble("Plug", "Hole", AssembleOptions::default()));
        assert_eq!(result, Err(AssemblyError::NotInitialized("assemble")));
        let result = tokio_test::block_on(manager.disassemble("Plug", DisassembleOptions::default()));
        assert_eq!(result, Err(AssemblyError::NotInitialized("disassemble")));
        assert!(manager.highlight_groove("Hole", &GrooveDetection::default()).is_err());
        assert_eq!(manager.clear_highlights(), 0);
    }

    #[test]
    fn test_assemble_moves_plug_exactly_onto_hole() {
        let f = fixture(ConfigStore::empty());
        let outcome = drive_frames(
            &f.scheduler,
            FRAME,
            f.manager.assemble("Plug", "Hole", AssembleOptions::default()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            outcome,
            AssemblyOutcome::Completed {
                strategy: StrategyTag::VertexAnalysis,
                target: Vec3::new(2.0, 0.0, 0.0),
            }
        );
        assert_eq!(f.position(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(f.manager.get_progress(), 1.0);
        assert!(!f.manager.is_playing());
        assert_eq!(f.manager.home_position(f.plug), Some(Vec3::zeros()));
        assert!(f.scheduler.now() >= DEFAULT_DURATION);
    }

    #[test]
    fn test_config_offset_and_timing() {
        let config = AssemblyConfig {
            insertion: Some(Insertion {
                offset: [0.0, 1.0, 0.0],
            }),
            animation: Some(AnimationParams {
                duration: Some(100.0),
                easing: Some("power1.out".into()),
            }),
            ..AssemblyConfig::default()
        };
        let f = fixture(ConfigStore::in_memory([("plug_into_hole", config)]));
        let outcome = drive_frames(
            &f.scheduler,
            FRAME,
            f.manager.assemble("Plug", "Hole", AssembleOptions::with_config("plug_into_hole")),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            outcome,
            AssemblyOutcome::Completed {
                strategy: StrategyTag::Metadata,
                target: Vec3::new(0.0, 1.0, 0.0),
            }
        );
        assert_eq!(f.position(), Vec3::new(0.0, 1.0, 0.0));
        assert!(f.scheduler.now() >= Duration::from_millis(100));
        assert!(f.scheduler.now() < Duration::from_millis(200));
    }

    #[test]
    fn test_out_of_range_config_duration_is_ignored() {
        let config = AssemblyConfig {
            animation: Some(AnimationParams {
                duration: Some(f64::INFINITY),
                easing: Some("power2147483647.out".into()),
            }),
            ..AssemblyConfig::default()
        };
        let f = fixture(ConfigStore::in_memory([("endless", config)]));
        let outcome = drive_frames(
            &f.scheduler,
            FRAME,
            f.manager.assemble("Plug", "Hole", AssembleOptions::with_config("endless")),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(outcome, AssemblyOutcome::Completed { .. }));
        assert_eq!(f.position(), Vec3::new(2.0, 0.0, 0.0));
        assert!(f.scheduler.now() >= DEFAULT_DURATION);
        assert!(f.scheduler.now() < DEFAULT_DURATION + Duration::from_millis(100));
    }

    #[test]
    fn test_duration_from_millis_rejects_unrepresentable() {
        assert_eq!(duration_from_millis(250.0), Ok(Duration::from_millis(250)));
        for ms in [f64::INFINITY, f64::NAN, 1e300, -1.0] {
            assert!(matches!(duration_from_millis(ms), Err(AssemblyError::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_missing_config_key_uses_geometry() {
        let f = fixture(ConfigStore::empty());
        let outcome = drive_frames(
            &f.scheduler,
            FRAME,
            f.manager.assemble("Plug", "Hole", AssembleOptions::with_config("nope")),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            outcome,
            AssemblyOutcome::Completed {
                strategy: StrategyTag::VertexAnalysis,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_nodes_and_unresolved_leave_scene_alone() {
        let f = fixture(ConfigStore::empty());
        let outcome = tokio_test::block_on(f.manager.assemble("Nope", "Hole", AssembleOptions::default()));
        assert_eq!(outcome, Ok(AssemblyOutcome::NodeNotFound("Nope".into())));
        let outcome = tokio_test::block_on(f.manager.assemble("Plug", "Nope", AssembleOptions::default()));
        assert_eq!(outcome, Ok(AssemblyOutcome::NodeNotFound("Nope".into())));

        let outcome = tokio_test::block_on(f.manager.assemble("Ghost", "Void", AssembleOptions::default()));
        assert_eq!(outcome, Ok(AssemblyOutcome::Unresolved));
        assert_eq!(f.position(), Vec3::zeros());
        assert_eq!(f.scheduler.active_count(), 0);
        assert_eq!(f.manager.home_position(f.plug), None);
    }

    #[test]
    fn test_disassemble_round_trip() {
        let f = fixture(ConfigStore::empty());
        let options = AssembleOptions {
            duration: Some(Duration::from_millis(200)),
            ..AssembleOptions::default()
        };
        drive_frames(&f.scheduler, FRAME, f.manager.assemble("Plug", "Hole", options))
            .unwrap()
            .unwrap();

        let back = DisassembleOptions {
            duration: Some(Duration::from_millis(200)),
            ..DisassembleOptions::default()
        };
        let outcome = drive_frames(&f.scheduler, FRAME, f.manager.disassemble("Plug", back.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(outcome, DisassemblyOutcome::Completed);
        assert_eq!(f.position(), Vec3::zeros());
        assert_eq!(f.manager.home_position(f.plug), None);

        let again = tokio_test::block_on(f.manager.disassemble("Plug", back));
        assert_eq!(again, Ok(DisassemblyOutcome::NotAssembled));
        let missing = tokio_test::block_on(f.manager.disassemble("Nope", DisassembleOptions::default()));
        assert_eq!(missing, Ok(DisassemblyOutcome::NodeNotFound("Nope".into())));
    }

    #[test]
    fn test_second_assemble_replaces_first() {
        let f = fixture(ConfigStore::empty());
        let mut first = tokio_test::task::spawn(f.manager.assemble("Plug", "Hole", AssembleOptions::default()));
        assert_pending!(first.poll());
        assert!(f.manager.is_playing());

        let second = drive_frames(
            &f.scheduler,
            FRAME,
            f.manager.assemble("Plug", "Hole", AssembleOptions::default()),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(second, AssemblyOutcome::Completed { .. }));
        assert_eq!(assert_ready!(first.poll()), Ok(AssemblyOutcome::Cancelled));
        assert!(!f.manager.is_playing());
        assert_eq!(f.position(), Vec3::new(2.0, 0.0, 0.0));
        // The home position is the one from before the first call.
        assert_eq!(f.manager.home_position(f.plug), Some(Vec3::zeros()));
    }

    #[test]
    fn test_progress_callback_is_monotonic() {
        let f = fixture(ConfigStore::empty());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let options = AssembleOptions {
            duration: Some(Duration::from_millis(300)),
            on_progress: Some(Rc::new(move |p| sink.borrow_mut().push(p))),
            ..AssembleOptions::default()
        };
        drive_frames(&f.scheduler, FRAME, f.manager.assemble("Plug", "Hole", options))
            .unwrap()
            .unwrap();
        let seen = seen.borrow();
        assert!(seen.len() > 2);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[test]
    fn test_debug_markers_are_removed_after_motion() {
        let f = fixture(ConfigStore::empty());
        let options = AssembleOptions {
            debug: true,
            duration: Some(Duration::from_millis(100)),
            ..AssembleOptions::default()
        };
        let mut running = tokio_test::task::spawn(f.manager.assemble("Plug", "Hole", options));
        assert_pending!(running.poll());
        assert!(overlay_count(&f.scene.borrow()) >= 2);
        while running.poll().is_pending() {
            f.scheduler.tick(FRAME);
        }
        assert_eq!(overlay_count(&f.scene.borrow()), 0);
    }

    #[test]
    fn test_highlights_are_tracked_and_cleared() {
        let f = fixture(ConfigStore::empty());
        let added = f
            .manager
            .highlight_groove("Hole", &GrooveDetection::default())
            .unwrap();
        assert_eq!(added, 3);
        let facing = f
            .manager
            .highlight_facing_faces("Hole", &Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(facing, 1);
        assert_eq!(overlay_count(&f.scene.borrow()), 4);

        assert_eq!(f.manager.highlight_groove("Nope", &GrooveDetection::default()), Ok(0));
        assert_eq!(f.manager.clear_highlights(), 4);
        assert_eq!(f.manager.clear_highlights(), 0);
        assert_eq!(overlay_count(&f.scene.borrow()), 0);
    }

    #[test]
    fn test_dispose_releases_scene() {
        let f = fixture(ConfigStore::empty());
        f.manager.highlight_groove("Hole", &GrooveDetection::default()).unwrap();
        f.manager.dispose();
        assert!(!f.manager.is_initialized());
        assert_eq!(overlay_count(&f.scene.borrow()), 0);
        let result = tokio_test::block_on(f.manager.assemble("Plug", "Hole", AssembleOptions::default()));
        assert_eq!(result, Err(AssemblyError::NotInitialized("assemble")));
    }

    #[test]
    fn test_update_progress_clamps() {
        let f = fixture(ConfigStore::empty());
        f.manager.update_progress(1.7);
        assert_eq!(f.manager.get_progress(), 1.0);
        f.manager.update_progress(-0.2);
        assert_eq!(f.manager.get_progress(), 0.0);
        f.manager.update_progress(0.4);
        assert_eq!(f.manager.get_progress(), 0.4);
    }
}

//! Tiered resolution of a plug's target position.

use snapfit_config::{AssemblyConfig, GrooveDetection};
use snapfit_math::{Point3, Vec3};
use snapfit_scene::{NodeId, SceneGraph};

use crate::strategy::{
    BoundingBoxStrategy, DetectionStrategy, MetadataStrategy, ResolveContext, StrategyTag,
    VertexAnalysisStrategy,
};

/// Terminal state of one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// A tier produced a local target for the plug.
    Resolved {
        /// The tier that succeeded.
        strategy: StrategyTag,
        /// Target local position.
        target: Vec3,
    },
    /// Every tier declined. The plug must stay where it is.
    Failed,
}

/// Result of resolving one plug/hole pair, with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyAttempt {
    /// Node that moves.
    pub plug: NodeId,
    /// Node that receives it.
    pub hole: NodeId,
    /// Outcome.
    pub resolution: Resolution,
    /// World position of the chosen plug feature.
    pub plug_point: Option<Point3>,
    /// World position of the chosen hole feature.
    pub hole_point: Option<Point3>,
    /// Plug candidates seen by the winning tier.
    pub plug_candidates: Vec<Point3>,
    /// Hole candidates seen by the winning tier.
    pub hole_candidates: Vec<Point3>,
}

impl AssemblyAttempt {
    /// The tier that resolved, or [`StrategyTag::None`].
    pub fn strategy(&self) -> StrategyTag {
        match self.resolution {
            Resolution::Resolved { strategy, .. } => strategy,
            Resolution::Failed => StrategyTag::None,
        }
    }

    /// The resolved local target.
    pub fn target(&self) -> Option<Vec3> {
        match self.resolution {
            Resolution::Resolved { target, .. } => Some(target),
            Resolution::Failed => None,
        }
    }
}

/// Runs detection strategies in priority order until one succeeds.
pub struct AssemblyResolver {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl AssemblyResolver {
    /// A resolver over an explicit strategy list, tried front to back.
    pub fn new(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Metadata, then vertex analysis, then the bounding-box fallback.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(MetadataStrategy),
            Box::new(VertexAnalysisStrategy),
            Box::new(BoundingBoxStrategy),
        ])
    }

    /// Append a strategy after the existing ones.
    pub fn with_strategy(mut self, strategy: impl DetectionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Tags of the configured strategies, in order.
    pub fn tiers(&self) -> Vec<StrategyTag> {
        self.strategies.iter().map(|s| s.tag()).collect()
    }

    /// Resolve where `plug` should go to enter `hole`. Never mutates the
    /// scene.
    pub fn resolve(
        &self,
        scene: &SceneGraph,
        plug: NodeId,
        hole: NodeId,
        config: Option<&AssemblyConfig>,
    ) -> AssemblyAttempt {
        let defaults = GrooveDetection::default();
        let cx = ResolveContext {
            scene,
            plug,
            hole,
            config,
            params: config.map_or(&defaults, |c| &c.groove_detection),
        };

        for strategy in &self.strategies {
            let tag = strategy.tag();
            let Some(out) = strategy.resolve(&cx) else {
                tracing::debug!("tier {tag} declined for {}", scene.name_of(plug));
                continue;
            };
            tracing::info!(
                "{} -> {}: resolved by {tag} at {:?}",
                scene.name_of(plug),
                scene.name_of(hole),
                out.target
            );
            return AssemblyAttempt {
                plug,
                hole,
                resolution: Resolution::Resolved {
                    strategy: tag,
                    target: out.target,
                },
                plug_point: out.plug_point,
                hole_point: out.hole_point,
                plug_candidates: out.plug_candidates,
                hole_candidates: out.hole_candidates,
            };
        }

        tracing::warn!(
            "no tier resolved {} -> {}",
            scene.name_of(plug),
            scene.name_of(hole)
        );
        AssemblyAttempt {
            plug,
            hole,
            resolution: Resolution::Failed,
            plug_point: None,
            hole_point: None,
            plug_candidates: Vec::new(),
            hole_candidates: Vec::new(),
        }
    }
}

impl Default for AssemblyResolver {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyOutput;
    use approx::assert_abs_diff_eq;
    use snapfit_config::Insertion;
    use snapfit_scene::{MeshGeometry, SceneNode};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Wraps a strategy and counts how often it runs.
    struct Counting<S> {
        inner: S,
        calls: Rc<Cell<usize>>,
    }

    impl<S: DetectionStrategy> DetectionStrategy for Counting<S> {
        fn tag(&self) -> StrategyTag {
            self.inner.tag()
        }

        fn resolve(&self, cx: &ResolveContext<'_>) -> Option<StrategyOutput> {
            self.calls.set(self.calls.get() + 1);
            self.inner.resolve(cx)
        }
    }

    fn counted_resolver() -> (AssemblyResolver, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let vertex = Rc::new(Cell::new(0));
        let bbox = Rc::new(Cell::new(0));
        let resolver = AssemblyResolver::new(vec![
            Box::new(MetadataStrategy),
            Box::new(Counting {
                inner: VertexAnalysisStrategy,
                calls: vertex.clone(),
            }),
            Box::new(Counting {
                inner: BoundingBoxStrategy,
                calls: bbox.clone(),
            }),
        ]);
        (resolver, vertex, bbox)
    }

    /// An open tube along Z: every face normal is perpendicular to Z, so
    /// the default +Z normal filter finds nothing.
    fn tube(center: Point3, radius: f64, length: f64, segments: u32) -> MeshGeometry {
        let mut positions = Vec::new();
        for ring in [-0.5, 0.5] {
            for i in 0..segments {
                let a = std::f64::consts::TAU * i as f64 / segments as f64;
                positions.extend([
                    (center.x + radius * a.cos()) as f32,
                    (center.y + radius * a.sin()) as f32,
                    (center.z + ring * length) as f32,
                ]);
            }
        }
        let mut indices = Vec::new();
        for i in 0..segments {
            let j = (i + 1) % segments;
            let (a, b, c, d) = (i, j, segments + j, segments + i);
            indices.extend([a, b, c, a, c, d]);
        }
        MeshGeometry::new(positions, Some(indices))
    }

    fn scene() -> (SceneGraph, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let plug = scene
            .add_child(
                scene.root(),
                SceneNode::new("Pin").with_geometry(MeshGeometry::cuboid(
                    Point3::new(-0.1, -0.1, -0.5),
                    Point3::new(0.1, 0.1, 0.0),
                )),
            )
            .unwrap();
        let hole = scene
            .add_child(
                scene.root(),
                SceneNode::new("Sleeve").with_geometry(tube(Point3::new(5.0, 0.0, 0.0), 1.0, 2.0, 16)),
            )
            .unwrap();
        (scene, plug, hole)
    }

    #[test]
    fn test_metadata_short_circuits_analysis() {
        let (scene, plug, hole) = scene();
        let (resolver, vertex, bbox) = counted_resolver();
        let config = AssemblyConfig {
            insertion: Some(Insertion {
                offset: [0.0, 0.0, 0.5],
            }),
            ..AssemblyConfig::default()
        };
        let attempt = resolver.resolve(&scene, plug, hole, Some(&config));
        assert_eq!(
            attempt.resolution,
            Resolution::Resolved {
                strategy: StrategyTag::Metadata,
                target: Vec3::new(0.0, 0.0, 0.5),
            }
        );
        assert_eq!(vertex.get(), 0);
        assert_eq!(bbox.get(), 0);
    }

    #[test]
    fn test_smooth_hole_falls_back_to_bbox() {
        let (scene, plug, hole) = scene();
        let (resolver, vertex, bbox) = counted_resolver();
        let attempt = resolver.resolve(&scene, plug, hole, None);
        assert_eq!(vertex.get(), 1);
        assert_eq!(bbox.get(), 1);
        assert_eq!(attempt.strategy(), StrategyTag::FallbackBbox);
        let target = attempt.target().unwrap();
        assert!(target.iter().all(|c| c.is_finite()));
        assert!(target.norm() > 1.0);
        // Sleeve box spans x in [4, 6]; the pin is to its left.
        assert_abs_diff_eq!(target.x, 4.0 + 0.3 * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_config_without_offset_uses_geometry() {
        let (scene, plug, hole) = scene();
        let resolver = AssemblyResolver::standard();
        let attempt = resolver.resolve(&scene, plug, hole, Some(&AssemblyConfig::default()));
        assert_ne!(attempt.strategy(), StrategyTag::Metadata);
    }

    #[test]
    fn test_all_tiers_fail_leaves_target_empty() {
        let mut scene = SceneGraph::new();
        let plug = scene.add_child(scene.root(), SceneNode::new("Ghost")).unwrap();
        let hole = scene.add_child(scene.root(), SceneNode::new("Void")).unwrap();
        let attempt = AssemblyResolver::standard().resolve(&scene, plug, hole, None);
        assert_eq!(attempt.resolution, Resolution::Failed);
        assert_eq!(attempt.strategy(), StrategyTag::None);
        assert!(attempt.target().is_none());
        assert_eq!(scene.local_position(plug), Some(Vec3::zeros()));
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(
            AssemblyResolver::standard().tiers(),
            vec![
                StrategyTag::Metadata,
                StrategyTag::VertexAnalysis,
                StrategyTag::FallbackBbox
            ]
        );
    }
}

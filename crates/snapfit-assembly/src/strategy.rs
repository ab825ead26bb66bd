//! Detection strategies, one per resolution tier.
//!
//! Each strategy either produces a local target position for the plug or
//! declines, in which case the resolver moves on to the next one.

use std::fmt;

use snapfit_config::{AssemblyConfig, GrooveDetection};
use snapfit_detect::{detect_holes, detect_plug_by_edge_analysis};
use snapfit_math::{Point3, Vec3};
use snapfit_scene::{NodeId, SceneGraph};

use crate::policy::{fallback_anchor, select_nearest_hole, select_primary_plug};

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyTag {
    /// Authored insertion offset.
    Metadata,
    /// Plug and hole clusters from mesh analysis.
    VertexAnalysis,
    /// Inset face of the hole's bounding box.
    FallbackBbox,
    /// Nothing resolved.
    None,
}

impl StrategyTag {
    /// Snake-case name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyTag::Metadata => "metadata",
            StrategyTag::VertexAnalysis => "vertex_analysis",
            StrategyTag::FallbackBbox => "fallback_bbox",
            StrategyTag::None => "none",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs shared by every strategy for one resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Scene being assembled.
    pub scene: &'a SceneGraph,
    /// Node that moves.
    pub plug: NodeId,
    /// Node that receives it.
    pub hole: NodeId,
    /// Authored config, if any.
    pub config: Option<&'a AssemblyConfig>,
    /// Detection parameters: the config's, or defaults.
    pub params: &'a GrooveDetection,
}

/// A successful strategy result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyOutput {
    /// Target local position of the plug.
    pub target: Vec3,
    /// World position of the chosen plug feature.
    pub plug_point: Option<Point3>,
    /// World position of the chosen hole feature.
    pub hole_point: Option<Point3>,
    /// Every plug candidate considered, in world space.
    pub plug_candidates: Vec<Point3>,
    /// Every hole candidate considered, in world space.
    pub hole_candidates: Vec<Point3>,
}

impl StrategyOutput {
    /// An output carrying only a target.
    pub fn target(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}

/// One way of finding where the plug goes.
pub trait DetectionStrategy {
    /// Tier this strategy reports as.
    fn tag(&self) -> StrategyTag;

    /// Local target for the plug, or `None` to defer to the next tier.
    fn resolve(&self, cx: &ResolveContext<'_>) -> Option<StrategyOutput>;
}

/// Trusts the config's insertion offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataStrategy;

impl DetectionStrategy for MetadataStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::Metadata
    }

    fn resolve(&self, cx: &ResolveContext<'_>) -> Option<StrategyOutput> {
        let offset = cx.config?.insertion_offset()?;
        Some(StrategyOutput::target(offset))
    }
}

/// Matches the primary plug cluster to the nearest hole cluster.
#[derive(Debug, Default, Clone, Copy)]
pub struct VertexAnalysisStrategy;

impl DetectionStrategy for VertexAnalysisStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::VertexAnalysis
    }

    fn resolve(&self, cx: &ResolveContext<'_>) -> Option<StrategyOutput> {
        let p = cx.params;
        let plugs = detect_plug_by_edge_analysis(
            cx.scene,
            cx.plug,
            &p.plug_search_direction(),
            p.edge_angle_threshold,
            p.plug_clustering_distance,
        );
        let holes = detect_holes(
            cx.scene,
            cx.hole,
            &p.normal_filter(),
            p.normal_tolerance,
            p.hole_clustering_distance,
        );
        tracing::debug!("{} plug clusters, {} hole clusters", plugs.len(), holes.len());

        let plug = select_primary_plug(&plugs, p.max_vertices_threshold, p.up_axis)?;
        let hole = select_nearest_hole(&holes, &plug.centroid, p.max_vertices_threshold)?;

        let world_delta = hole.centroid - plug.centroid;
        let parent_inverse = cx.scene.parent_world_transform(cx.plug).inverse()?;
        let current = cx.scene.local_position(cx.plug)?;
        Some(StrategyOutput {
            target: current + parent_inverse.apply_vec(&world_delta),
            plug_point: Some(plug.centroid),
            hole_point: Some(hole.centroid),
            plug_candidates: plugs.iter().map(|c| c.centroid).collect(),
            hole_candidates: holes.iter().map(|c| c.centroid).collect(),
        })
    }
}

/// Places the plug at the inset face of the hole's bounding box.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundingBoxStrategy;

impl DetectionStrategy for BoundingBoxStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::FallbackBbox
    }

    fn resolve(&self, cx: &ResolveContext<'_>) -> Option<StrategyOutput> {
        let hole_box = cx.scene.world_bounding_box(cx.hole)?;
        let plug_center = cx.scene.focus_bounding_box(cx.plug).center();
        let anchor = fallback_anchor(
            &hole_box,
            &plug_center,
            cx.params.inner_bound_ratio,
            cx.params.up_axis,
        );
        let parent_inverse = cx.scene.parent_world_transform(cx.plug).inverse()?;
        let target = parent_inverse.apply_point(&anchor).coords;
        target.iter().all(|c| c.is_finite()).then(|| StrategyOutput {
            target,
            plug_point: Some(plug_center),
            hole_point: Some(anchor),
            ..StrategyOutput::default()
        })
    }
}

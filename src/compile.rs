//! Frame compiler: turns an evaluated clip graph into an explicit render
//! plan of surfaces and passes for a backend to execute.

use crate::{
    assets::{AssetId, PreparedAsset, PreparedAssetStore},
    core::{Affine, BezPath, Canvas, Rgba8Premul},
    error::PlumageResult,
    eval::EvaluatedGraph,
    model::{RevealDir, Timeline},
};

/// Identifier of an offscreen surface within one plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

#[derive(Clone, Debug)]
pub struct SurfaceDesc {
    pub id: SurfaceId,
    pub width: u32,
    pub height: u32,
}

/// A single draw into a scene pass target. Transforms are full
/// canvas-space affines; colors are straight RGBA.
#[derive(Clone, Debug)]
pub enum DrawOp {
    FillPath {
        path: BezPath,
        transform: Affine,
        color: [u8; 4],
        opacity: f32,
    },
    Text {
        asset: AssetId,
        transform: Affine,
        opacity: f32,
    },
}

#[derive(Clone, Debug)]
pub struct ScenePass {
    pub target: SurfaceId,
    pub clear: Rgba8Premul,
    pub ops: Vec<DrawOp>,
}

/// Composite a source surface onto the pass target.
#[derive(Clone, Debug)]
pub enum CompositeOp {
    /// Premultiplied source-over.
    Over { src: SurfaceId },
    /// Directional wipe with a soft edge; `t` is coverage in `[0, 1]`.
    Reveal {
        src: SurfaceId,
        t: f32,
        dir: RevealDir,
        soft_edge: f32,
    },
}

#[derive(Clone, Debug)]
pub struct CompositePass {
    pub target: SurfaceId,
    pub ops: Vec<CompositeOp>,
}

#[derive(Clone, Debug)]
pub enum Pass {
    Scene(ScenePass),
    Composite(CompositePass),
}

/// Complete plan for one frame. Passes execute in order; the final
/// composited image lives in `final_surface`.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    pub surfaces: Vec<SurfaceDesc>,
    pub passes: Vec<Pass>,
    pub final_surface: SurfaceId,
}

/// Compile one evaluated frame into a render plan.
///
/// Each visible node draws into its own surface, then all node surfaces
/// composite back-to-front onto surface 0. Node opacity is folded into the
/// draw ops so the composite stage only handles coverage.
pub fn compile_frame(
    timeline: &Timeline,
    eval: &EvaluatedGraph,
    assets: &PreparedAssetStore,
) -> PlumageResult<RenderPlan> {
    let canvas = timeline.canvas;

    let mut surfaces = vec![SurfaceDesc {
        id: SurfaceId(0),
        width: canvas.width,
        height: canvas.height,
    }];
    let mut passes = Vec::new();
    let mut composite_ops = Vec::new();

    for node in &eval.nodes {
        if node.opacity <= 0.0 {
            continue;
        }
        let opacity = node.opacity.clamp(0.0, 1.0) as f32;

        let asset_id = assets.id_for_key(&node.asset)?;
        let ops = match assets.get(asset_id)? {
            PreparedAsset::Shape(shape) => {
                let mut ops = Vec::with_capacity(2);
                if let Some((path, color)) = &shape.fill {
                    ops.push(DrawOp::FillPath {
                        path: path.clone(),
                        transform: node.transform,
                        color: *color,
                        opacity,
                    });
                }
                if let Some((path, color)) = &shape.stroke {
                    ops.push(DrawOp::FillPath {
                        path: path.clone(),
                        transform: node.transform,
                        color: *color,
                        opacity,
                    });
                }
                ops
            }
            PreparedAsset::Text(text) => {
                // Layouts are top-left anchored; recenter on the node origin.
                let recenter = Affine::translate((
                    -0.5 * f64::from(text.width),
                    -0.5 * f64::from(text.height),
                ));
                vec![DrawOp::Text {
                    asset: asset_id,
                    transform: node.transform * recenter,
                    opacity,
                }]
            }
        };

        if ops.is_empty() {
            continue;
        }

        let surface = SurfaceId(surfaces.len() as u32);
        surfaces.push(SurfaceDesc {
            id: surface,
            width: canvas.width,
            height: canvas.height,
        });
        passes.push(Pass::Scene(ScenePass {
            target: surface,
            clear: Rgba8Premul::transparent(),
            ops,
        }));

        composite_ops.push(match &node.reveal {
            Some(r) => CompositeOp::Reveal {
                src: surface,
                t: r.progress as f32,
                dir: r.dir,
                soft_edge: r.soft_edge as f32,
            },
            None => CompositeOp::Over { src: surface },
        });
    }

    passes.push(Pass::Composite(CompositePass {
        target: SurfaceId(0),
        ops: composite_ops,
    }));

    Ok(RenderPlan {
        canvas,
        surfaces,
        passes,
        final_surface: SurfaceId(0),
    })
}

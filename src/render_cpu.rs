//! CPU render backend built on `vello_cpu` for vector and text
//! rasterization, with premultiplied compositing done on raw buffers.

use std::collections::HashMap;

use crate::{
    assets::{AssetId, PreparedAsset, PreparedAssetStore},
    compile::{CompositeOp, CompositePass, DrawOp, RenderPlan, ScenePass, SurfaceDesc, SurfaceId},
    composite_cpu,
    core::{Affine, BezPath},
    error::{PlumageError, PlumageResult},
    render::{FrameRGBA, PassBackend, RenderBackend, RenderSettings},
};

struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

pub struct CpuBackend {
    settings: RenderSettings,
    font_cache: HashMap<AssetId, vello_cpu::peniko::FontData>,
    surfaces: HashMap<SurfaceId, CpuSurface>,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            font_cache: HashMap::new(),
            surfaces: HashMap::new(),
        }
    }

    fn font_for_text_asset(
        &mut self,
        id: AssetId,
        assets: &PreparedAssetStore,
    ) -> PlumageResult<vello_cpu::peniko::FontData> {
        if let Some(font) = self.font_cache.get(&id) {
            return Ok(font.clone());
        }
        let PreparedAsset::Text(t) = assets.get(id)? else {
            return Err(PlumageError::evaluation("AssetId is not a PreparedText"));
        };
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(t.font_bytes.to_vec()),
            0,
        );
        self.font_cache.insert(id, font.clone());
        Ok(font)
    }
}

impl PassBackend for CpuBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> PlumageResult<()> {
        let width_u16: u16 = desc
            .width
            .try_into()
            .map_err(|_| PlumageError::evaluation("surface width exceeds u16"))?;
        let height_u16: u16 = desc
            .height
            .try_into()
            .map_err(|_| PlumageError::evaluation("surface height exceeds u16"))?;

        match self.surfaces.get_mut(&id) {
            Some(surface) if surface.width == width_u16 && surface.height == height_u16 => {}
            _ => {
                self.surfaces.insert(
                    id,
                    CpuSurface {
                        width: width_u16,
                        height: height_u16,
                        pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
                    },
                );
            }
        }

        if id == SurfaceId(0) {
            let premul = self
                .settings
                .clear_rgba
                .map(|[r, g, b, a]| premul_rgba8(r, g, b, a))
                .unwrap_or([0, 0, 0, 0]);
            let s = self
                .surfaces
                .get_mut(&SurfaceId(0))
                .ok_or_else(|| PlumageError::evaluation("surface 0 missing"))?;
            clear_pixmap(&mut s.pixmap, premul);
        }
        Ok(())
    }

    fn exec_scene(&mut self, pass: &ScenePass, assets: &PreparedAssetStore) -> PlumageResult<()> {
        let mut surface = self.surfaces.remove(&pass.target).ok_or_else(|| {
            PlumageError::evaluation(format!(
                "scene target surface {:?} was not initialized",
                pass.target
            ))
        })?;

        clear_pixmap(&mut surface.pixmap, [0, 0, 0, 0]);

        let mut ctx = vello_cpu::RenderContext::new(surface.width, surface.height);
        for op in &pass.ops {
            self.draw_op(&mut ctx, op, assets)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut surface.pixmap);
        self.surfaces.insert(pass.target, surface);
        Ok(())
    }

    fn exec_composite(
        &mut self,
        pass: &CompositePass,
        _assets: &PreparedAssetStore,
    ) -> PlumageResult<()> {
        let mut dst = self.surfaces.remove(&pass.target).ok_or_else(|| {
            PlumageError::evaluation(format!(
                "composite target surface {:?} was not initialized",
                pass.target
            ))
        })?;

        for op in &pass.ops {
            match *op {
                CompositeOp::Over { src } => {
                    let src = self.surfaces.get(&src).ok_or_else(|| {
                        PlumageError::evaluation(format!(
                            "composite src surface {src:?} was not initialized"
                        ))
                    })?;
                    composite_cpu::composite_over_in_place(
                        dst.pixmap.data_as_u8_slice_mut(),
                        src.pixmap.data_as_u8_slice(),
                    );
                }
                CompositeOp::Reveal {
                    src,
                    t,
                    dir,
                    soft_edge,
                } => {
                    let src = self.surfaces.get(&src).ok_or_else(|| {
                        PlumageError::evaluation(format!(
                            "composite src surface {src:?} was not initialized"
                        ))
                    })?;
                    composite_cpu::composite_reveal_in_place(
                        dst.pixmap.data_as_u8_slice_mut(),
                        src.pixmap.data_as_u8_slice(),
                        u32::from(dst.width),
                        u32::from(dst.height),
                        t,
                        dir,
                        soft_edge,
                    );
                }
            }
        }
        self.surfaces.insert(pass.target, dst);
        Ok(())
    }

    fn readback_rgba8(
        &mut self,
        surface: SurfaceId,
        plan: &RenderPlan,
        _assets: &PreparedAssetStore,
    ) -> PlumageResult<FrameRGBA> {
        let s = self.surfaces.get(&surface).ok_or_else(|| {
            PlumageError::evaluation(format!("readback surface {surface:?} was not initialized"))
        })?;
        let frame_data = s.pixmap.data_as_u8_slice().to_vec();
        let surface_cap = plan.surfaces.len() as u32;
        self.surfaces.retain(|id, _| id.0 < surface_cap);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: frame_data,
            premultiplied: true,
        })
    }
}

impl RenderBackend for CpuBackend {}

impl CpuBackend {
    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &DrawOp,
        assets: &PreparedAssetStore,
    ) -> PlumageResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::FillPath {
                path,
                transform,
                color,
                opacity,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color[0], color[1], color[2], color[3],
                ));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                let cpu_path = bezpath_to_cpu(path);
                ctx.fill_path(&cpu_path);
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
                Ok(())
            }
            DrawOp::Text {
                asset,
                transform,
                opacity,
            } => {
                let PreparedAsset::Text(t) = assets.get(*asset)? else {
                    return Err(PlumageError::evaluation("AssetId is not a PreparedText"));
                };
                let layout = t.layout.clone();

                let font = self.font_for_text_asset(*asset, assets)?;
                ctx.set_transform(affine_to_cpu(*transform));

                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }

                for line in layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };

                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));

                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }

                if *opacity < 1.0 {
                    ctx.pop_layer();
                }

                Ok(())
            }
        }
    }
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

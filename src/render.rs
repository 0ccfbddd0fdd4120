//! Backend-agnostic render plan execution.

use crate::{
    assets::PreparedAssetStore,
    compile::{CompositePass, Pass, RenderPlan, ScenePass, SurfaceDesc, SurfaceId},
    error::{PlumageError, PlumageResult},
};

/// A rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Settings shared by all render backends.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Straight RGBA clear color for the final surface; `None` clears to
    /// transparent.
    pub clear_rgba: Option<[u8; 4]>,
}

/// Surface-level operations a backend must provide to execute a plan.
pub trait PassBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> PlumageResult<()>;

    fn exec_scene(&mut self, pass: &ScenePass, assets: &PreparedAssetStore) -> PlumageResult<()>;

    fn exec_composite(
        &mut self,
        pass: &CompositePass,
        assets: &PreparedAssetStore,
    ) -> PlumageResult<()>;

    fn readback_rgba8(
        &mut self,
        surface: SurfaceId,
        plan: &RenderPlan,
        assets: &PreparedAssetStore,
    ) -> PlumageResult<FrameRGBA>;
}

/// A renderer that can execute a compiled [`RenderPlan`] into a [`FrameRGBA`].
///
/// Most users do not call [`RenderBackend::render_plan`] directly; prefer the
/// pipeline entry points, which handle evaluation and compilation.
pub trait RenderBackend: PassBackend {
    fn render_plan(
        &mut self,
        plan: &RenderPlan,
        assets: &PreparedAssetStore,
    ) -> PlumageResult<FrameRGBA> {
        execute_plan(self, plan, assets)
    }
}

pub fn execute_plan<B: PassBackend + ?Sized>(
    backend: &mut B,
    plan: &RenderPlan,
    assets: &PreparedAssetStore,
) -> PlumageResult<FrameRGBA> {
    for (idx, desc) in plan.surfaces.iter().enumerate() {
        let id = SurfaceId(
            idx.try_into()
                .map_err(|_| PlumageError::evaluation("surface id overflow"))?,
        );
        backend.ensure_surface(id, desc)?;
    }

    for pass in &plan.passes {
        match pass {
            Pass::Scene(p) => backend.exec_scene(p, assets)?,
            Pass::Composite(p) => backend.exec_composite(p, assets)?,
        }
    }

    backend.readback_rgba8(plan.final_surface, plan, assets)
}

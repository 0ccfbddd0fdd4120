//! One-shot entry points: evaluate + compile + render, frame by frame.

use tracing::{debug, info};

use crate::{
    assets::PreparedAssetStore,
    compile::compile_frame,
    core::{FrameIndex, FrameRange},
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    error::{PlumageError, PlumageResult},
    eval::Evaluator,
    model::Timeline,
    render::{FrameRGBA, RenderBackend, execute_plan},
};

/// Evaluate, compile, and render a single frame.
///
/// Returns a [`FrameRGBA`] containing premultiplied RGBA8 pixels.
pub fn render_frame(
    timeline: &Timeline,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> PlumageResult<FrameRGBA> {
    let eval = Evaluator::eval_frame(timeline, frame)?;
    let plan = compile_frame(timeline, &eval, assets)?;
    execute_plan(backend, &plan, assets)
}

/// Render a range of frames (inclusive start, exclusive end).
pub fn render_frames(
    timeline: &Timeline,
    range: FrameRange,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> PlumageResult<Vec<FrameRGBA>> {
    let mut out = Vec::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        out.push(render_frame(timeline, FrameIndex(f), backend, assets)?);
    }
    Ok(out)
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    pub range: FrameRange,
    pub overwrite: bool,
}

/// Render a frame range and stream it to an MP4 file via ffmpeg.
///
/// Frames are flattened over the timeline background color, so the output
/// is fully opaque. Requires integer fps.
pub fn render_to_mp4(
    timeline: &Timeline,
    out_path: impl Into<std::path::PathBuf>,
    opts: RenderToMp4Opts,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> PlumageResult<()> {
    timeline.validate()?;
    if opts.range.end.0 > timeline.duration.0 {
        return Err(PlumageError::validation(
            "render_to_mp4 range must be within timeline duration",
        ));
    }
    if opts.range.is_empty() {
        return Err(PlumageError::validation(
            "render_to_mp4 range must be non-empty",
        ));
    }
    if timeline.fps.den != 1 {
        return Err(PlumageError::validation(
            "render_to_mp4 requires integer fps (fps.den == 1)",
        ));
    }

    let out_path = out_path.into();
    let cfg = EncodeConfig {
        width: timeline.canvas.width,
        height: timeline.canvas.height,
        fps: timeline.fps.num,
        out_path: out_path.clone(),
        overwrite: opts.overwrite,
    };
    let mut encoder = FfmpegEncoder::new(cfg, timeline.background)?;

    let total = opts.range.len_frames();
    info!(
        frames = total,
        out = %out_path.display(),
        "encoding mp4"
    );
    for f in opts.range.start.0..opts.range.end.0 {
        let frame = render_frame(timeline, FrameIndex(f), backend, assets)?;
        encoder.encode_frame(&frame)?;
        if f % 30 == 0 {
            debug!(frame = f, total, "rendered");
        }
    }
    encoder.finish()?;
    info!(out = %out_path.display(), "mp4 written");
    Ok(())
}

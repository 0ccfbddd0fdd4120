use crate::{
    anim::SampleCtx,
    core::FrameIndex,
    error::{PlumageError, PlumageResult},
    model::{Clip, RevealDir, RevealSpec, Timeline},
};

/// All clips visible at one frame, resolved to drawable values and sorted in
/// paint order.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedGraph {
    pub frame: FrameIndex,
    pub nodes: Vec<EvaluatedClipNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedClipNode {
    pub clip_id: String,
    pub asset: String,
    pub z: i32,
    pub transform: kurbo::Affine,
    pub opacity: f64,
    pub reveal: Option<ResolvedReveal>,
}

/// A reveal in flight: `progress` runs 0..=1 across the reveal window.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct ResolvedReveal {
    pub progress: f64,
    pub dir: RevealDir,
    pub soft_edge: f32,
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(timeline))]
    pub fn eval_frame(timeline: &Timeline, frame: FrameIndex) -> PlumageResult<EvaluatedGraph> {
        timeline.validate()?;
        if frame.0 >= timeline.duration.0 {
            return Err(PlumageError::evaluation("frame is out of bounds"));
        }

        let mut nodes_with_key: Vec<((i32, usize, u64, String), EvaluatedClipNode)> = Vec::new();

        for (track_index, track) in timeline.tracks.iter().enumerate() {
            for clip in &track.clips {
                if !clip.range.contains(frame) {
                    continue;
                }

                let node = eval_clip(timeline, clip, frame, track.z_base)?;
                let sort_key = (
                    node.z,
                    track_index,
                    clip.range.start.0,
                    node.clip_id.clone(),
                );
                nodes_with_key.push((sort_key, node));
            }
        }

        nodes_with_key.sort_by(|a, b| a.0.cmp(&b.0));
        let nodes = nodes_with_key.into_iter().map(|(_, n)| n).collect();

        Ok(EvaluatedGraph { frame, nodes })
    }
}

fn eval_clip(
    timeline: &Timeline,
    clip: &Clip,
    frame: FrameIndex,
    track_z_base: i32,
) -> PlumageResult<EvaluatedClipNode> {
    let clip_local = FrameIndex(frame.0 - clip.range.start.0);
    let ctx = SampleCtx {
        frame,
        fps: timeline.fps,
        clip_local,
    };

    let opacity = clip.props.opacity.sample(ctx)?.clamp(0.0, 1.0);
    let transform = clip.props.transform.sample(ctx)?.to_affine();

    Ok(EvaluatedClipNode {
        clip_id: clip.id.clone(),
        asset: clip.asset.clone(),
        z: track_z_base + clip.z_offset,
        transform,
        opacity,
        reveal: resolve_reveal(clip, frame),
    })
}

/// Resolve reveal progress for the window starting at the clip's first frame.
/// Returns `None` outside the window; once the window has passed the clip is
/// fully shown.
fn resolve_reveal(clip: &Clip, frame: FrameIndex) -> Option<ResolvedReveal> {
    let spec: &RevealSpec = clip.reveal.as_ref()?;
    if spec.duration_frames == 0 {
        return None;
    }

    let clip_len = clip.range.len_frames();
    if clip_len == 0 {
        return None;
    }
    let dur = spec.duration_frames.min(clip_len);

    let window_start = clip.range.start.0;
    let window_end_excl = window_start.saturating_add(dur);
    if !(window_start <= frame.0 && frame.0 < window_end_excl) {
        return None;
    }

    // denom = dur-1 so the last in-window frame resolves to exactly 1.0.
    let denom = dur.saturating_sub(1);
    let t = if denom == 0 {
        1.0
    } else {
        let offset = frame.0 - window_start;
        (offset as f64) / (denom as f64)
    };
    let progress = spec.ease.apply(t).clamp(0.0, 1.0);

    Some(ResolvedReveal {
        progress,
        dir: spec.dir,
        soft_edge: spec.soft_edge,
    })
}

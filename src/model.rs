use std::collections::BTreeMap;

use crate::{
    anim::Anim,
    core::{Canvas, Fps, FrameIndex, FrameRange, Transform2D},
    ease::Ease,
    error::{PlumageError, PlumageResult},
    shape::{ShapeKind, ShapeStyle},
};

/// Frame-accurate internal form of a scene: keyframed clips on z-ordered
/// tracks. Produced by [`Scene::lower`](crate::scene::Scene::lower); the
/// evaluator and frame compiler only ever see this model.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    pub fps: Fps,
    pub canvas: Canvas,
    /// Straight RGBA background the final frame is cleared to.
    pub background: [u8; 4],
    pub duration: FrameIndex, // total frames
    pub assets: BTreeMap<String, Asset>, // stable keys
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub name: String,
    pub z_base: i32,
    pub clips: Vec<Clip>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub id: String,
    pub asset: String,     // key into Timeline.assets
    pub range: FrameRange, // timeline placement [start,end)
    pub props: ClipProps,
    pub z_offset: i32,
    /// Directional reveal anchored at clip start (the `Write` action).
    pub reveal: Option<RevealSpec>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ClipProps {
    pub transform: Anim<Transform2D>,
    pub opacity: Anim<f64>, // 0..1 clamped in eval
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Asset {
    Shape(ShapeAsset),
    Text(TextAsset),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeAsset {
    pub kind: ShapeKind,
    pub style: ShapeStyle,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextAsset {
    pub text: String,
    /// Font file path relative to the assets root.
    pub font_source: String,
    pub size_px: f32,
    pub max_width_px: Option<f32>,
    pub color_rgba8: [u8; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RevealDir {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct RevealSpec {
    pub duration_frames: u64,
    pub ease: Ease,
    pub dir: RevealDir,
    /// Soft edge width as a fraction of the reveal axis; clamped to [0,1].
    pub soft_edge: f32,
}

impl RevealSpec {
    pub fn validate(&self) -> PlumageResult<()> {
        if self.duration_frames == 0 {
            return Err(PlumageError::validation(
                "reveal duration_frames must be > 0",
            ));
        }
        if !self.soft_edge.is_finite() || !(0.0..=1.0).contains(&self.soft_edge) {
            return Err(PlumageError::validation(
                "reveal soft_edge must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

impl Timeline {
    pub fn validate(&self) -> PlumageResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(PlumageError::validation("fps must have num>0 and den>0"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(PlumageError::validation("canvas width/height must be > 0"));
        }
        if self.duration.0 == 0 {
            return Err(PlumageError::validation("duration must be > 0 frames"));
        }

        for (key, asset) in &self.assets {
            match asset {
                Asset::Shape(a) => {
                    a.kind.validate()?;
                    a.style.validate()?;
                }
                Asset::Text(a) => {
                    if a.text.is_empty() {
                        return Err(PlumageError::validation(format!(
                            "text asset '{key}' has empty text"
                        )));
                    }
                    if !a.size_px.is_finite() || a.size_px <= 0.0 {
                        return Err(PlumageError::validation(format!(
                            "text asset '{key}' size_px must be finite and > 0"
                        )));
                    }
                }
            }
        }

        for track in &self.tracks {
            for clip in &track.clips {
                if !self.assets.contains_key(&clip.asset) {
                    return Err(PlumageError::validation(format!(
                        "clip '{}' references missing asset key '{}'",
                        clip.id, clip.asset
                    )));
                }
                if clip.range.start.0 > clip.range.end.0 {
                    return Err(PlumageError::validation(format!(
                        "clip '{}' has invalid range (start > end)",
                        clip.id
                    )));
                }
                if clip.range.end.0 > self.duration.0 {
                    return Err(PlumageError::validation(format!(
                        "clip '{}' range exceeds timeline duration",
                        clip.id
                    )));
                }

                clip.props.opacity.validate()?;
                clip.props.transform.validate()?;

                if let Some(reveal) = &clip.reveal {
                    reveal.validate()?;
                }
            }
        }

        Ok(())
    }
}

use crate::{
    core::{FrameIndex, Transform2D, Vec2},
    ease::Ease,
    error::{PlumageError, PlumageResult},
};

#[derive(Clone, Copy, Debug)]
pub struct SampleCtx {
    pub frame: FrameIndex,      // global frame
    pub fps: crate::core::Fps,  // global fps
    pub clip_local: FrameIndex, // frame - clip.start
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        (*a as f64 + ((*b as f64 - *a as f64) * t)) as f32
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Transform2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            rotation_rad: a.rotation_rad + (b.rotation_rad - a.rotation_rad) * t,
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            anchor: <Vec2 as Lerp>::lerp(&a.anchor, &b.anchor, t),
        }
    }
}

impl Lerp for crate::core::Rgba8Premul {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

/// Keyframed animated value sampled in clip-local frames.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Anim<T> {
    pub keys: Vec<Keyframe<T>>, // sorted by frame
    pub mode: InterpMode,       // linear/hold
    pub default: Option<T>,     // value when no keys exist
}

impl<T> Anim<T>
where
    T: Lerp + Clone,
{
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                frame: FrameIndex(0),
                value,
                ease: Ease::Linear,
            }],
            mode: InterpMode::Hold,
            default: None,
        }
    }

    pub fn validate(&self) -> PlumageResult<()> {
        if self.keys.is_empty() && self.default.is_none() {
            return Err(PlumageError::animation(
                "Anim must have at least one key or a default value",
            ));
        }
        if !self.keys.windows(2).all(|w| w[0].frame.0 <= w[1].frame.0) {
            return Err(PlumageError::animation("Anim keys must be sorted by frame"));
        }
        Ok(())
    }

    pub fn sample(&self, ctx: SampleCtx) -> PlumageResult<T> {
        if self.keys.is_empty() {
            return self
                .default
                .clone()
                .ok_or_else(|| PlumageError::animation("Anim has no keys and no default"));
        }

        let f = ctx.clip_local.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);

        if idx == 0 {
            return Ok(self.keys[0].value.clone());
        }
        if idx >= self.keys.len() {
            return Ok(self.keys[self.keys.len() - 1].value.clone());
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 {
            return Ok(a.value.clone());
        }

        let t = ((f - a.frame.0) as f64) / (denom as f64);
        let te = a.ease.apply(t);
        match self.mode {
            InterpMode::Hold => Ok(a.value.clone()),
            InterpMode::Linear => Ok(T::lerp(&a.value, &b.value, te)),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    pub frame: FrameIndex,
    pub value: T,
    pub ease: Ease, // ease applied toward next key
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum InterpMode {
    Hold,
    Linear,
}

/// Append-only keyframe builder used by scene lowering.
///
/// Frames are clip-local and must be appended in non-decreasing order. A key
/// appended at the frame of the last key replaces it, which is how several
/// actions landing on the same beat boundary merge into a single key.
#[derive(Clone, Debug)]
pub struct KeyTrack<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Clone> KeyTrack<T> {
    pub fn new(frame: FrameIndex, value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                frame,
                value,
                ease: Ease::Linear,
            }],
        }
    }

    pub fn current(&self) -> &T {
        // Construction guarantees at least one key.
        &self.keys[self.keys.len() - 1].value
    }

    fn last_frame(&self) -> FrameIndex {
        self.keys[self.keys.len() - 1].frame
    }

    /// Pin the current value at `frame`, easing toward whatever comes next.
    pub fn hold_until(&mut self, frame: FrameIndex, ease: Ease) -> PlumageResult<()> {
        let value = self.current().clone();
        self.push_with_ease(frame, value, ease)
    }

    /// Append a key at `frame`; the new key's outgoing ease is linear until a
    /// later `hold_until`/`push_with_ease` changes it.
    pub fn push(&mut self, frame: FrameIndex, value: T) -> PlumageResult<()> {
        self.push_with_ease(frame, value, Ease::Linear)
    }

    pub fn push_with_ease(&mut self, frame: FrameIndex, value: T, ease: Ease) -> PlumageResult<()> {
        if frame.0 < self.last_frame().0 {
            return Err(PlumageError::animation(
                "KeyTrack keys must be appended in frame order",
            ));
        }
        if frame.0 == self.last_frame().0 {
            let last = self.keys.len() - 1;
            self.keys[last].value = value;
            self.keys[last].ease = ease;
            return Ok(());
        }
        self.keys.push(Keyframe { frame, value, ease });
        Ok(())
    }

    pub fn into_anim(self) -> Anim<T> {
        Anim {
            keys: self.keys,
            mode: InterpMode::Linear,
            default: None,
        }
    }
}

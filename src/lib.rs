//! Plumage renders short declarative animation scenes to pixels.
//!
//! A [`Scene`] is pure configuration: vector shape actors, optional groups,
//! and a fixed timeline of beats (fade, write, shift, rotate, wait). Lowering
//! produces a frame-accurate [`Timeline`] of keyframed clips, which the
//! evaluator, frame compiler, and CPU backend turn into premultiplied RGBA
//! frames. Frames can be saved as PNG or streamed to the system `ffmpeg` for
//! MP4 output.
#![forbid(unsafe_code)]

pub mod anim;
pub mod assets;
pub mod compile;
pub mod composite_cpu;
pub mod core;
pub mod ease;
pub mod encode_ffmpeg;
pub mod error;
pub mod eval;
pub mod mascot;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod render_cpu;
pub mod scene;
pub mod shape;

pub use anim::{Anim, KeyTrack};
pub use assets::{AssetId, PreparedAsset, PreparedAssetStore};
pub use crate::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8Premul, Transform2D, Vec2};
pub use ease::Ease;
pub use error::{PlumageError, PlumageResult};
pub use eval::{EvaluatedGraph, Evaluator};
pub use model::{Asset, Clip, RevealDir, RevealSpec, Timeline, Track};
pub use pipeline::{RenderToMp4Opts, render_frame, render_frames, render_to_mp4};
pub use render::{FrameRGBA, RenderBackend, RenderSettings};
pub use render_cpu::CpuBackend;
pub use scene::{Action, ActionKind, Actor, Beat, Element, Group, Placement, Scene, SceneBuilder};
pub use shape::{ShapeKind, ShapeStyle, StrokeStyle};

//! Declarative scene layer: actors, groups, and a beat timeline.
//!
//! A [`Scene`] is pure configuration. Nothing here touches pixels;
//! [`Scene::lower`] converts the beat timeline into the keyframed clip
//! [`Timeline`] the evaluator and renderer consume.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::warn;

use crate::{
    core::{Canvas, Fps, FrameIndex, FrameRange, Transform2D, Vec2},
    ease::Ease,
    error::{PlumageError, PlumageResult},
    model::{
        Asset, Clip, ClipProps, RevealDir, RevealSpec, ShapeAsset, TextAsset, Timeline, Track,
    },
    shape::{ShapeKind, ShapeStyle},
};

/// Soft-edge width of a `Write` reveal, as a fraction of the swept axis.
const WRITE_SOFT_EDGE: f32 = 0.12;

/// What an actor draws: one primitive shape or one block of text.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Element {
    Shape {
        kind: ShapeKind,
        style: ShapeStyle,
    },
    Text {
        content: String,
        font_source: String,
        size_px: f32,
        color: [u8; 4],
        max_width_px: Option<f32>,
    },
}

/// Static placement baked into an actor's base transform at lowering time.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub offset: Vec2,
    pub rotation_rad: f64,
    pub scale: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: 1.0,
        }
    }
}

impl Placement {
    pub fn at(offset: Vec2) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn rotated(mut self, rotation_rad: f64) -> Self {
        self.rotation_rad = rotation_rad;
        self
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    fn base_transform(self) -> Transform2D {
        Transform2D {
            translate: self.offset,
            rotation_rad: self.rotation_rad,
            scale: Vec2::new(self.scale, self.scale),
            anchor: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub id: String,
    pub element: Element,
    pub placement: Placement,
}

/// Named set of actors that move as one unit. Group shifts apply to every
/// member; group rotations pivot about the mean member offset.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Group {
    pub id: String,
    pub members: Vec<String>,
}

/// One step of the scene timeline. Beats run strictly one after another;
/// the actions inside a beat run in parallel over the beat's span. A beat
/// with no actions is a wait.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Beat {
    pub duration_secs: f64,
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Action {
    /// Actor id or group id.
    pub target: String,
    pub kind: ActionKind,
    pub ease: Ease,
}

impl Action {
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum ActionKind {
    /// Fade opacity 0 to 1 while sliding in along `shift` (the actor starts
    /// displaced by `-shift` and lands on its placement).
    FadeIn { shift: Vec2 },
    FadeOut,
    /// Left-to-right reveal; text targets only.
    Write,
    Shift { by: Vec2 },
    Rotate { by_rad: f64 },
}

pub fn fade_in(target: impl Into<String>, shift: Vec2) -> Action {
    Action {
        target: target.into(),
        kind: ActionKind::FadeIn { shift },
        ease: Ease::Smooth,
    }
}

pub fn fade_out(target: impl Into<String>) -> Action {
    Action {
        target: target.into(),
        kind: ActionKind::FadeOut,
        ease: Ease::Smooth,
    }
}

pub fn write(target: impl Into<String>) -> Action {
    Action {
        target: target.into(),
        kind: ActionKind::Write,
        ease: Ease::Smooth,
    }
}

pub fn shift(target: impl Into<String>, by: Vec2) -> Action {
    Action {
        target: target.into(),
        kind: ActionKind::Shift { by },
        ease: Ease::Smooth,
    }
}

pub fn rotate(target: impl Into<String>, by_rad: f64) -> Action {
    Action {
        target: target.into(),
        kind: ActionKind::Rotate { by_rad },
        ease: Ease::Smooth,
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub name: String,
    pub fps: Fps,
    pub canvas: Canvas,
    pub background: [u8; 4],
    pub actors: Vec<Actor>,
    pub groups: Vec<Group>,
    pub beats: Vec<Beat>,
}

pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>, fps: Fps, canvas: Canvas, background: [u8; 4]) -> Self {
        Self {
            scene: Scene {
                name: name.into(),
                fps,
                canvas,
                background,
                actors: Vec::new(),
                groups: Vec::new(),
                beats: Vec::new(),
            },
        }
    }

    pub fn shape(
        mut self,
        id: impl Into<String>,
        kind: ShapeKind,
        style: ShapeStyle,
        placement: Placement,
    ) -> Self {
        self.scene.actors.push(Actor {
            id: id.into(),
            element: Element::Shape { kind, style },
            placement,
        });
        self
    }

    pub fn text(
        mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        font_source: impl Into<String>,
        size_px: f32,
        color: [u8; 4],
        max_width_px: Option<f32>,
        placement: Placement,
    ) -> Self {
        self.scene.actors.push(Actor {
            id: id.into(),
            element: Element::Text {
                content: content.into(),
                font_source: font_source.into(),
                size_px,
                color,
                max_width_px,
            },
            placement,
        });
        self
    }

    pub fn group<I, S>(mut self, id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scene.groups.push(Group {
            id: id.into(),
            members: members.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn beat(mut self, duration_secs: f64, actions: Vec<Action>) -> Self {
        self.scene.beats.push(Beat {
            duration_secs,
            actions,
        });
        self
    }

    pub fn wait(self, duration_secs: f64) -> Self {
        self.beat(duration_secs, vec![])
    }

    pub fn build(self) -> PlumageResult<Scene> {
        self.scene.validate()?;
        Ok(self.scene)
    }
}

impl Scene {
    pub fn validate(&self) -> PlumageResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(PlumageError::validation("canvas width/height must be > 0"));
        }
        if self.beats.is_empty() {
            return Err(PlumageError::validation("scene must have at least one beat"));
        }

        let mut actor_ids = HashSet::new();
        for actor in &self.actors {
            if !actor_ids.insert(actor.id.as_str()) {
                return Err(PlumageError::validation(format!(
                    "duplicate actor id '{}'",
                    actor.id
                )));
            }
            if let Element::Text { content, size_px, .. } = &actor.element {
                if content.is_empty() {
                    return Err(PlumageError::validation(format!(
                        "text actor '{}' has empty content",
                        actor.id
                    )));
                }
                if !size_px.is_finite() || *size_px <= 0.0 {
                    return Err(PlumageError::validation(format!(
                        "text actor '{}' size_px must be finite and > 0",
                        actor.id
                    )));
                }
            }
            if !actor.placement.scale.is_finite() || actor.placement.scale <= 0.0 {
                return Err(PlumageError::validation(format!(
                    "actor '{}' scale must be finite and > 0",
                    actor.id
                )));
            }
        }

        let mut group_ids = HashSet::new();
        let mut grouped_actors = HashSet::new();
        for group in &self.groups {
            if actor_ids.contains(group.id.as_str()) || !group_ids.insert(group.id.as_str()) {
                return Err(PlumageError::validation(format!(
                    "group id '{}' collides with another id",
                    group.id
                )));
            }
            if group.members.is_empty() {
                return Err(PlumageError::validation(format!(
                    "group '{}' has no members",
                    group.id
                )));
            }
            for member in &group.members {
                if !actor_ids.contains(member.as_str()) {
                    return Err(PlumageError::validation(format!(
                        "group '{}' references unknown actor '{member}'",
                        group.id
                    )));
                }
                if !grouped_actors.insert(member.as_str()) {
                    return Err(PlumageError::validation(format!(
                        "actor '{member}' belongs to more than one group"
                    )));
                }
            }
        }

        let text_actors: HashSet<&str> = self
            .actors
            .iter()
            .filter(|a| matches!(a.element, Element::Text { .. }))
            .map(|a| a.id.as_str())
            .collect();

        let mut introduced = HashSet::new();
        for (beat_index, beat) in self.beats.iter().enumerate() {
            if !beat.duration_secs.is_finite() || beat.duration_secs <= 0.0 {
                return Err(PlumageError::validation(format!(
                    "beat {beat_index} duration_secs must be finite and > 0"
                )));
            }
            for action in &beat.actions {
                let target = action.target.as_str();
                let members: Vec<&str> = if actor_ids.contains(target) {
                    vec![target]
                } else if let Some(g) = self.groups.iter().find(|g| g.id == target) {
                    g.members.iter().map(String::as_str).collect()
                } else {
                    return Err(PlumageError::validation(format!(
                        "beat {beat_index} action targets unknown id '{target}'"
                    )));
                };

                match action.kind {
                    ActionKind::FadeIn { .. } => {
                        for m in &members {
                            introduced.insert(*m);
                        }
                    }
                    ActionKind::Write => {
                        for m in &members {
                            if !text_actors.contains(m) {
                                return Err(PlumageError::validation(format!(
                                    "Write targets non-text actor '{m}'"
                                )));
                            }
                            introduced.insert(*m);
                        }
                    }
                    ActionKind::FadeOut | ActionKind::Shift { .. } | ActionKind::Rotate { .. } => {
                        for m in &members {
                            if !introduced.contains(m) {
                                return Err(PlumageError::validation(format!(
                                    "beat {beat_index} animates '{m}' before it is introduced"
                                )));
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn duration_frames(&self) -> u64 {
        self.beats
            .iter()
            .map(|b| self.fps.secs_to_frames_round(b.duration_secs).max(1))
            .sum()
    }

    /// Lower the beat timeline into keyframed clips.
    ///
    /// Each introduced actor becomes one clip spanning its introduction to
    /// either its fade-out end or the scene end. Round-trip eases split into
    /// rise/fall key pairs so the pre-beat transform is restored exactly.
    #[tracing::instrument(skip(self), fields(scene = %self.name))]
    pub fn lower(&self) -> PlumageResult<Timeline> {
        self.validate()?;

        let mut states: HashMap<&str, ActorState> = HashMap::new();
        let mut cursor = FrameIndex(0);

        for beat in &self.beats {
            let dur = self.fps.secs_to_frames_round(beat.duration_secs).max(1);
            let beat_end = FrameIndex(cursor.0 + dur);

            for action in &beat.actions {
                let members = self.resolve_target(&action.target);
                let pivot = self.group_pivot(&action.target, &members, &states);

                for member in &members {
                    self.apply_action(member, action, cursor, beat_end, pivot, &mut states)?;
                }
            }

            cursor = beat_end;
        }
        let duration = cursor;

        let mut assets = BTreeMap::new();
        let mut clips = Vec::new();
        for (index, actor) in self.actors.iter().enumerate() {
            let Some(state) = states.remove(actor.id.as_str()) else {
                warn!(actor = %actor.id, "actor is never introduced; skipping");
                continue;
            };

            assets.insert(actor.id.clone(), element_to_asset(&actor.element));

            let end = state.retired_at.unwrap_or(duration);
            let intro = state.intro;
            clips.push(Clip {
                id: actor.id.clone(),
                asset: actor.id.clone(),
                range: FrameRange::new(intro, end)?,
                props: ClipProps {
                    // Tracks are keyed in scene frames; clips sample in
                    // clip-local frames.
                    transform: rebase(state.transform.into_anim(), intro),
                    opacity: rebase(state.opacity.into_anim(), intro),
                },
                // Declaration order is paint order.
                z_offset: index as i32,
                reveal: state.reveal,
            });
        }

        let timeline = Timeline {
            fps: self.fps,
            canvas: self.canvas,
            background: self.background,
            duration,
            assets,
            tracks: vec![Track {
                name: self.name.clone(),
                z_base: 0,
                clips,
            }],
        };
        timeline.validate()?;
        Ok(timeline)
    }

    fn resolve_target(&self, target: &str) -> Vec<&str> {
        if let Some(g) = self.groups.iter().find(|g| g.id == target) {
            g.members.iter().map(String::as_str).collect()
        } else {
            self.actors
                .iter()
                .filter(|a| a.id == target)
                .map(|a| a.id.as_str())
                .collect()
        }
    }

    /// Rotation pivot for a target: mean of member positions for a group,
    /// `None` (self-centered) for a single actor.
    fn group_pivot(
        &self,
        target: &str,
        members: &[&str],
        states: &HashMap<&str, ActorState>,
    ) -> Option<Vec2> {
        if !self.groups.iter().any(|g| g.id == target) {
            return None;
        }
        let mut sum = Vec2::ZERO;
        let mut n = 0.0;
        for m in members {
            let translate = states
                .get(m)
                .map(|s| s.transform.current().translate)
                .or_else(|| {
                    self.actors
                        .iter()
                        .find(|a| a.id == *m)
                        .map(|a| a.placement.offset)
                })?;
            sum += translate;
            n += 1.0;
        }
        Some(sum / n)
    }

    fn apply_action<'s>(
        &'s self,
        member: &str,
        action: &Action,
        start: FrameIndex,
        end: FrameIndex,
        pivot: Option<Vec2>,
        states: &mut HashMap<&'s str, ActorState>,
    ) -> PlumageResult<()> {
        let actor = self
            .actors
            .iter()
            .find(|a| a.id == member)
            .ok_or_else(|| PlumageError::validation(format!("unknown actor '{member}'")))?;
        let member_key = actor.id.as_str();

        match action.kind {
            ActionKind::FadeIn { shift } => {
                let base = actor.placement.base_transform();
                let from = Transform2D {
                    translate: base.translate - shift,
                    ..base
                };
                let state = states
                    .entry(member_key)
                    .or_insert_with(|| ActorState::introduced(start, from));
                state.retired_at = None;
                state.transform.push_with_ease(start, from, action.ease)?;
                state.transform.push(end, base)?;
                state.opacity.push_with_ease(start, 0.0, action.ease)?;
                state.opacity.push(end, 1.0)?;
            }
            ActionKind::Write => {
                let base = actor.placement.base_transform();
                let state = states
                    .entry(member_key)
                    .or_insert_with(|| ActorState::introduced(start, base));
                state.reveal = Some(RevealSpec {
                    duration_frames: end.0 - start.0,
                    ease: action.ease,
                    dir: RevealDir::LeftToRight,
                    soft_edge: WRITE_SOFT_EDGE,
                });
            }
            ActionKind::FadeOut => {
                let state = state_mut(states, member_key)?;
                state.opacity.hold_until(start, action.ease)?;
                state.opacity.push(end, 0.0)?;
                state.retired_at = Some(end);
            }
            ActionKind::Shift { by } => {
                let state = state_mut(states, member_key)?;
                let cur = *state.transform.current();
                let moved = Transform2D {
                    translate: cur.translate + by,
                    ..cur
                };
                if action.ease.is_round_trip() {
                    // Decompose into rise and fall so the end state is exact.
                    let mid = round_trip_mid(start, end);
                    state.transform.hold_until(start, Ease::Smooth)?;
                    state.transform.push_with_ease(mid, moved, Ease::Smooth)?;
                    state.transform.push(end, cur)?;
                } else {
                    state.transform.hold_until(start, action.ease)?;
                    state.transform.push(end, moved)?;
                }
            }
            ActionKind::Rotate { by_rad } => {
                let state = state_mut(states, member_key)?;
                let cur = *state.transform.current();
                let rotated = rotate_about(cur, by_rad, pivot.unwrap_or(cur.translate));
                if action.ease.is_round_trip() {
                    let mid = round_trip_mid(start, end);
                    state.transform.hold_until(start, Ease::Smooth)?;
                    state.transform.push_with_ease(mid, rotated, Ease::Smooth)?;
                    state.transform.push(end, cur)?;
                } else {
                    state.transform.hold_until(start, action.ease)?;
                    state.transform.push(end, rotated)?;
                }
            }
        }
        Ok(())
    }
}

/// Midpoint of a round-trip beat, kept strictly after `start` so the peak
/// key never lands on (and replaces) the hold key. A 1-frame beat collapses
/// to a plain hold: the peak at `end` is immediately overwritten by the
/// restore key.
fn round_trip_mid(start: FrameIndex, end: FrameIndex) -> FrameIndex {
    FrameIndex(start.0 + ((end.0 - start.0) / 2).max(1))
}

fn rebase<T>(mut anim: crate::anim::Anim<T>, start: FrameIndex) -> crate::anim::Anim<T> {
    for key in &mut anim.keys {
        key.frame = FrameIndex(key.frame.0.saturating_sub(start.0));
    }
    anim
}

/// Rotate a transform by `by_rad` about a world-space pivot: the position
/// orbits the pivot while the local rotation advances by the same angle.
fn rotate_about(t: Transform2D, by_rad: f64, pivot: Vec2) -> Transform2D {
    let rel = t.translate - pivot;
    let (sin, cos) = by_rad.sin_cos();
    let orbited = Vec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos);
    Transform2D {
        translate: pivot + orbited,
        rotation_rad: t.rotation_rad + by_rad,
        ..t
    }
}

struct ActorState {
    intro: FrameIndex,
    retired_at: Option<FrameIndex>,
    transform: crate::anim::KeyTrack<Transform2D>,
    opacity: crate::anim::KeyTrack<f64>,
    reveal: Option<RevealSpec>,
}

impl ActorState {
    fn introduced(intro: FrameIndex, base: Transform2D) -> Self {
        Self {
            intro,
            retired_at: None,
            transform: crate::anim::KeyTrack::new(intro, base),
            opacity: crate::anim::KeyTrack::new(intro, 1.0),
            reveal: None,
        }
    }
}

fn state_mut<'a>(
    states: &'a mut HashMap<&str, ActorState>,
    member: &str,
) -> PlumageResult<&'a mut ActorState> {
    states
        .get_mut(member)
        .ok_or_else(|| PlumageError::validation(format!("actor '{member}' is not introduced")))
}

fn element_to_asset(element: &Element) -> Asset {
    match element {
        Element::Shape { kind, style } => Asset::Shape(ShapeAsset {
            kind: *kind,
            style: style.clone(),
        }),
        Element::Text {
            content,
            font_source,
            size_px,
            color,
            max_width_px,
        } => Asset::Text(TextAsset {
            text: content.clone(),
            font_source: font_source.clone(),
            size_px: *size_px,
            max_width_px: *max_width_px,
            color_rgba8: *color,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::palette;

    fn fps30() -> Fps {
        Fps::new(30, 1).unwrap()
    }

    fn canvas() -> Canvas {
        Canvas {
            width: 320,
            height: 180,
        }
    }

    fn builder(name: &str) -> SceneBuilder {
        SceneBuilder::new(name, fps30(), canvas(), palette::BACKGROUND)
    }

    fn dot(id: &str, offset: Vec2) -> (String, ShapeKind, ShapeStyle, Placement) {
        (
            id.to_string(),
            ShapeKind::Dot { radius: 4.0 },
            ShapeStyle::filled(palette::YELLOW),
            Placement::at(offset),
        )
    }

    #[test]
    fn duplicate_actor_id_fails() {
        let (id, kind, style, placement) = dot("a", Vec2::ZERO);
        let err = builder("s")
            .shape(id.clone(), kind, style.clone(), placement)
            .shape(id, kind, style, placement)
            .beat(1.0, vec![])
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn write_on_shape_fails() {
        let (id, kind, style, placement) = dot("a", Vec2::ZERO);
        let err = builder("s")
            .shape(id, kind, style, placement)
            .beat(1.0, vec![write("a")])
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn acting_before_introduction_fails() {
        let (id, kind, style, placement) = dot("a", Vec2::ZERO);
        let err = builder("s")
            .shape(id, kind, style, placement)
            .beat(1.0, vec![shift("a", Vec2::new(1.0, 0.0))])
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn actor_in_two_groups_fails() {
        let (id, kind, style, placement) = dot("a", Vec2::ZERO);
        let err = builder("s")
            .shape(id, kind, style, placement)
            .group("g1", ["a"])
            .group("g2", ["a"])
            .beat(1.0, vec![])
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn fade_in_produces_slide_and_opacity_ramp() {
        let (id, kind, style, placement) = dot("a", Vec2::new(100.0, 50.0));
        let scene = builder("s")
            .shape(id, kind, style, placement)
            .beat(1.0, vec![fade_in("a", Vec2::new(0.0, -20.0))])
            .wait(1.0)
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        assert_eq!(timeline.duration.0, 60);

        let clip = &timeline.tracks[0].clips[0];
        assert_eq!(clip.range.start.0, 0);
        assert_eq!(clip.range.end.0, 60);

        let t = &clip.props.transform.keys;
        assert_eq!(t[0].value.translate, Vec2::new(100.0, 70.0));
        assert_eq!(t[1].value.translate, Vec2::new(100.0, 50.0));
        let o = &clip.props.opacity.keys;
        assert_eq!(o[0].value, 0.0);
        assert_eq!(o[1].value, 1.0);
    }

    #[test]
    fn round_trip_shift_restores_position() {
        let (id, kind, style, placement) = dot("a", Vec2::new(10.0, 10.0));
        let scene = builder("s")
            .shape(id, kind, style, placement)
            .beat(0.5, vec![fade_in("a", Vec2::ZERO)])
            .beat(
                1.0,
                vec![shift("a", Vec2::new(0.0, -9.0)).with_ease(Ease::ThereAndBack)],
            )
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        let keys = &timeline.tracks[0].clips[0].props.transform.keys;

        let last = keys.last().unwrap();
        assert_eq!(last.frame.0, 45);
        assert_eq!(last.value.translate, Vec2::new(10.0, 10.0));
        // The midway key carries the full displacement.
        let mid = &keys[keys.len() - 2];
        assert_eq!(mid.value.translate, Vec2::new(10.0, 1.0));
    }

    #[test]
    fn one_frame_round_trip_beat_leaves_prior_keys_intact() {
        // A round-trip beat that rounds to a single frame must not land its
        // peak key on the hold key, or the preceding segment retargets to
        // the displaced value.
        let (id, kind, style, placement) = dot("a", Vec2::new(32.0, 0.0));
        let scene = builder("s")
            .shape(id, kind, style, placement)
            .beat(1.0, vec![fade_in("a", Vec2::ZERO)])
            .beat(
                0.02,
                vec![shift("a", Vec2::new(10.0, 0.0)).with_ease(Ease::ThereAndBack)],
            )
            .wait(0.5)
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        let keys = &timeline.tracks[0].clips[0].props.transform.keys;

        let hold = keys.iter().find(|k| k.frame.0 == 30).unwrap();
        assert_eq!(hold.value.translate, Vec2::new(32.0, 0.0));
        assert!(
            keys.iter().all(|k| k.value.translate.x <= 32.0),
            "displaced value leaked into the track: {keys:?}"
        );
        assert_eq!(keys.last().unwrap().value.translate, Vec2::new(32.0, 0.0));
    }

    #[test]
    fn group_shift_moves_all_members() {
        let (a, kind, style, pa) = dot("a", Vec2::new(0.0, 0.0));
        let (b, _, _, pb) = dot("b", Vec2::new(20.0, 0.0));
        let scene = builder("s")
            .shape(a, kind, style.clone(), pa)
            .shape(b, kind, style, pb)
            .group("pair", ["a", "b"])
            .beat(0.5, vec![fade_in("pair", Vec2::ZERO)])
            .beat(1.0, vec![shift("pair", Vec2::new(5.0, 0.0))])
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        for (clip, expected_x) in timeline.tracks[0].clips.iter().zip([5.0, 25.0]) {
            let last = clip.props.transform.keys.last().unwrap();
            assert_eq!(last.value.translate.x, expected_x);
        }
    }

    #[test]
    fn group_rotation_orbits_members_about_mean_offset() {
        let (a, kind, style, pa) = dot("a", Vec2::new(-10.0, 0.0));
        let (b, _, _, pb) = dot("b", Vec2::new(10.0, 0.0));
        let scene = builder("s")
            .shape(a, kind, style.clone(), pa)
            .shape(b, kind, style, pb)
            .group("pair", ["a", "b"])
            .beat(0.5, vec![fade_in("pair", Vec2::ZERO)])
            .beat(
                1.0,
                vec![rotate("pair", std::f64::consts::FRAC_PI_2)],
            )
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();

        // Pivot is the origin; "a" swings from (-10,0) to (0,-10).
        let a_last = timeline.tracks[0].clips[0]
            .props
            .transform
            .keys
            .last()
            .unwrap();
        assert!((a_last.value.translate.x - 0.0).abs() < 1e-9);
        assert!((a_last.value.translate.y - -10.0).abs() < 1e-9);
        assert!((a_last.value.rotation_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn fade_out_ends_the_clip() {
        let (id, kind, style, placement) = dot("a", Vec2::ZERO);
        let scene = builder("s")
            .shape(id, kind, style, placement)
            .beat(1.0, vec![fade_in("a", Vec2::ZERO)])
            .beat(1.0, vec![fade_out("a")])
            .wait(1.0)
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        assert_eq!(timeline.duration.0, 90);
        let clip = &timeline.tracks[0].clips[0];
        assert_eq!(clip.range.end.0, 60);
        assert_eq!(clip.props.opacity.keys.last().unwrap().value, 0.0);
    }

    #[test]
    fn write_attaches_reveal_spanning_the_beat() {
        let scene = builder("s")
            .text(
                "label",
                "hello",
                "fonts/Some.ttf",
                24.0,
                palette::WHITE,
                None,
                Placement::at(Vec2::ZERO),
            )
            .beat(1.5, vec![write("label")])
            .wait(0.5)
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        let clip = &timeline.tracks[0].clips[0];
        let reveal = clip.reveal.as_ref().unwrap();
        assert_eq!(reveal.duration_frames, 45);
        assert_eq!(reveal.dir, RevealDir::LeftToRight);
    }

    #[test]
    fn never_introduced_actor_gets_no_clip() {
        let (a, kind, style, pa) = dot("a", Vec2::ZERO);
        let (b, _, _, pb) = dot("unused", Vec2::ZERO);
        let scene = builder("s")
            .shape(a, kind, style.clone(), pa)
            .shape(b, kind, style, pb)
            .beat(1.0, vec![fade_in("a", Vec2::ZERO)])
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        assert_eq!(timeline.tracks[0].clips.len(), 1);
        assert!(!timeline.assets.contains_key("unused"));
    }

    #[test]
    fn declaration_order_sets_paint_order() {
        let (a, kind, style, pa) = dot("under", Vec2::ZERO);
        let (b, _, _, pb) = dot("over", Vec2::ZERO);
        let scene = builder("s")
            .shape(a, kind, style.clone(), pa)
            .shape(b, kind, style, pb)
            .beat(1.0, vec![fade_in("over", Vec2::ZERO), fade_in("under", Vec2::ZERO)])
            .build()
            .unwrap();
        let timeline = scene.lower().unwrap();
        assert!(
            timeline.tracks[0].clips[0].z_offset < timeline.tracks[0].clips[1].z_offset
        );
        assert_eq!(timeline.tracks[0].clips[0].id, "under");
    }
}

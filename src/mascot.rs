//! Built-in scenes: the debugging-duck mascot and its introduction.
//!
//! Scene geometry is laid out in abstract scene units on a y-up axis and
//! mapped onto the pixel canvas here, so the constructors read like stage
//! directions rather than pixel math.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::{
    core::{Canvas, Fps, Vec2},
    ease::Ease,
    error::PlumageResult,
    scene::{
        Placement, Scene, SceneBuilder, fade_in, rotate, shift, write,
    },
    shape::{ShapeKind, ShapeStyle, palette},
};

/// Pixels per scene unit.
const UNIT: f64 = 90.0;
const CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};
const FONT: &str = "fonts/DejaVuSans.ttf";

fn fps30() -> Fps {
    // 30/1 is always valid.
    Fps { num: 30, den: 1 }
}

/// Canvas position for scene-unit coordinates (x right, y up, origin at the
/// canvas center).
fn at(x: f64, y: f64) -> Placement {
    Placement::at(Vec2::new(
        f64::from(CANVAS.width) / 2.0 + x * UNIT,
        f64::from(CANVAS.height) / 2.0 - y * UNIT,
    ))
}

/// Scene-unit displacement (y up) as a pixel vector.
fn by(x: f64, y: f64) -> Vec2 {
    Vec2::new(x * UNIT, -y * UNIT)
}

/// The yellow duck delivers its advice from a speech bubble.
///
/// Timeline: the duck fades in sliding upward, bobs once, the bubble pops
/// in, the advice writes itself out, holds, and the duck nods.
pub fn debugging_duck() -> PlumageResult<Scene> {
    let yellow = ShapeStyle::filled(palette::YELLOW);
    let bubble_style = ShapeStyle::filled(palette::WHITE).with_stroke(palette::BLACK, 3.0);

    SceneBuilder::new("debugging_duck", fps30(), CANVAS, palette::BACKGROUND)
        .shape(
            "body",
            ShapeKind::Ellipse {
                rx: 1.5 * UNIT,
                ry: 1.0 * UNIT,
            },
            yellow.clone(),
            at(0.0, -0.5),
        )
        .shape(
            "head",
            ShapeKind::Circle { radius: 1.0 * UNIT },
            yellow,
            at(0.0, 1.2),
        )
        .shape(
            "beak",
            ShapeKind::Triangle {
                circumradius: 0.3 * UNIT,
            },
            ShapeStyle::filled(palette::ORANGE),
            // Apex swings from up to the side, a quarter turn.
            at(0.8, 1.2).rotated(-FRAC_PI_2),
        )
        .shape(
            "eye",
            ShapeKind::Dot { radius: 0.15 * UNIT },
            ShapeStyle::filled(palette::BLACK),
            at(0.3, 1.4),
        )
        .shape(
            "wing",
            ShapeKind::Ellipse {
                rx: 0.75 * UNIT,
                ry: 0.4 * UNIT,
            },
            ShapeStyle::filled(palette::GOLD),
            at(0.3, -0.3),
        )
        .group("duck", ["body", "head", "beak", "eye", "wing"])
        .shape(
            "bubble",
            ShapeKind::RoundedRect {
                width: 4.0 * UNIT,
                height: 2.0 * UNIT,
                corner_radius: 0.3 * UNIT,
            },
            bubble_style.clone(),
            at(3.0, 2.0),
        )
        .shape(
            "bubble_tail",
            ShapeKind::Triangle {
                circumradius: 0.2 * UNIT,
            },
            bubble_style,
            at(1.8, 1.2).rotated(FRAC_PI_4),
        )
        .text(
            "advice",
            "Let's squash this\nbug together!",
            FONT,
            28.0,
            palette::BLACK,
            Some((3.6 * UNIT) as f32),
            at(3.0, 2.0),
        )
        .beat(1.5, vec![fade_in("duck", by(0.0, 0.5))])
        .beat(
            0.5,
            vec![shift("duck", by(0.0, 0.1)).with_ease(Ease::ThereAndBack)],
        )
        .beat(
            0.8,
            vec![fade_in("bubble", Vec2::ZERO), fade_in("bubble_tail", Vec2::ZERO)],
        )
        .beat(1.5, vec![write("advice")])
        .wait(2.0)
        .beat(
            0.6,
            vec![rotate("duck", -0.1).with_ease(Ease::ThereAndBack)],
        )
        .wait(1.0)
        .build()
}

/// Title card: the title writes itself in, a smaller duck fades in at the
/// left edge and waddles to center.
pub fn duck_introduction() -> PlumageResult<Scene> {
    let yellow = ShapeStyle::filled(palette::YELLOW);

    SceneBuilder::new("duck_introduction", fps30(), CANVAS, palette::BACKGROUND)
        .shape(
            "body",
            ShapeKind::Ellipse {
                rx: 1.0 * UNIT,
                ry: 0.75 * UNIT,
            },
            yellow.clone(),
            at(-3.0, 0.0),
        )
        .shape(
            "head",
            ShapeKind::Circle { radius: 0.8 * UNIT },
            yellow,
            at(-3.0, 0.8),
        )
        .shape(
            "beak",
            ShapeKind::Triangle {
                circumradius: 0.2 * UNIT,
            },
            ShapeStyle::filled(palette::ORANGE),
            at(-2.4, 0.8).rotated(-FRAC_PI_2),
        )
        .shape(
            "eye",
            ShapeKind::Dot { radius: 0.12 * UNIT },
            ShapeStyle::filled(palette::BLACK),
            at(-2.8, 1.0),
        )
        .group("duck", ["body", "head", "beak", "eye"])
        .text(
            "title",
            "Meet Your Debugging Duck",
            FONT,
            40.0,
            palette::BLUE,
            None,
            at(0.0, 3.4),
        )
        .beat(1.0, vec![write("title")])
        .beat(1.0, vec![fade_in("duck", by(1.0, 0.0))])
        .beat(
            2.0,
            vec![shift("duck", by(3.0, 0.0)).with_ease(Ease::Linear)],
        )
        .wait(1.0)
        .build()
}

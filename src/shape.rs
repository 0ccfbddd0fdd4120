//! Vector shape primitives: origin-centered outlines plus presentational
//! style, set once at construction time.

use kurbo::Shape as _;

use crate::{
    core::BezPath,
    error::{PlumageError, PlumageResult},
};

/// Flattening tolerance for curve-to-bezier conversion, in canvas pixels.
const PATH_TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    Ellipse { rx: f64, ry: f64 },
    Circle { radius: f64 },
    /// Equilateral triangle, apex pointing up (negative y), vertices on the
    /// circle of `circumradius`.
    Triangle { circumradius: f64 },
    Dot { radius: f64 },
    RoundedRect { width: f64, height: f64, corner_radius: f64 },
}

impl ShapeKind {
    pub fn validate(&self) -> PlumageResult<()> {
        let ok = match *self {
            Self::Ellipse { rx, ry } => rx > 0.0 && ry > 0.0,
            Self::Circle { radius } | Self::Dot { radius } => radius > 0.0,
            Self::Triangle { circumradius } => circumradius > 0.0,
            Self::RoundedRect {
                width,
                height,
                corner_radius,
            } => width > 0.0 && height > 0.0 && corner_radius >= 0.0,
        };
        if !ok {
            return Err(PlumageError::validation(format!(
                "shape has non-positive dimensions: {self:?}"
            )));
        }
        Ok(())
    }

    /// Build the outline as a bezier path centered on the origin.
    pub fn outline(&self) -> BezPath {
        match *self {
            Self::Ellipse { rx, ry } => {
                kurbo::Ellipse::new((0.0, 0.0), (rx, ry), 0.0).to_path(PATH_TOLERANCE)
            }
            Self::Circle { radius } | Self::Dot { radius } => {
                kurbo::Circle::new((0.0, 0.0), radius).to_path(PATH_TOLERANCE)
            }
            Self::Triangle { circumradius } => triangle_path(circumradius),
            Self::RoundedRect {
                width,
                height,
                corner_radius,
            } => kurbo::RoundedRect::new(
                -width / 2.0,
                -height / 2.0,
                width / 2.0,
                height / 2.0,
                corner_radius,
            )
            .to_path(PATH_TOLERANCE),
        }
    }
}

fn triangle_path(circumradius: f64) -> BezPath {
    // Vertices at 90, 210 and 330 degrees, y-up flipped to screen coordinates.
    let mut path = BezPath::new();
    let vertex = |deg: f64| {
        let rad = deg.to_radians();
        kurbo::Point::new(circumradius * rad.cos(), -circumradius * rad.sin())
    };
    path.move_to(vertex(90.0));
    path.line_to(vertex(210.0));
    path.line_to(vertex(330.0));
    path.close_path();
    path
}

/// Expand a stroked outline into a fillable path.
pub fn expand_stroke(outline: &BezPath, width: f64) -> PlumageResult<BezPath> {
    if !(width.is_finite() && width > 0.0) {
        return Err(PlumageError::validation(
            "stroke width must be finite and > 0",
        ));
    }
    Ok(kurbo::stroke(
        outline.elements().iter().copied(),
        &kurbo::Stroke::new(width),
        &kurbo::StrokeOpts::default(),
        PATH_TOLERANCE,
    ))
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub color: [u8; 4],
    pub width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeStyle {
    pub fill: Option<[u8; 4]>,
    /// Multiplied into the fill alpha; [0,1].
    pub fill_opacity: f64,
    pub stroke: Option<StrokeStyle>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            fill_opacity: 1.0,
            stroke: None,
        }
    }
}

impl ShapeStyle {
    pub fn filled(color: [u8; 4]) -> Self {
        Self {
            fill: Some(color),
            fill_opacity: 1.0,
            stroke: None,
        }
    }

    pub fn with_stroke(mut self, color: [u8; 4], width: f64) -> Self {
        self.stroke = Some(StrokeStyle { color, width });
        self
    }

    pub fn validate(&self) -> PlumageResult<()> {
        if !(0.0..=1.0).contains(&self.fill_opacity) {
            return Err(PlumageError::validation(
                "fill_opacity must be within [0, 1]",
            ));
        }
        if self.fill.is_none() && self.stroke.is_none() {
            return Err(PlumageError::validation(
                "shape style needs a fill or a stroke",
            ));
        }
        if let Some(s) = &self.stroke
            && !(s.width.is_finite() && s.width > 0.0)
        {
            return Err(PlumageError::validation(
                "stroke width must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Fill color with `fill_opacity` folded into the alpha channel.
    pub fn effective_fill(&self) -> Option<[u8; 4]> {
        self.fill.map(|[r, g, b, a]| {
            let a = (f64::from(a) * self.fill_opacity).round().clamp(0.0, 255.0) as u8;
            [r, g, b, a]
        })
    }
}

/// Colors used by the mascot scenes.
pub mod palette {
    pub const YELLOW: [u8; 4] = [255, 211, 56, 255];
    pub const GOLD: [u8; 4] = [212, 169, 36, 255];
    pub const ORANGE: [u8; 4] = [255, 134, 47, 255];
    pub const BLACK: [u8; 4] = [16, 16, 16, 255];
    pub const WHITE: [u8; 4] = [248, 248, 248, 255];
    pub const BLUE: [u8; 4] = [88, 150, 255, 255];
    /// Dark slate scene background.
    pub const BACKGROUND: [u8; 4] = [18, 20, 28, 255];
}

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::{
    core::BezPath,
    error::{PlumageError, PlumageResult},
    model::{Asset, Timeline},
    shape,
};

/// Prepared shape geometry: origin-centered fill/stroke paths with straight
/// RGBA colors (fill opacity already folded into the alpha).
#[derive(Clone, Debug)]
pub struct PreparedShape {
    pub fill: Option<(BezPath, [u8; 4])>,
    pub stroke: Option<(BezPath, [u8; 4])>,
}

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Prepared text asset: shaped layout plus backing font data.
#[derive(Clone)]
pub struct PreparedText {
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    pub font_bytes: Arc<Vec<u8>>,
    pub font_family: String,
    pub width: f32,
    pub height: f32,
}

impl std::fmt::Debug for PreparedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedText")
            .field("layout_ptr", &Arc::as_ptr(&self.layout))
            .field("font_bytes_len", &self.font_bytes.len())
            .field("font_family", &self.font_family)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum PreparedAsset {
    Shape(PreparedShape),
    Text(PreparedText),
}

/// Stable hashed identifier for a prepared asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(u64);

impl AssetId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Immutable store of prepared assets keyed by timeline asset keys.
///
/// Preparation front-loads all IO (font reads) and geometry work (outline
/// building, stroke expansion, text shaping) so rendering stays deterministic
/// and IO-free.
#[derive(Clone, Debug)]
pub struct PreparedAssetStore {
    root: PathBuf,
    ids_by_key: HashMap<String, AssetId>,
    assets_by_id: HashMap<AssetId, PreparedAsset>,
}

impl PreparedAssetStore {
    pub fn prepare(timeline: &Timeline, root: impl Into<PathBuf>) -> PlumageResult<Self> {
        let root = root.into();
        let mut out = Self {
            root,
            ids_by_key: HashMap::new(),
            assets_by_id: HashMap::new(),
        };

        let mut text_engine = TextLayoutEngine::new();
        for (asset_key, asset) in &timeline.assets {
            let id = hash_id_for(asset_key, asset);

            let prepared = match asset {
                Asset::Shape(a) => {
                    a.kind.validate()?;
                    a.style.validate()?;
                    let outline = a.kind.outline();
                    let stroke = match &a.style.stroke {
                        Some(s) => Some((shape::expand_stroke(&outline, s.width)?, s.color)),
                        None => None,
                    };
                    let fill = a.style.effective_fill().map(|color| (outline, color));
                    PreparedAsset::Shape(PreparedShape { fill, stroke })
                }
                Asset::Text(a) => {
                    let norm_path = normalize_rel_path(&a.font_source)?;
                    let font_bytes = out.read_bytes(&norm_path)?;
                    let brush = TextBrushRgba8 {
                        r: a.color_rgba8[0],
                        g: a.color_rgba8[1],
                        b: a.color_rgba8[2],
                        a: a.color_rgba8[3],
                    };
                    let layout = text_engine.layout_plain(
                        &a.text,
                        font_bytes.as_slice(),
                        a.size_px,
                        brush,
                        a.max_width_px,
                    )?;
                    let family = text_engine
                        .last_family_name()
                        .unwrap_or_else(|| "unknown".to_string());
                    let (width, height) = (layout.width(), layout.height());
                    PreparedAsset::Text(PreparedText {
                        layout: Arc::new(layout),
                        font_bytes: Arc::new(font_bytes),
                        font_family: family,
                        width,
                        height,
                    })
                }
            };

            out.ids_by_key.insert(asset_key.clone(), id);
            out.assets_by_id.insert(id, prepared);
        }

        Ok(out)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn id_for_key(&self, key: &str) -> PlumageResult<AssetId> {
        self.ids_by_key
            .get(key)
            .copied()
            .ok_or_else(|| PlumageError::evaluation(format!("unknown asset key '{key}'")))
    }

    pub fn get(&self, id: AssetId) -> PlumageResult<&PreparedAsset> {
        self.assets_by_id
            .get(&id)
            .ok_or_else(|| PlumageError::evaluation(format!("unknown AssetId {}", id.as_u64())))
    }

    fn read_bytes(&self, norm_path: &str) -> PlumageResult<Vec<u8>> {
        let path = self.root.join(Path::new(norm_path));
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(PlumageError::from)
    }
}

/// Seeded FNV-1a 64 over the asset key and a debug rendering of the asset.
fn hash_id_for(asset_key: &str, asset: &Asset) -> AssetId {
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    let mut write = |bytes: &[u8]| {
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0000_0100_0000_01B3);
        }
        h ^= 0xff;
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    };
    write(asset_key.as_bytes());
    write(format!("{asset:?}").as_bytes());
    AssetId(h)
}

/// Normalize and validate root-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PlumageResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PlumageError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(PlumageError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PlumageError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PlumageError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    last_family_name: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            last_family_name: None,
        }
    }

    pub fn last_family_name(&self) -> Option<String> {
        self.last_family_name.clone()
    }

    /// Shape and lay out plain text using provided font bytes and styling.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> PlumageResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PlumageError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PlumageError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PlumageError::validation("registered font family has no name"))?
            .to_string();
        self.last_family_name = Some(family_name.clone());

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Center,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::{
        core::{Canvas, Fps, FrameIndex},
        model::{ShapeAsset, TextAsset},
        shape::{ShapeKind, ShapeStyle, palette},
    };

    fn shape_only_timeline() -> Timeline {
        let mut assets = BTreeMap::new();
        assets.insert(
            "bubble".to_string(),
            Asset::Shape(ShapeAsset {
                kind: ShapeKind::RoundedRect {
                    width: 100.0,
                    height: 50.0,
                    corner_radius: 8.0,
                },
                style: ShapeStyle::filled(palette::WHITE).with_stroke(palette::BLACK, 2.0),
            }),
        );
        Timeline {
            fps: Fps::new(30, 1).unwrap(),
            canvas: Canvas {
                width: 320,
                height: 180,
            },
            background: palette::BACKGROUND,
            duration: FrameIndex(10),
            assets,
            tracks: vec![],
        }
    }

    #[test]
    fn prepare_builds_fill_and_stroke_paths() {
        let timeline = shape_only_timeline();
        let store = PreparedAssetStore::prepare(&timeline, ".").unwrap();
        let id = store.id_for_key("bubble").unwrap();
        let PreparedAsset::Shape(shape) = store.get(id).unwrap() else {
            panic!("expected a prepared shape");
        };
        let (_, fill_color) = shape.fill.as_ref().unwrap();
        assert_eq!(*fill_color, palette::WHITE);
        let (stroke_path, stroke_color) = shape.stroke.as_ref().unwrap();
        assert_eq!(*stroke_color, palette::BLACK);
        assert!(!stroke_path.elements().is_empty());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let timeline = shape_only_timeline();
        let store = PreparedAssetStore::prepare(&timeline, ".").unwrap();
        assert!(store.id_for_key("nope").is_err());
    }

    #[test]
    fn missing_font_file_surfaces_io_error() {
        let mut timeline = shape_only_timeline();
        timeline.assets.insert(
            "label".to_string(),
            Asset::Text(TextAsset {
                text: "quack".to_string(),
                font_source: "fonts/definitely-missing.ttf".to_string(),
                size_px: 24.0,
                max_width_px: None,
                color_rgba8: palette::BLACK,
            }),
        );
        assert!(PreparedAssetStore::prepare(&timeline, ".").is_err());
    }

    #[test]
    fn text_layout_centers_lines_within_max_width() {
        let mut timeline = shape_only_timeline();
        timeline.assets.insert(
            "advice".to_string(),
            Asset::Text(TextAsset {
                text: "a much longer first line\nshort".to_string(),
                font_source: "tests/data/fonts/DejaVuSans.ttf".to_string(),
                size_px: 24.0,
                max_width_px: Some(400.0),
                color_rgba8: palette::BLACK,
            }),
        );
        let store = PreparedAssetStore::prepare(&timeline, ".").unwrap();
        let id = store.id_for_key("advice").unwrap();
        let PreparedAsset::Text(text) = store.get(id).unwrap() else {
            panic!("expected prepared text");
        };

        assert!(text.width > 0.0 && text.height > 0.0);
        let line_starts: Vec<f32> = text
            .layout
            .lines()
            .map(|line| {
                line.items()
                    .filter_map(|item| match item {
                        parley::layout::PositionedLayoutItem::GlyphRun(run) => run
                            .positioned_glyphs()
                            .map(|g| g.x)
                            .reduce(f32::min),
                        _ => None,
                    })
                    .fold(f32::INFINITY, f32::min)
            })
            .collect();
        assert_eq!(line_starts.len(), 2);
        // Centered within the wrap width, so the short line starts
        // further right than the long one.
        assert!(line_starts[1] > line_starts[0] + 10.0);
    }

    #[test]
    fn asset_ids_are_stable_and_distinct() {
        let timeline = shape_only_timeline();
        let a = hash_id_for("bubble", &timeline.assets["bubble"]);
        let b = hash_id_for("bubble", &timeline.assets["bubble"]);
        let c = hash_id_for("other", &timeline.assets["bubble"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rel_path_normalization() {
        assert_eq!(
            normalize_rel_path("fonts/./Duck.ttf").unwrap(),
            "fonts/Duck.ttf"
        );
        assert!(normalize_rel_path("/abs/Duck.ttf").is_err());
        assert!(normalize_rel_path("../Duck.ttf").is_err());
        assert!(normalize_rel_path("").is_err());
    }
}

//! Frame Compositor
//!
//! Pure per-frame composition shared by live preview and export. Given the
//! playback time and the document's style/layout state, [`render_frame`]
//! produces a [`FramePlan`]: an ordered list of draw instructions, back to
//! front, that any 2D surface can execute.
//!
//! Layer order for the caption text:
//!
//! ```text
//! base fill -> background image -> text box -> stroke -> glow -> (shadow) -> fill
//! ```
//!
//! The drop shadow is only drawn when glow, stroke and gradient are all off.

use serde::{Deserialize, Serialize};

use super::layout::{cover_source_rect, split_caption_lines, TextMeasurer};
use crate::core::captions::{active_caption, CaptionLine};
use crate::core::project::{CaptionPosition, EditorState, ImageHandle};
use crate::core::settings::CompositorSettings;
use crate::core::theme::{BackgroundStyle, FontStyle, TextAlignment, ThemeConfig};
use crate::core::{AspectRatio, Color, CoreResult, Rect, Size2D, TimeSec};

// =============================================================================
// Draw Instructions
// =============================================================================

/// Font selection for a text run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    /// Size in pixels
    pub size: f64,
}

impl FontSpec {
    fn from_theme(theme: &ThemeConfig) -> Self {
        Self {
            family: theme.font_family.clone(),
            weight: theme.font_weight.numeric(),
            italic: theme.font_style == FontStyle::Italic,
            size: theme.font_size,
        }
    }

    /// CSS font shorthand, e.g. `italic 700 48px Inter`
    pub fn css(&self) -> String {
        format!(
            "{}{} {}px {}",
            if self.italic { "italic " } else { "" },
            self.weight,
            self.size,
            self.family
        )
    }
}

/// One line of text anchored at `(x, y)`; `y` is the vertical middle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font: FontSpec,
    pub align: TextAlignment,
}

/// How glyphs are filled
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Paint {
    Solid { color: Color },
    /// Horizontal gradient from `x0` (color `from`) to `x1` (color `to`)
    LinearGradient {
        x0: f64,
        x1: f64,
        from: Color,
        to: Color,
    },
}

/// A single draw instruction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawLayer {
    /// Fills the whole canvas
    Fill { color: Color },
    /// Draws the `src` region of an image into `dest`
    Image {
        source: String,
        src: Rect,
        dest: Rect,
    },
    BackgroundBox { rect: Rect, color: Color },
    Stroke {
        run: TextRun,
        color: Color,
        width: f64,
    },
    Glow {
        run: TextRun,
        color: Color,
        blur: f64,
    },
    Shadow {
        run: TextRun,
        color: Color,
        offset_x: f64,
        offset_y: f64,
        blur: f64,
    },
    Text { run: TextRun, paint: Paint },
}

/// Everything needed to draw one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePlan {
    pub width: u32,
    pub height: u32,
    pub time: TimeSec,
    /// Index of the caption shown, if any
    pub caption_index: Option<usize>,
    /// Back to front
    pub layers: Vec<DrawLayer>,
}

impl FramePlan {
    pub fn size(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }

    /// Text lines drawn by the fill pass
    pub fn text_lines(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                DrawLayer::Text { run, .. } => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rescales the plan for a surface of another size (e.g. the preview)
    pub fn scaled(&self, target: Size2D) -> FramePlan {
        if self.width == 0 || self.height == 0 {
            return self.clone();
        }
        let sx = f64::from(target.width) / f64::from(self.width);
        let sy = f64::from(target.height) / f64::from(self.height);
        let s = sx.min(sy);

        let rect = |r: &Rect| Rect::new(r.x * sx, r.y * sy, r.width * sx, r.height * sy);
        let run = |r: &TextRun| TextRun {
            text: r.text.clone(),
            x: r.x * sx,
            y: r.y * sy,
            font: FontSpec {
                size: r.font.size * s,
                ..r.font.clone()
            },
            align: r.align,
        };

        let layers = self
            .layers
            .iter()
            .map(|layer| match layer {
                DrawLayer::Fill { color } => DrawLayer::Fill {
                    color: color.clone(),
                },
                DrawLayer::Image { source, src, dest } => DrawLayer::Image {
                    source: source.clone(),
                    src: *src,
                    dest: rect(dest),
                },
                DrawLayer::BackgroundBox { rect: r, color } => DrawLayer::BackgroundBox {
                    rect: rect(r),
                    color: color.clone(),
                },
                DrawLayer::Stroke { run: r, color, width } => DrawLayer::Stroke {
                    run: run(r),
                    color: color.clone(),
                    width: width * s,
                },
                DrawLayer::Glow { run: r, color, blur } => DrawLayer::Glow {
                    run: run(r),
                    color: color.clone(),
                    blur: blur * s,
                },
                DrawLayer::Shadow {
                    run: r,
                    color,
                    offset_x,
                    offset_y,
                    blur,
                } => DrawLayer::Shadow {
                    run: run(r),
                    color: color.clone(),
                    offset_x: offset_x * s,
                    offset_y: offset_y * s,
                    blur: blur * s,
                },
                DrawLayer::Text { run: r, paint } => DrawLayer::Text {
                    run: run(r),
                    paint: match paint {
                        Paint::Solid { color } => Paint::Solid {
                            color: color.clone(),
                        },
                        Paint::LinearGradient { x0, x1, from, to } => Paint::LinearGradient {
                            x0: x0 * sx,
                            x1: x1 * sx,
                            from: from.clone(),
                            to: to.clone(),
                        },
                    },
                },
            })
            .collect();

        FramePlan {
            width: target.width,
            height: target.height,
            time: self.time,
            caption_index: self.caption_index,
            layers,
        }
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Inputs of one frame
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub time: TimeSec,
    pub captions: &'a [CaptionLine],
    pub theme: &'a ThemeConfig,
    pub position: CaptionPosition,
    pub aspect_ratio: AspectRatio,
    pub background: Option<&'a ImageHandle>,
}

impl<'a> FrameInput<'a> {
    /// Frame inputs from the document at `time`, using its active theme
    pub fn from_state(state: &'a EditorState, time: TimeSec) -> CoreResult<Self> {
        Ok(Self {
            time,
            captions: state.caption_lines(),
            theme: state.active_theme()?,
            position: state.caption_position,
            aspect_ratio: state.aspect_ratio,
            background: state.background_image.as_ref(),
        })
    }
}

/// Composes one frame at export resolution
pub fn render_frame(
    input: &FrameInput<'_>,
    settings: &CompositorSettings,
    measurer: &dyn TextMeasurer,
) -> FramePlan {
    let size = input.aspect_ratio.export_size();
    let mut layers = vec![DrawLayer::Fill {
        color: Color::from_hex(&settings.base_fill_color),
    }];

    if let Some(image) = input.background {
        if let Some(src) = cover_source_rect(image.size(), size) {
            layers.push(DrawLayer::Image {
                source: image.source.clone(),
                src,
                dest: Rect::new(0.0, 0.0, f64::from(size.width), f64::from(size.height)),
            });
        }
    }

    let active = active_caption(input.captions, input.time);
    if let Some((_, caption)) = active {
        layers.extend(caption_layers(
            &caption.display_text(),
            input.theme,
            input.position.to_pixels(size),
            settings,
            measurer,
        ));
    }

    FramePlan {
        width: size.width,
        height: size.height,
        time: input.time,
        caption_index: active.map(|(index, _)| index),
        layers,
    }
}

/// Horizontal extent `[left, right]` of a line for the given alignment
fn line_extent(x: f64, width: f64, align: TextAlignment) -> (f64, f64) {
    match align {
        TextAlignment::Left => (x, x + width),
        TextAlignment::Center => (x - width / 2.0, x + width / 2.0),
        TextAlignment::Right => (x - width, x),
    }
}

fn caption_layers(
    text: &str,
    theme: &ThemeConfig,
    (anchor_x, anchor_y): (f64, f64),
    settings: &CompositorSettings,
    measurer: &dyn TextMeasurer,
) -> Vec<DrawLayer> {
    let lines = split_caption_lines(text, theme.max_lines, settings.two_line_threshold);
    if lines.is_empty() {
        return Vec::new();
    }

    let font = FontSpec::from_theme(theme);
    let line_height = theme.font_size * settings.line_height_factor;
    let center_offset = (lines.len() as f64 - 1.0) / 2.0;

    let runs: Vec<(TextRun, (f64, f64))> = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let extent = line_extent(anchor_x, measurer.measure(&line, theme), theme.align);
            let run = TextRun {
                text: line,
                x: anchor_x,
                y: anchor_y + (i as f64 - center_offset) * line_height,
                font: font.clone(),
                align: theme.align,
            };
            (run, extent)
        })
        .collect();

    let mut layers = Vec::new();

    if theme.background != BackgroundStyle::None {
        let left = runs.iter().map(|(_, e)| e.0).fold(f64::INFINITY, f64::min);
        let right = runs.iter().map(|(_, e)| e.1).fold(f64::NEG_INFINITY, f64::max);
        let top = runs[0].0.y - theme.font_size / 2.0;
        let bottom = runs[runs.len() - 1].0.y + theme.font_size / 2.0;
        let color = Color::from_hex(&theme.background_color);
        let color = match theme.background {
            BackgroundStyle::Translucent => {
                color.with_alpha(color.alpha() * settings.translucent_alpha as f32)
            }
            _ => color,
        };
        layers.push(DrawLayer::BackgroundBox {
            rect: Rect::new(left, top, right - left, bottom - top).inflate(settings.box_padding),
            color,
        });
    }

    let stroke = theme.stroke_active();
    let glow = theme.glow_active();
    let gradient = theme.gradient_active();

    if let Some(stroke) = stroke {
        for (run, _) in &runs {
            layers.push(DrawLayer::Stroke {
                run: run.clone(),
                color: Color::from_hex(&stroke.color),
                width: stroke.width,
            });
        }
    }

    if let Some(glow) = glow {
        for (run, _) in &runs {
            layers.push(DrawLayer::Glow {
                run: run.clone(),
                color: Color::from_hex(&glow.color),
                blur: settings.glow_blur,
            });
        }
    }

    let draw_shadow = stroke.is_none() && glow.is_none() && gradient.is_none();
    for (run, (left, right)) in runs {
        if draw_shadow {
            layers.push(DrawLayer::Shadow {
                run: run.clone(),
                color: Color::rgba(0.0, 0.0, 0.0, 0.8),
                offset_x: settings.shadow_offset,
                offset_y: settings.shadow_offset,
                blur: settings.shadow_blur,
            });
        }
        let paint = match gradient {
            Some(gradient) => Paint::LinearGradient {
                x0: left,
                x1: right,
                from: Color::from_hex(&gradient.from),
                to: Color::from_hex(&gradient.to),
            },
            None => Paint::Solid {
                color: Color::from_hex(&theme.text_color),
            },
        };
        layers.push(DrawLayer::Text { run, paint });
    }

    layers
}

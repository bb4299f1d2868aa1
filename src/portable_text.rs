//! Rich-text article bodies.
//!
//! An article body is an array of typed blocks. Text blocks carry a style
//! (`normal`, `h1`..`h6`, `blockquote`), optional list membership, and spans
//! of text annotated with marks. Marks are either decorators (`strong`,
//! `em`, ...) or keys into the block's `markDefs`, which is how hyperlinks
//! are attached.
//!
//! ```json
//! {
//!   "_type": "block",
//!   "style": "normal",
//!   "markDefs": [{ "_key": "a1", "_type": "link", "href": "https://example.com" }],
//!   "children": [
//!     { "_type": "span", "text": "Read ", "marks": [] },
//!     { "_type": "span", "text": "this", "marks": ["strong", "a1"] }
//!   ]
//! }
//! ```
//!
//! Parsing never fails: anything that is not a well-formed text or image
//! block becomes [`Block::Unknown`], which renders as an empty placeholder.
//! Consecutive list-item blocks are grouped into nested `<ul>`/`<ol>`
//! elements by their `level`.

use crate::image_url::{ImageOptions, ImageUrlBuilder};
use crate::types::ImageRef;
use maud::{Markup, html};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Width requested for inline body images.
const BODY_IMAGE_WIDTH: u32 = 1200;

#[derive(Debug, Clone)]
pub enum Block {
    Text(TextBlock),
    Image(ImageRef),
    /// Any block type without a rendering rule; keeps its `_type` for debugging.
    Unknown { kind: String },
}

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub style: BlockStyle,
    pub list_item: Option<ListKind>,
    /// List nesting depth, 1-based.
    pub level: u32,
    pub children: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStyle {
    Normal,
    Heading(u8),
    Blockquote,
    Other(String),
}

impl BlockStyle {
    fn parse(style: Option<&str>) -> Self {
        match style {
            None | Some("normal") => BlockStyle::Normal,
            Some("blockquote") => BlockStyle::Blockquote,
            Some(s) => match s.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=6) => BlockStyle::Heading(n),
                _ => BlockStyle::Other(s.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, Default)]
pub struct Span {
    pub text: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MarkDef {
    pub key: String,
    pub kind: MarkDefKind,
}

#[derive(Debug, Clone)]
pub enum MarkDefKind {
    Link { href: String },
    Other(String),
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTextBlock {
    style: Option<String>,
    list_item: Option<String>,
    level: Option<u32>,
    #[serde(default)]
    children: Vec<RawChild>,
    #[serde(default)]
    mark_defs: Vec<RawMarkDef>,
}

#[derive(Deserialize)]
struct RawChild {
    #[serde(default)]
    text: String,
    #[serde(default)]
    marks: Vec<String>,
}

#[derive(Deserialize)]
struct RawMarkDef {
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_type")]
    kind: String,
    href: Option<String>,
}

impl Block {
    /// Interpret one body element. Never fails.
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match kind.as_str() {
            "block" => match serde_json::from_value::<RawTextBlock>(value) {
                Ok(raw) => Block::Text(raw.into()),
                Err(_) => Block::Unknown { kind },
            },
            "image" => match serde_json::from_value::<ImageRef>(value) {
                Ok(image) => Block::Image(image),
                Err(_) => Block::Unknown { kind },
            },
            _ => Block::Unknown { kind },
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Block::from_value(Value::deserialize(deserializer)?))
    }
}

impl From<RawTextBlock> for TextBlock {
    fn from(raw: RawTextBlock) -> Self {
        let list_item = raw.list_item.as_deref().map(|kind| match kind {
            "number" => ListKind::Number,
            _ => ListKind::Bullet,
        });
        TextBlock {
            style: BlockStyle::parse(raw.style.as_deref()),
            list_item,
            level: raw.level.unwrap_or(1).max(1),
            children: raw
                .children
                .into_iter()
                .map(|c| Span {
                    text: c.text,
                    marks: c.marks,
                })
                .collect(),
            mark_defs: raw
                .mark_defs
                .into_iter()
                .map(|d| MarkDef {
                    key: d.key,
                    kind: match (d.kind.as_str(), d.href) {
                        ("link", Some(href)) => MarkDefKind::Link { href },
                        _ => MarkDefKind::Other(d.kind),
                    },
                })
                .collect(),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a whole body. List runs are grouped; everything else goes through
/// [`render_block`].
pub fn render_body(blocks: &[Block], images: &ImageUrlBuilder) -> Markup {
    let mut parts: Vec<Markup> = Vec::new();
    let mut i = 0;
    while i < blocks.len() {
        let run: Vec<&TextBlock> = blocks[i..]
            .iter()
            .map_while(|b| match b {
                Block::Text(t) if t.list_item.is_some() => Some(t),
                _ => None,
            })
            .collect();

        if run.is_empty() {
            parts.push(render_block(&blocks[i], images));
            i += 1;
        } else {
            i += run.len();
            let base = run.iter().map(|t| t.level).min().unwrap_or(1);
            for segment in split_by_kind(&run, base) {
                parts.push(render_list(&segment, base));
            }
        }
    }

    html! {
        div.post-body {
            @for part in &parts {
                (part)
            }
        }
    }
}

/// Render a single non-list block. Unrecognized kinds and styles fall back
/// to a placeholder or a plain paragraph.
pub fn render_block(block: &Block, images: &ImageUrlBuilder) -> Markup {
    match block {
        Block::Text(text) => render_text_block(text),
        Block::Image(image) => match images.url(image, ImageOptions::width(BODY_IMAGE_WIDTH)) {
            Some(src) => html! {
                figure.pt-figure {
                    img.pt-image src=(src) alt=(image.alt.as_deref().unwrap_or("")) loading="lazy";
                }
            },
            None => html! {},
        },
        Block::Unknown { kind } => {
            tracing::debug!(block_type = %kind, "no rendering rule for block, using default");
            html! { div.pt-unknown data-block-type=(kind) {} }
        }
    }
}

fn render_text_block(block: &TextBlock) -> Markup {
    let content = render_spans(block);
    match block.style {
        BlockStyle::Heading(1) => html! { h1.pt-h1 { (content) } },
        BlockStyle::Heading(2) => html! { h2.pt-h2 { (content) } },
        BlockStyle::Heading(3) => html! { h3.pt-h3 { (content) } },
        BlockStyle::Heading(4) => html! { h4.pt-h4 { (content) } },
        BlockStyle::Heading(5) => html! { h5.pt-h5 { (content) } },
        BlockStyle::Heading(6) => html! { h6.pt-h6 { (content) } },
        BlockStyle::Blockquote => html! { blockquote.pt-quote { (content) } },
        BlockStyle::Normal | BlockStyle::Heading(_) | BlockStyle::Other(_) => {
            html! { p.pt-p { (content) } }
        }
    }
}

fn render_spans(block: &TextBlock) -> Markup {
    html! {
        @for span in &block.children {
            (render_span(span, &block.mark_defs))
        }
    }
}

/// Wrap span text in its marks, innermost first.
fn render_span(span: &Span, defs: &[MarkDef]) -> Markup {
    let mut out = html! { (span.text) };
    for mark in &span.marks {
        out = apply_mark(mark, defs, out);
    }
    out
}

fn apply_mark(mark: &str, defs: &[MarkDef], inner: Markup) -> Markup {
    match mark {
        "strong" => html! { strong { (inner) } },
        "em" => html! { em { (inner) } },
        "code" => html! { code { (inner) } },
        "underline" => html! { span.pt-underline { (inner) } },
        "strike-through" => html! { del { (inner) } },
        key => match defs.iter().find(|d| d.key == key).map(|d| &d.kind) {
            Some(MarkDefKind::Link { href }) => html! {
                a.pt-link href=(href) { (inner) }
            },
            // Unknown annotation: keep the text
            _ => inner,
        },
    }
}

/// Split a list run wherever an item at the base level switches list kind.
fn split_by_kind<'a>(run: &[&'a TextBlock], base: u32) -> Vec<Vec<&'a TextBlock>> {
    let mut segments: Vec<Vec<&TextBlock>> = Vec::new();
    let mut current_kind = None;
    for item in run {
        let starts_new = item.level <= base && current_kind != item.list_item;
        if starts_new || segments.is_empty() {
            if item.level <= base {
                current_kind = item.list_item;
            }
            segments.push(Vec::new());
        }
        if let Some(segment) = segments.last_mut() {
            segment.push(item);
        }
    }
    segments
}

/// Render one list at `level`; deeper items nest under the preceding item.
/// A nested run sits at its shallowest level, so skipped levels still
/// produce siblings.
fn render_list(items: &[&TextBlock], level: u32) -> Markup {
    let ordered = items
        .first()
        .is_some_and(|i| i.list_item == Some(ListKind::Number));

    let mut entries: Vec<(&TextBlock, Vec<&TextBlock>)> = Vec::new();
    for item in items {
        match entries.last_mut() {
            Some((_, children)) if item.level > level => children.push(item),
            _ => entries.push((item, Vec::new())),
        }
    }

    let inner = html! {
        @for (item, children) in &entries {
            li.pt-li {
                (render_spans(item))
                @if let Some(child_level) = children.iter().map(|c| c.level).min() {
                    (render_list(children, child_level))
                }
            }
        }
    };

    if ordered {
        html! { ol.pt-list { (inner) } }
    } else {
        html! { ul.pt-list { (inner) } }
    }
}

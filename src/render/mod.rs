//! Page Layout & Render Engine
//!
//! Greedy word wrap, pagination against the template height, and drawing of
//! each page onto a fresh copy of the background template.

pub mod font;
pub mod page;
pub mod wrap;

pub use font::{BlockFont, FontMetrics, GlyphFont, PageFont};
pub use page::{
    layout, line_step, load_template, max_line_width, paginate, LayoutParams, PageFormat, PageLayout, PageRenderer,
    PlacedLine, RenderSettings, RenderedPage,
};
pub use wrap::wrap_text;

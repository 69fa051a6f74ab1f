pub mod font;
pub mod render;

pub use ab_glyph::FontVec;
pub use font::{load_font, load_font_file};
pub use render::{BACKGROUND, FrameTimings, SkiaRenderer, load_icon_pixmap, render_text_pixmap};

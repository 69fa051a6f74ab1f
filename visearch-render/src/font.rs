use ab_glyph::FontVec;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Places a sans-serif face is usually installed
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub fn load_font_file(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Loads `explicit` when given, otherwise the first usable system font.
///
/// Returns `None` (and warns) when nothing can be loaded; the renderer then
/// draws no text.
pub fn load_font(explicit: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(p) => vec![p.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in &candidates {
        if explicit.is_none() && !path.exists() {
            continue;
        }
        match load_font_file(path) {
            Ok(font) => {
                info!(path = %path.display(), "font loaded");
                return Some(font);
            }
            Err(e) => debug!(error = format!("{e:#}"), "font candidate rejected"),
        }
    }

    warn!(
        requested = ?explicit,
        "no usable font found, instruction and feedback text will not be drawn"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_a_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(load_font_file(&path).is_err());
        assert!(load_font(Some(&path)).is_none());
    }

    #[test]
    fn missing_explicit_font_is_none() {
        assert!(load_font(Some(Path::new("/nonexistent/visearch.ttf"))).is_none());
    }
}

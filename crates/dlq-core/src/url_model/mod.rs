//! File name derivation for queued items.
//!
//! Names come from the caller's suggestion, else the URL path, else the
//! source reference plus an extension for the content kind. Results are
//! sanitized for Linux and made unique among live items.

mod path;
mod sanitize;

pub use path::file_name_from_url_path;
pub use sanitize::sanitize_file_name;

use crate::item::ContentKind;

/// Used when nothing else yields a usable stem.
const DEFAULT_STEM: &str = "download";

/// Derives the on-disk name for a new item.
///
/// - `derive_file_name("c1", "https://x/a/intro.mp4", Video, None)` → `"intro.mp4"`
/// - `derive_file_name("c1", "https://x/a/stream", Video, None)` → `"stream.mp4"`
/// - `derive_file_name("c1", "https://x/", Audio, None)` → `"c1.mp3"`
pub fn derive_file_name(
    source_ref: &str,
    url: &str,
    kind: ContentKind,
    suggested: Option<&str>,
) -> String {
    if let Some(name) = suggested.map(sanitize_file_name).filter(|s| !s.is_empty()) {
        return name;
    }

    if let Some(name) = file_name_from_url_path(url)
        .map(|s| sanitize_file_name(&s))
        .filter(|s| !s.is_empty())
    {
        return if split_extension(&name).1.is_some() {
            name
        } else {
            format!("{name}.{}", kind.default_extension())
        };
    }

    let stem = sanitize_file_name(source_ref);
    let stem = if stem.is_empty() { DEFAULT_STEM } else { stem.as_str() };
    format!("{stem}.{}", kind.default_extension())
}

/// Returns `candidate`, or `stem_N.ext` with the smallest `N` not in `taken`.
pub fn unique_file_name_among<'a>(
    candidate: &str,
    taken: impl IntoIterator<Item = &'a str>,
) -> String {
    let taken: std::collections::HashSet<&str> = taken.into_iter().collect();
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    let (stem, ext) = split_extension(candidate);
    (1u32..)
        .map(|n| match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        })
        .find(|name| !taken.contains(name.as_str()))
        .unwrap_or_else(|| candidate.to_string())
}

/// Split `name.ext` at the last dot. A leading dot does not start an extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_name_wins() {
        assert_eq!(
            derive_file_name("r1", "https://x.com/a.mp4", ContentKind::Video, Some("My Lesson.mp4")),
            "My_Lesson.mp4"
        );
    }

    #[test]
    fn blank_suggestion_falls_back_to_url() {
        assert_eq!(
            derive_file_name("r1", "https://x.com/media/a.webm", ContentKind::Video, Some(" .. ")),
            "a.webm"
        );
    }

    #[test]
    fn url_segment_without_extension_gets_kind_extension() {
        assert_eq!(
            derive_file_name("r1", "https://x.com/v/42/stream", ContentKind::Audio, None),
            "stream.mp3"
        );
    }

    #[test]
    fn source_ref_fallback() {
        assert_eq!(
            derive_file_name("course-7/thumb", "https://x.com/", ContentKind::Thumbnail, None),
            "course-7_thumb.jpg"
        );
        assert_eq!(
            derive_file_name("..", "https://x.com/", ContentKind::Other, None),
            "download.bin"
        );
    }

    #[test]
    fn unique_names() {
        assert_eq!(unique_file_name_among("a.mp4", ["b.mp4"]), "a.mp4");
        assert_eq!(unique_file_name_among("a.mp4", ["a.mp4"]), "a_1.mp4");
        assert_eq!(
            unique_file_name_among("a.mp4", ["a.mp4", "a_1.mp4", "a_2.mp4"]),
            "a_3.mp4"
        );
        assert_eq!(unique_file_name_among("README", ["README"]), "README_1");
    }
}

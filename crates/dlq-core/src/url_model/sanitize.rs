//! Linux-safe file name sanitization.

const NAME_MAX: usize = 255;

/// Sanitizes a candidate file name for the download directory.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses runs of `_`
/// - Trims leading/trailing dots and underscores (no hidden files, no `..`)
/// - Truncates to 255 bytes on a char boundary
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let unsafe_char = c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        let c = if unsafe_char { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    truncate_on_boundary(trimmed, NAME_MAX).to_string()
}

fn truncate_on_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators_and_whitespace() {
        assert_eq!(sanitize_file_name("a/b\\c d.mp4"), "a_b_c_d.mp4");
        assert_eq!(sanitize_file_name("tab\there"), "tab_here");
        assert_eq!(sanitize_file_name("nul\0byte"), "nul_byte");
    }

    #[test]
    fn trims_dots_and_underscores() {
        assert_eq!(sanitize_file_name("..hidden.."), "hidden");
        assert_eq!(sanitize_file_name("__x__"), "x");
        assert_eq!(sanitize_file_name(".."), "");
    }

    #[test]
    fn truncates_long_names() {
        let long = "é".repeat(200);
        let out = sanitize_file_name(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}

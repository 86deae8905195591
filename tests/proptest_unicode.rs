//! Property tests for the UTF-8 width primitives.

use proptest::prelude::*;
use termline::unicode::{
    offset_after_n_chars, utf8_step, visible_len_ignoring_csi, visible_width,
};

proptest! {
    /// Without escape sequences the escape-aware width is the plain
    /// codepoint count.
    #[test]
    fn escape_aware_width_matches_codepoint_count(s in "\\PC*") {
        prop_assume!(!s.contains('\u{1b}'));
        prop_assert_eq!(visible_len_ignoring_csi(&s), s.chars().count());
    }

    /// SGR-wrapped text measures the same as the bare text.
    #[test]
    fn sgr_wrapping_is_invisible(s in "[a-zA-Z0-9 é]*") {
        let wrapped = format!("\x1b[38;2;10;20;30m{s}\x1b[0m");
        prop_assert_eq!(visible_len_ignoring_csi(&wrapped), s.chars().count());
    }

    /// Walking a string codepoint by codepoint visits every boundary.
    #[test]
    fn utf8_step_walks_all_boundaries(s in "\\PC*") {
        let bytes = s.as_bytes();
        let mut offset = 0;
        let mut count = 0;
        while offset < bytes.len() {
            offset += utf8_step(bytes[offset]);
            count += 1;
        }
        prop_assert_eq!(offset, bytes.len());
        prop_assert_eq!(count, s.chars().count());
        prop_assert_eq!(visible_width(bytes), count);
    }

    /// Consuming n codepoints lands on a boundary and counts correctly.
    #[test]
    fn offset_after_n_chars_consumes_exactly(s in "\\PC*", n in 0usize..40) {
        let bytes = s.as_bytes();
        let (offset, consumed) = offset_after_n_chars(bytes, 0, n);
        prop_assert_eq!(consumed, n.min(s.chars().count()));
        prop_assert!(s.is_char_boundary(offset));
        prop_assert_eq!(visible_width(&bytes[..offset]), consumed);
    }
}

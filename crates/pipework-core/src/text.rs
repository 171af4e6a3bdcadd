//! Text splicing for chained documentation.
//!
//! Text payloads (docs of behaviors, methods and properties) are merged with
//! [`splice`]. The earlier-declared text is the *left* side. If it contains the
//! continuation marker [`CONTINUATION_MARKER`] as a paragraph of its own, the
//! later text is substituted at that point. Otherwise the later text is placed
//! in front of it, separated by a blank line.
//!
//! ```
//! use pipework_core::text::splice;
//!
//! let left = "Left head\n\n{next}\n\nLeft tail\n";
//! let right = "Right head\n\n{next}\n\nRight tail\n";
//! assert_eq!(
//!     splice(Some(left), Some(right)).as_deref(),
//!     Some("Left head\n\nRight head\n\n{next}\n\nRight tail\n\nLeft tail\n"),
//! );
//!
//! assert_eq!(
//!     splice(Some("Left tail\n"), Some("Right tail\n")).as_deref(),
//!     Some("Right tail\n\nLeft tail\n"),
//! );
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Splice point inside chained text.
pub const CONTINUATION_MARKER: &str = "{next}";

static MARKER_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n\s*\{next\}\s*\n\s*\n").expect("valid marker pattern")
});

/// Check whether `text` carries the continuation marker as its own paragraph.
pub fn has_splice_point(text: &str) -> bool {
    MARKER_PARAGRAPH.is_match(text)
}

/// Merge two texts, `left` being the earlier declared one.
///
/// Either side may be missing, in which case the other is returned unchanged.
pub fn splice(left: Option<&str>, right: Option<&str>) -> Option<String> {
    match (left, right) {
        (None, None) => None,
        (Some(left), None) => Some(left.to_string()),
        (None, Some(right)) => Some(right.to_string()),
        (Some(left), Some(right)) => {
            let right = right.trim_end();
            if has_splice_point(left) {
                Some(left.replace(CONTINUATION_MARKER, right))
            } else {
                Some(format!("{}\n\n{}", right, left))
            }
        }
    }
}

//! The media title mini-language.
//!
//! A media title can carry a layout class and a size hint in addition to a
//! free-form title, e.g. `left-50 =100x200` or `A sunset =640x`.

use smol_str::SmolStr;

use crate::value::{AttrMap, Value};

/// Reserved layout tokens, in the order they are looked for.
pub const LAYOUT_CLASSES: [&str; 3] = ["right-50", "left-50", "full-width"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleAttributes {
    pub layout_class: Option<SmolStr>,
    /// Whatever is left once the layout token and size suffix are removed.
    /// Not trimmed.
    pub title: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl TitleAttributes {
    /// Raw media attributes. An empty title counts as no title.
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert("layoutClass".into(), Value::from(self.layout_class.clone()));
        attrs.insert(
            "title".into(),
            Value::from(self.title.clone().filter(|t| !t.is_empty())),
        );
        attrs.insert("width".into(), Value::from(self.width));
        attrs.insert("height".into(), Value::from(self.height));
        attrs
    }
}

/// Decode a title string. Total: any input produces a result.
pub fn parse_title_attribute(title: &str) -> TitleAttributes {
    let mut attrs = TitleAttributes::default();
    if title.is_empty() {
        return attrs;
    }

    let mut rest = title.to_owned();
    for class in LAYOUT_CLASSES {
        if let Some(idx) = rest.find(class) {
            rest.replace_range(idx..idx + class.len(), "");
            attrs.layout_class = Some(SmolStr::new_static(class));
        }
    }

    if let Some((start, width, height)) = size_suffix(&rest) {
        attrs.width = width;
        attrs.height = height;
        rest.truncate(start);
    }

    attrs.title = Some(rest);
    attrs
}

/// Find a trailing `=<digits>?x<digits>?`. Returns the byte offset of `=`
/// and the parsed dimensions.
fn size_suffix(s: &str) -> Option<(usize, Option<i64>, Option<i64>)> {
    let bytes = s.as_bytes();
    let mut end = bytes.len();

    let height_start = digits_before(bytes, end);
    let height = parse_dimension(&s[height_start..end]);
    end = height_start;

    if end == 0 || bytes[end - 1] != b'x' {
        return None;
    }
    end -= 1;

    let width_start = digits_before(bytes, end);
    let width = parse_dimension(&s[width_start..end]);
    end = width_start;

    if end == 0 || bytes[end - 1] != b'=' {
        return None;
    }
    Some((end - 1, width, height))
}

fn digits_before(bytes: &[u8], end: usize) -> usize {
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    start
}

fn parse_dimension(digits: &str) -> Option<i64> {
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_title_attribute(""), TitleAttributes::default());
    }

    #[test]
    fn test_layout_and_size() {
        let attrs = parse_title_attribute("left-50 =100x200");
        assert_eq!(attrs.layout_class.as_deref(), Some("left-50"));
        assert_eq!(attrs.width, Some(100));
        assert_eq!(attrs.height, Some(200));
        assert_eq!(attrs.title.as_deref(), Some(" "));
    }

    #[test]
    fn test_plain_title_kept_verbatim() {
        let attrs = parse_title_attribute("  A sunset ");
        assert_eq!(attrs.layout_class, None);
        assert_eq!(attrs.width, None);
        assert_eq!(attrs.title.as_deref(), Some("  A sunset "));
    }

    #[test]
    fn test_partial_sizes() {
        let attrs = parse_title_attribute("Photo =640x");
        assert_eq!(attrs.width, Some(640));
        assert_eq!(attrs.height, None);
        assert_eq!(attrs.title.as_deref(), Some("Photo "));

        let attrs = parse_title_attribute(" =x48");
        assert_eq!(attrs.width, None);
        assert_eq!(attrs.height, Some(48));
        assert_eq!(attrs.title.as_deref(), Some(" "));
    }

    #[test]
    fn test_size_must_be_trailing() {
        let attrs = parse_title_attribute("=10x10 caption");
        assert_eq!(attrs.width, None);
        assert_eq!(attrs.title.as_deref(), Some("=10x10 caption"));

        let attrs = parse_title_attribute("10x10");
        assert_eq!(attrs.width, None);
    }

    #[test]
    fn test_dimensions_past_u32() {
        let attrs = parse_title_attribute(" =5000000000x");
        assert_eq!(attrs.width, Some(5_000_000_000));
        assert_eq!(attrs.height, None);
    }

    #[test]
    fn test_last_layout_token_wins() {
        let attrs = parse_title_attribute("right-50 full-width");
        assert_eq!(attrs.layout_class.as_deref(), Some("full-width"));
        assert_eq!(attrs.title.as_deref(), Some(" "));
    }

    #[test]
    fn test_only_first_occurrence_stripped() {
        let attrs = parse_title_attribute("left-50left-50");
        assert_eq!(attrs.layout_class.as_deref(), Some("left-50"));
        assert_eq!(attrs.title.as_deref(), Some("left-50"));
    }

    #[test]
    fn test_to_attrs_drops_empty_title() {
        let attrs = parse_title_attribute("full-width").to_attrs();
        assert_eq!(attrs["layoutClass"], Value::from("full-width"));
        assert_eq!(attrs["title"], Value::Null);
        assert_eq!(attrs["width"], Value::Null);
    }
}

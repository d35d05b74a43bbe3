//! Pre-parse fixups for game-authored XML.
//!
//! Part definitions store rotation matrices as attributes named after the
//! matrix cell (`00="1" 01="0" ...`). Names starting with a digit are not
//! legal XML, so every attribute whose name is exactly two digits gets an
//! underscore prefix (`_00="1"`) before the text reaches the XML reader.

use std::borrow::Cow;

/// Prefix bare two-digit attribute names with an underscore.
///
/// A match is whitespace, then exactly two ASCII digits, then `=`. Already
/// normalized text is returned unchanged, so the pass is idempotent.
#[must_use]
pub fn normalize_xml(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let mut output: Option<String> = None;
    // Start of the input not yet copied into `output`.
    let mut copied = 0;

    for (i, c) in input.char_indices() {
        if !c.is_whitespace() {
            continue;
        }
        let name = i + c.len_utf8();
        let is_cell_name = bytes.len() >= name + 3
            && bytes[name].is_ascii_digit()
            && bytes[name + 1].is_ascii_digit()
            && bytes[name + 2] == b'=';
        if !is_cell_name {
            continue;
        }

        let out = output.get_or_insert_with(|| String::with_capacity(input.len() + 32));
        out.push_str(&input[copied..name]);
        out.push('_');
        copied = name;
    }

    match output {
        Some(mut out) => {
            out.push_str(&input[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prefixes_matrix_cells() {
        let input = r#"<physics_shape_rotation 00="1" 01="0" 22="-1"/>"#;
        assert_eq!(
            normalize_xml(input),
            r#"<physics_shape_rotation _00="1" _01="0" _22="-1"/>"#
        );
    }

    #[test]
    fn test_untouched_input_is_borrowed() {
        let input = r#"<definition name="block" mass="1"/>"#;
        assert!(matches!(normalize_xml(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_ignores_longer_and_shorter_numbers() {
        // Only exactly two digits between whitespace and '=' count.
        let input = r#"<a 1="x" 100="y" b00="z"/>"#;
        assert_eq!(normalize_xml(input), input);
    }

    #[test]
    fn test_other_whitespace_before_name() {
        let input = "<m\n00=\"1\"\t11=\"1\"/>";
        assert_eq!(normalize_xml(input), "<m\n_00=\"1\"\t_11=\"1\"/>");
    }

    #[test]
    fn test_at_end_of_input() {
        assert_eq!(normalize_xml(" 00"), " 00");
        assert_eq!(normalize_xml(" 00="), " _00=");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(input in "[ a-z0-9=\"<>/_\n]{0,64}") {
            let once = normalize_xml(&input).into_owned();
            let twice = normalize_xml(&once).into_owned();
            prop_assert_eq!(once, twice);
        }
    }
}

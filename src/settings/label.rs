//! Display-width label shortening

/// Labels up to this many characters are shown unchanged
pub const STRIP_LABEL_THRESHOLD: usize = 12;

/// Shorten a long label by dropping interior lowercase vowels
///
/// Labels of at most [`STRIP_LABEL_THRESHOLD`] characters are returned as-is.
/// Longer labels lose every `a`, `e`, `i`, `o` or `u` that is neither the
/// first nor the last character; uppercase vowels are kept.
pub fn strip_label(label: &str) -> String {
    let len = label.chars().count();
    if len <= STRIP_LABEL_THRESHOLD {
        return label.to_string();
    }

    label
        .chars()
        .enumerate()
        .filter(|&(i, c)| i == 0 || i == len - 1 || !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_labels_unchanged() {
        assert_eq!(strip_label("Compensation"), "Compensation");
        assert_eq!(strip_label(""), "");
        assert_eq!(strip_label("Gain"), "Gain");
    }

    #[test]
    fn test_interior_vowels_removed() {
        assert_eq!(strip_label("Peak Reduction"), "Pk Rdctn");
    }

    #[test]
    fn test_edges_and_uppercase_kept() {
        // 13 chars, starts and ends with a vowel
        assert_eq!(strip_label("aOutput Levee"), "aOtpt Lve");
        assert_eq!(strip_label("Input Ceiling A"), "Inpt Clng A");
    }
}

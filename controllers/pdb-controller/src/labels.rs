//! Label matching.
//!
//! Pure functions over label maps. `contain_labels` decides selector
//! containment, `labels_intersect` decides selector overlap.
//! `validate_selector` is the explicit guard against empty selectors,
//! which would otherwise match every label set.

use cluster_client::{Labels, Selector};

/// Returns true iff every key in `needle` exists in `haystack` with the same value.
///
/// An empty `needle` is vacuously contained; callers that treat a match as
/// ownership must run [`validate_selector`] first.
pub fn contain_labels(haystack: &Labels, needle: &Labels) -> bool {
    needle
        .iter()
        .all(|(key, value)| haystack.get(key) == Some(value))
}

/// Returns true iff at least one key is present in both maps with equal values.
pub fn labels_intersect(a: &Labels, b: &Labels) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .any(|(key, value)| large.get(key) == Some(value))
}

/// Why a selector cannot be used for ownership matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorProblem {
    /// No `matchLabels`: would match everything
    Empty,
    /// `matchExpressions` present: containment cannot express them
    Expressions,
}

impl std::fmt::Display for SelectorProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorProblem::Empty => f.write_str("selector has no matchLabels"),
            SelectorProblem::Expressions => f.write_str("selector uses matchExpressions"),
        }
    }
}

/// Checks that a selector is safe to use for ownership decisions
pub fn validate_selector(selector: &Selector) -> Result<(), SelectorProblem> {
    if selector.is_empty() {
        return Err(SelectorProblem::Empty);
    }
    if selector.has_expressions {
        return Err(SelectorProblem::Expressions);
    }
    Ok(())
}

/// Containment restricted to valid selectors: `selector ⊆ labels` and `selector` is non-empty
pub fn selector_matches(selector: &Selector, labels: &Labels) -> bool {
    !selector.is_empty() && contain_labels(labels, &selector.match_labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_contain_labels() {
        let haystack = labels(&[("foo", "bar")]);

        assert!(contain_labels(&haystack, &labels(&[("foo", "bar")])));
        assert!(!contain_labels(&haystack, &labels(&[("foo", "baz")])));
    }

    #[test]
    fn test_contain_labels_subset_and_missing_key() {
        let haystack = labels(&[("app", "web"), ("tier", "frontend")]);

        assert!(contain_labels(&haystack, &labels(&[("app", "web")])));
        assert!(!contain_labels(&haystack, &labels(&[("app", "web"), ("zone", "a")])));
        assert!(!contain_labels(&labels(&[("app", "web")]), &haystack));
    }

    #[test]
    fn test_contain_labels_empty_needle_is_vacuous() {
        assert!(contain_labels(&labels(&[("app", "web")]), &Labels::new()));
        assert!(contain_labels(&Labels::new(), &Labels::new()));
    }

    #[test]
    fn test_labels_intersect() {
        let cases = [
            (
                "matching maps should intersect",
                labels(&[("foo", "bar")]),
                labels(&[("foo", "bar")]),
                true,
            ),
            (
                "partly matching maps should intersect",
                labels(&[("foo", "bar")]),
                labels(&[("foo", "bar"), ("bar", "foo")]),
                true,
            ),
            (
                "one equal shared key is enough even if another shared key differs",
                labels(&[("foo", "bar"), ("bar", "baz")]),
                labels(&[("foo", "bar"), ("bar", "foo")]),
                true,
            ),
            (
                "a single shared key with different values should not intersect",
                labels(&[("foo", "bar")]),
                labels(&[("foo", "baz"), ("other", "x")]),
                false,
            ),
            (
                "disjoint keys should not intersect",
                labels(&[("foo", "bar")]),
                labels(&[("baz", "bar")]),
                false,
            ),
            ("empty maps should not intersect", Labels::new(), Labels::new(), false),
        ];

        for (msg, a, b, expected) in cases {
            assert_eq!(labels_intersect(&a, &b), expected, "{}", msg);
            assert_eq!(labels_intersect(&b, &a), expected, "{} (symmetric)", msg);
        }
    }

    #[test]
    fn test_validate_selector() {
        assert_eq!(validate_selector(&Selector::default()), Err(SelectorProblem::Empty));

        let with_expressions = Selector {
            match_labels: labels(&[("app", "web")]),
            has_expressions: true,
        };
        assert_eq!(validate_selector(&with_expressions), Err(SelectorProblem::Expressions));

        assert!(validate_selector(&Selector::from_labels(labels(&[("app", "web")]))).is_ok());
    }

    #[test]
    fn test_empty_selector_never_matches() {
        assert!(!selector_matches(&Selector::default(), &labels(&[("app", "web")])));
        assert!(selector_matches(
            &Selector::from_labels(labels(&[("app", "web")])),
            &labels(&[("app", "web"), ("tier", "frontend")])
        ));
    }
}

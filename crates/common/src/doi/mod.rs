//! DOI normalization
//!
//! The normalized DOI is node identity everywhere in the graph builders,
//! so the same paper referenced as `https://doi.org/10.1/X`, `10.1/x` or
//! ` 10.1/X ` must collapse to one key.

use regex_lite::Regex;
use std::sync::OnceLock;

fn resolver_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^https?://(dx\.)?doi\.org/").expect("static DOI prefix pattern")
    })
}

/// Normalize an identifier into a canonical lowercase DOI.
///
/// Strips surrounding whitespace and any `http(s)://[dx.]doi.org/`
/// resolver prefix. Stacked prefixes are stripped too so the function is
/// idempotent. Never fails; empty input yields an empty string.
pub fn normalize_doi(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut current = lowered.trim();

    loop {
        let stripped = match resolver_prefix().find(current) {
            Some(m) => current[m.end()..].trim(),
            None => break,
        };
        current = stripped;
    }

    current.to_string()
}

/// Normalize an optional identifier, mapping empty results to `None`.
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_doi).filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_resolver_prefixes() {
        assert_eq!(normalize_doi("https://doi.org/10.1038/NATURE123"), "10.1038/nature123");
        assert_eq!(normalize_doi("http://dx.doi.org/10.1/ABC"), "10.1/abc");
        assert_eq!(normalize_doi("HTTPS://DOI.ORG/10.1/x"), "10.1/x");
    }

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(normalize_doi("  10.1016/J.CELL.2020.01.001 \n"), "10.1016/j.cell.2020.01.001");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_doi(""), "");
        assert_eq!(normalize_doi("   "), "");
        assert_eq!(normalize_opt(Some("  ")), None);
        assert_eq!(normalize_opt(None), None);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "https://doi.org/https://doi.org/10.1/X",
            " https://doi.org/ 10.1/Y",
            "10.1/z",
            "https://example.org/10.1/w",
            "",
            "doi.org/10.5/q",
        ];
        for s in samples {
            let once = normalize_doi(s);
            assert_eq!(normalize_doi(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_non_resolver_urls_are_kept() {
        assert_eq!(
            normalize_doi("https://example.org/10.1/W"),
            "https://example.org/10.1/w"
        );
    }

    fn resolver_prefix_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "",
            "https://doi.org/",
            "http://dx.doi.org/",
            "HTTPS://DOI.ORG/",
            "https://doi.org/https://doi.org/",
        ])
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,40}") {
            let once = normalize_doi(&raw);
            prop_assert_eq!(normalize_doi(&once), once);
        }

        #[test]
        fn prop_prefixed_forms_collapse(
            prefix in resolver_prefix_strategy(),
            body in "10\\.[0-9]{1,5}/[A-Za-z0-9._-]{1,20}",
            pad in "[ \\t]{0,3}",
        ) {
            let raw = format!("{}{}{}{}", pad, prefix, body, pad);
            let normalized = normalize_doi(&raw);
            prop_assert_eq!(&normalized, &body.to_lowercase());
            prop_assert!(resolver_prefix().find(&normalized).is_none());
        }
    }
}

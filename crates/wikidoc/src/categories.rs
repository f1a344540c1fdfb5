use std::sync::OnceLock;

use regex::Regex;

use crate::title::uppercase_first;

/// Category names linked from `text`, in document order, duplicates kept.
///
/// `[[Category:Foo]]` is membership. `[[:Category:Foo]]` only links to the category and is
/// included when `include_links` is set.
pub fn extract_categories(text: &str, include_links: bool) -> Vec<String> {
    // Captures: 1 = leading colon, 2 = name up to the sort key separator.
    static CATEGORY_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = CATEGORY_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\[\[(:)?Category:([^|\]]*?)\s*(?:\|[^\]]*)?\]\]")
            .expect("Invalid regex")
    });

    re.captures_iter(text)
        .filter(|cap| include_links || cap.get(1).is_none())
        .filter_map(|cap| cap.get(2))
        .map(|name| uppercase_first(name.as_str().trim()))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_capitalized() {
        assert_eq!(extract_categories("x [[Category:foo bar]] y", false), vec!["Foo bar"]);
    }

    #[test]
    fn colon_links_need_include_links() {
        let text = "[[:Category:foo bar]]";
        assert!(extract_categories(text, false).is_empty());
        assert_eq!(extract_categories(text, true), vec!["Foo bar"]);
    }

    #[test]
    fn case_insensitive_prefix_sort_keys_and_duplicates() {
        let text = "[[category: Pending  |Sortkey]]\n[[CATEGORY:Pending]]\n[[Category:Drafts|*]]";
        assert_eq!(
            extract_categories(text, false),
            vec!["Pending", "Pending", "Drafts"]
        );
    }

    #[test]
    fn mixed_membership_and_links_keep_document_order() {
        let text = "[[Category:a]] [[:Category:b]] [[Category:c]]";
        assert_eq!(extract_categories(text, false), vec!["A", "C"]);
        assert_eq!(extract_categories(text, true), vec!["A", "B", "C"]);
    }

    #[test]
    fn ignores_other_links() {
        assert!(extract_categories("[[Foo]] [[File:Category:x.png]]", true).is_empty());
    }
}

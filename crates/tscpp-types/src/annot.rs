//! Explicit ownership annotations.
//!
//! Ownership is annotated in documentation comments ahead of a property or
//! parameter declaration, one tag per declaration: `@weak`, `@unique`, or
//! `@shared`. The scanner runs line by line over the doc comment attached to
//! the declaration immediately following it; the last tag wins if several are
//! present. No tag means "infer".

use crate::ownership::Ownership;

/// Scan the doc-comment lines attached to a declaration for an ownership tag.
pub fn scan_ownership_annotation(doc_lines: &[String]) -> Option<Ownership> {
    let mut found = None;
    for line in doc_lines {
        for word in line.split_whitespace() {
            let word = word.trim_start_matches('*');
            match word {
                "@weak" => found = Some(Ownership::Weak),
                "@unique" => found = Some(Ownership::Unique),
                "@shared" => found = Some(Ownership::Shared),
                _ => {}
            }
        }
    }
    found
}

/// Convenience for raw comment text: split into lines and scan.
pub fn scan_ownership_text(text: &str) -> Option<Ownership> {
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    scan_ownership_annotation(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_weak_tag() {
        let doc = vec!["The owning tree. @weak".to_string()];
        assert_eq!(scan_ownership_annotation(&doc), Some(Ownership::Weak));
    }

    #[test]
    fn finds_tag_in_block_comment_body() {
        let text = "/**\n * Back-pointer to the parent scope.\n * @weak\n */";
        assert_eq!(scan_ownership_text(text), Some(Ownership::Weak));
    }

    #[test]
    fn last_tag_wins() {
        let doc = vec!["@shared".to_string(), "@unique".to_string()];
        assert_eq!(scan_ownership_annotation(&doc), Some(Ownership::Unique));
    }

    #[test]
    fn absence_means_infer() {
        let doc = vec!["Nothing to see here.".to_string()];
        assert_eq!(scan_ownership_annotation(&doc), None);
        // Tags must be whole words.
        let doc = vec!["email is @weakly held".to_string()];
        assert_eq!(scan_ownership_annotation(&doc), None);
    }
}

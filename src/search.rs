//! Substring search over cached sections.
//!
//! Matching is case-insensitive containment, nothing more. Results keep the
//! order in which sections were given; there is no relevance ranking.

use crate::section::DocSection;

pub const ELLIPSIS: &str = "...";
/// Characters of context kept on each side of a content match.
pub const CONTEXT_CHARS: usize = 100;
/// Length of the content preview used for title-only matches.
pub const TITLE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SearchResult {
    pub section_id: String,
    pub section_title: String,
    pub matched_content: String,
    pub url: String,
}

pub fn search_sections<'a, I>(sections: I, query: &str) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a DocSection>,
{
    if query.trim().is_empty() {
        return Vec::new();
    }

    sections
        .into_iter()
        .filter_map(|section| {
            let matched_content = match find_ignore_case(&section.content, query) {
                Some(span) => excerpt_around(&section.content, span),
                None if find_ignore_case(&section.title, query).is_some() => {
                    title_preview(&section.content)
                }
                None => return None,
            };
            Some(SearchResult {
                section_id: section.id.clone(),
                section_title: section.title.clone(),
                matched_content,
                url: section.url.clone(),
            })
        })
        .collect()
}

/// Position of the first case-insensitive occurrence of `needle`, as a
/// `(start, len)` span counted in chars of `haystack`.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<char> = haystack.chars().collect();

    (0..hay.len()).find_map(|start| {
        let mut matched = 0;
        for (consumed, c) in hay[start..].iter().enumerate() {
            for lower in c.to_lowercase() {
                if needle.get(matched) != Some(&lower) {
                    return None;
                }
                matched += 1;
            }
            if matched == needle.len() {
                return Some((start, consumed + 1));
            }
        }
        None
    })
}

/// Window of [`CONTEXT_CHARS`] on both sides of the match, with an ellipsis
/// on each side that was cut short.
pub fn excerpt_around(content: &str, (start, len): (usize, usize)) -> String {
    let chars: Vec<char> = content.chars().collect();
    let from = start.saturating_sub(CONTEXT_CHARS);
    let to = (start + len + CONTEXT_CHARS).min(chars.len());

    let mut excerpt = String::new();
    if from > 0 {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt.extend(&chars[from..to]);
    if to < chars.len() {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt
}

pub fn title_preview(content: &str) -> String {
    let mut preview: String = content.chars().take(TITLE_PREVIEW_CHARS).collect();
    preview.push_str(ELLIPSIS);
    preview
}

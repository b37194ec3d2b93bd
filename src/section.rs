use serde::{Deserialize, Serialize};

/// One documentation page.
///
/// A section with empty `content` is a stub: its metadata came from the
/// index page but its body has not been fetched yet.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DocSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
}

impl DocSection {
    pub fn stub(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            url: url.into(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

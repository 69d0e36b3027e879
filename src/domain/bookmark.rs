use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub title: String,
    pub url: String,
    #[serde(rename = "isFavorite", default)]
    pub is_favorite: bool,
}

impl BookmarkEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>, is_favorite: bool) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            is_favorite,
        }
    }

    /// Host part of the URL, falling back to the full URL when it does not parse.
    pub fn host(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| self.url.clone())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// Decode a list response. The server answers `null` for an empty search.
pub fn decode_list(body: &[u8]) -> serde_json::Result<Vec<BookmarkEntry>> {
    let list: Option<Vec<BookmarkEntry>> = serde_json::from_slice(body)?;
    Ok(list.unwrap_or_default())
}

use url::Url;

/// What a line typed into the input box means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A literal absolute URL to bookmark.
    Bookmark(Url),
    /// Anything else is a search phrase.
    Search(String),
    Empty,
}

/// Classify user input. Only a parseable absolute URL with a non-empty host
/// counts as a bookmark; `example.com` or `foo:bar` are searches.
pub fn classify(text: &str) -> Input {
    let text = text.trim();
    if text.is_empty() {
        return Input::Empty;
    }

    match parse_bookmark_url(text) {
        Some(url) => Input::Bookmark(url),
        None => Input::Search(text.to_string()),
    }
}

/// Strict URL check shared with the mutation path.
pub fn parse_bookmark_url(text: &str) -> Option<Url> {
    let url = Url::parse(text).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

use std::fmt;

/// The list a view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Favorites,
    Recents,
    Search,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Favorites => "favorites",
            Namespace::Recents => "recents",
            Namespace::Search => "search",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one cached bookmark list.
///
/// Two keys are equal iff their namespace and every parameter match exactly,
/// so `favorites(10)` and `favorites(5)` are cached independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Favorites { count: u32 },
    Recents { count: u32 },
    Search { query: String },
}

impl QueryKey {
    pub fn favorites(count: u32) -> Self {
        QueryKey::Favorites { count }
    }

    pub fn recents(count: u32) -> Self {
        QueryKey::Recents { count }
    }

    pub fn search(query: impl Into<String>) -> Self {
        QueryKey::Search {
            query: query.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            QueryKey::Favorites { .. } => Namespace::Favorites,
            QueryKey::Recents { .. } => Namespace::Recents,
            QueryKey::Search { .. } => Namespace::Search,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Favorites { count } | QueryKey::Recents { count } => {
                write!(f, "{}[count={}]", self.namespace(), count)
            }
            QueryKey::Search { query } => write!(f, "search[q={:?}]", query),
        }
    }
}

/// A statement that some set of cached lists no longer reflects the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationTag {
    /// Every bookmark list: favorites, recents and all searches.
    BookmarkList,
    Namespace(Namespace),
    Key(QueryKey),
}

impl InvalidationTag {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            InvalidationTag::BookmarkList => true,
            InvalidationTag::Namespace(ns) => key.namespace() == *ns,
            InvalidationTag::Key(k) => k == key,
        }
    }
}

impl fmt::Display for InvalidationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationTag::BookmarkList => f.write_str("bookmarkList"),
            InvalidationTag::Namespace(ns) => write!(f, "{}", ns),
            InvalidationTag::Key(k) => write!(f, "{}", k),
        }
    }
}

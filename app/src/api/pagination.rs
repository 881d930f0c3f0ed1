use serde::Deserialize;

/// A list response: either a bare array or a paginated `{results: [...]}` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    Plain(Vec<T>),
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl<T> Listing<T> {
    /// Absolute URL of the following page, if any.
    pub fn next_page(&self) -> Option<&str> {
        match self {
            Listing::Page(page) => page.next.as_deref(),
            Listing::Plain(_) => None,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page(page) => page.results,
            Listing::Plain(items) => items,
        }
    }
}

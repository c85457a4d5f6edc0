//! Author catalog model.

use serde::{Deserialize, Serialize};

/// What an author's catalog page lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogPage {
    /// Author name from the page header, if the header was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Release slugs in page order.
    #[serde(default)]
    pub slugs: Vec<String>,
}

impl CatalogPage {
    /// Whether the catalog lists no releases.
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

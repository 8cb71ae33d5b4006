//! Links to ogte pages.

use std::fmt;

use serde::{Serialize, Serializer};

/// A URL to a page under the site root, with ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    base: String,
    path: String,
    params: Vec<(String, String)>,
}

impl PageUrl {
    /// `wwwroot` is the site root without a trailing slash; `path` starts with `/`.
    pub fn new(wwwroot: &str, path: &str) -> Self {
        Self {
            base: wwwroot.trim_end_matches('/').to_string(),
            path: path.to_string(),
            params: Vec::new(),
        }
    }

    /// A link relative to the activity's own directory, e.g. `edit.php`.
    pub fn module_page(wwwroot: &str, page: &str) -> Self {
        Self::new(wwwroot, &format!("/mod/ogte/{}", page))
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The path and query, without the site root.
    pub fn local(&self) -> String {
        format!("{}{}", self.path, self.query())
    }

    fn query(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("?{}", pairs.join("&"))
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.base, self.path, self.query())
    }
}

impl Serialize for PageUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

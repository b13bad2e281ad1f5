//! Query-string state store.
//!
//! The address bar is the only persistent home of the product form's
//! selection. [`QueryStateStore`] abstracts reading and writing it so the
//! synchronizer does not care whether the URL ends up in an `HX-Replace-Url`
//! header, an inline `history.replaceState` call, or a test double.

use url::form_urlencoded;

/// Get/set/replace access to URL query parameters.
pub trait QueryStateStore {
    /// Value of the first parameter named `key`.
    fn get(&self, key: &str) -> Option<&str>;

    /// Set `key` to `value`, with `URLSearchParams.set` semantics.
    fn set(&mut self, key: &str, value: &str);

    /// Replace the current history entry with the updated URL, without
    /// adding a navigation entry.
    fn replace(&mut self);
}

/// Query state for one request, parsed from and serialized to a URL.
///
/// Parameters keep their original order. `replace` does not touch any
/// browser state directly; it records the URL to hand back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlQueryStore {
    path: String,
    params: Vec<(String, String)>,
    replaced: Option<String>,
}

impl UrlQueryStore {
    /// Parse a raw query string (without the leading `?`).
    #[must_use]
    pub fn parse(path: impl Into<String>, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            path: path.into(),
            params: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            replaced: None,
        }
    }

    /// Query parameters of an absolute URL such as the `HX-Current-URL`
    /// header, attached to `path`. Returns `None` if `url` does not parse.
    #[must_use]
    pub fn from_current_url(path: impl Into<String>, url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        Some(Self::parse(path, parsed.query().unwrap_or_default()))
    }

    /// Serialized query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Path plus query, as it should appear in the address bar.
    #[must_use]
    pub fn href(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{query}", self.path)
        }
    }

    /// URL recorded by the last `replace`, if any happened.
    #[must_use]
    pub fn replaced_url(&self) -> Option<&str> {
        self.replaced.as_deref()
    }

    /// Parameters in order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl QueryStateStore for UrlQueryStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        let mut found = false;
        self.params.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            value.clone_into(v);
            true
        });
        if !found {
            self.params.push((key.to_string(), value.to_string()));
        }
    }

    fn replace(&mut self) {
        self.replaced = Some(self.href());
    }
}

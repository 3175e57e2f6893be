//! Ordered, multi-valued header map for the response side of the bridge.
//!
//! Middleware chains both replace headers (`set`) and accumulate them
//! (`append`, e.g. `Set-Cookie`), so the map preserves insertion order and
//! duplicate names. Lookups are case-insensitive.

/// An ordered collection of HTTP headers with duplicate names allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replace every value for `name` with a single entry.
    ///
    /// Keeps the position of the first existing entry; appends when the
    /// header was not present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut replaced = false;
        self.entries.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(&name) {
                if replaced {
                    false
                } else {
                    *v = value.clone();
                    replaced = true;
                    true
                }
            } else {
                true
            }
        });
        if !replaced {
            self.entries.push((name, value));
        }
    }

    /// Add a value for `name`, keeping any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name` (case-insensitive), if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name` (case-insensitive), in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Remove every value for `name` (case-insensitive).
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_case_insensitive() {
        let mut map = HeaderMap::new();
        map.set("Content-Type", "text/html");
        assert_eq!(map.get("content-type"), Some("text/html"));
        assert_eq!(map.get("Content-Type"), Some("text/html"));
    }

    #[test]
    fn get_missing_returns_none() {
        let map = HeaderMap::new();
        assert_eq!(map.get("X-Missing"), None);
        assert!(!map.contains("X-Missing"));
    }

    #[test]
    fn set_replaces_all_existing_values() {
        let mut map = HeaderMap::new();
        map.append("X-Tag", "a");
        map.append("X-Tag", "b");
        map.set("x-tag", "c");

        assert_eq!(map.get_all("X-Tag"), vec!["c"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn append_keeps_duplicates_in_order() {
        let mut map = HeaderMap::new();
        map.append("Set-Cookie", "a=1");
        map.append("Set-Cookie", "b=2");

        assert_eq!(map.get("Set-Cookie"), Some("a=1"));
        assert_eq!(map.get_all("set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn remove_drops_every_value() {
        let mut map = HeaderMap::new();
        map.append("X-Tag", "a");
        map.append("x-tag", "b");
        map.set("Other", "keep");
        map.remove("X-TAG");

        assert_eq!(map.get("x-tag"), None);
        assert_eq!(map.get("other"), Some("keep"));
    }

    #[test]
    fn set_preserves_first_position() {
        let mut map = HeaderMap::new();
        map.append("A", "1");
        map.append("B", "2");
        map.set("a", "3");

        let entries = map.into_vec();
        assert_eq!(entries[0], ("A".to_string(), "3".to_string()));
        assert_eq!(entries[1], ("B".to_string(), "2".to_string()));
    }

    #[test]
    fn from_iterator_of_pairs() {
        let map: HeaderMap = vec![("Host", "example.com"), ("Accept", "*/*")]
            .into_iter()
            .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("host"), Some("example.com"));
    }
}

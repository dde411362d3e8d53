use std::collections::BTreeMap;

/// Case-insensitive header map.
///
/// Header names are lowercased on insert, so `Content-Type` and
/// `content-type` address the same entry. Iteration order is the sorted
/// lowercase name, which keeps merge results deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any existing value under the same
    /// (case-insensitive) name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Merge `overrides` on top of `self` into a new map.
    ///
    /// Neither input is mutated. Entries from `overrides` win per name;
    /// name comparison is case-insensitive because both maps hold
    /// lowercased keys.
    #[must_use]
    pub fn merged(&self, overrides: &Headers) -> Headers {
        let mut out = self.clone();
        for (name, value) in overrides.iter() {
            out.insert(name, value);
        }
        out
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut out = Headers::new();
        for (name, value) in iter {
            out.insert(name, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_lowercases_names() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");

        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn merged_override_wins_case_insensitively() {
        let base: Headers = [("Accept", "text/plain"), ("X-Keep", "yes")]
            .into_iter()
            .collect();
        let overrides: Headers = [("ACCEPT", "application/json")].into_iter().collect();

        let merged = base.merged(&overrides);
        assert_eq!(merged.get("accept"), Some("application/json"));
        assert_eq!(merged.get("x-keep"), Some("yes"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merged_does_not_mutate_inputs() {
        let base: Headers = [("a", "1")].into_iter().collect();
        let overrides: Headers = [("a", "2"), ("b", "3")].into_iter().collect();

        let _ = base.merged(&overrides);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.len(), 1);
        assert_eq!(overrides.len(), 2);
    }
}

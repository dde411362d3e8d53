use std::collections::HashMap;

use parking_lot::Mutex;

use crate::response::Response;

/// Tag-keyed response cache, owned by one client instance.
///
/// Entries live until explicitly invalidated or the instance is discarded;
/// there is no eviction or TTL. Two concurrent calls sharing a tag can
/// both miss, both dispatch and both write; the cache guarantees at most
/// one cached result, not at most one in-flight request.
#[derive(Default)]
pub struct TagCache {
    entries: Mutex<HashMap<String, Response>>,
}

impl TagCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Response> {
        self.entries.lock().get(tag).cloned()
    }

    pub fn set(&self, tag: &str, response: &Response) {
        self.entries.lock().insert(tag.to_owned(), response.clone());
    }

    /// Drop the entry under `tag`. A no-op when the tag is absent.
    pub fn invalidate(&self, tag: &str) {
        if self.entries.lock().remove(tag).is_some() {
            tracing::debug!(tag, "invalidated cached response");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::headers::Headers;
    use crate::response::Data;
    use http::StatusCode;

    fn envelope(data: &str) -> Response {
        Response {
            status: StatusCode::OK,
            status_text: "OK".into(),
            config: RequestConfig::default(),
            data: Data::Text(data.into()),
            headers: Headers::new(),
            url: "http://example.test/".into(),
            body: None,
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = TagCache::new();
        cache.set("list", &envelope("cached"));

        let hit = cache.get("list").expect("entry should be present");
        assert_eq!(hit.data, Data::Text("cached".into()));
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = TagCache::new();
        cache.set("list", &envelope("cached"));
        cache.invalidate("list");
        assert!(cache.get("list").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_absent_tag_is_noop() {
        let cache = TagCache::new();
        cache.invalidate("nothing");
        assert!(cache.is_empty());
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = TagCache::new();
        cache.set("list", &envelope("old"));
        cache.set("list", &envelope("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("list").unwrap().data, Data::Text("new".into()));
    }
}

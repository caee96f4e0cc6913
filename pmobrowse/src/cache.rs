use std::collections::HashMap;

/// Object id of the ContentDirectory root container.
pub const ROOT_CONTAINER_ID: &str = "0";

/// Session map from a browsing path to the ContentDirectory container id
/// that lists it.
///
/// Keys are path segments joined with `/`; the root is the empty key and
/// always resolves to [`ROOT_CONTAINER_ID`]. The first id recorded for a key
/// wins. Nothing is ever evicted, [`PathContainerCache::reset`] clears the
/// whole map.
#[derive(Clone, Debug, Default)]
pub struct PathContainerCache {
    ids: HashMap<String, String>,
}

impl PathContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_for<S: AsRef<str>>(path: &[S]) -> String {
        path.iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Container id to browse for `path`, the root id when unknown.
    pub fn container_id<S: AsRef<str>>(&self, path: &[S]) -> String {
        let key = Self::key_for(path);
        self.ids
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ROOT_CONTAINER_ID.to_string())
    }

    /// Records the id of child `name` of `path` unless one is already known.
    /// Returns whether the id was stored.
    pub fn record<S: AsRef<str>>(&mut self, path: &[S], name: &str, id: &str) -> bool {
        let mut key = Self::key_for(path);
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(name);

        if self.ids.contains_key(&key) {
            return false;
        }
        self.ids.insert(key, id.to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key.is_empty() {
            return Some(self.ids.get(key).map_or(ROOT_CONTAINER_ID, String::as_str));
        }
        self.ids.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn reset(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_maps_to_zero() {
        let cache = PathContainerCache::new();
        let root: [&str; 0] = [];
        assert_eq!(cache.container_id(&root), "0");
        assert_eq!(cache.get(""), Some("0"));
        assert!(cache.is_empty());
    }

    #[test]
    fn first_recorded_id_wins() {
        let mut cache = PathContainerCache::new();
        assert!(cache.record(&["Movies"], "Action", "64$1"));
        assert!(!cache.record(&["Movies"], "Action", "99"));
        assert_eq!(cache.get("Movies/Action"), Some("64$1"));
        assert_eq!(cache.container_id(&["Movies", "Action"]), "64$1");
    }

    #[test]
    fn unknown_paths_fall_back_to_root() {
        let cache = PathContainerCache::new();
        assert_eq!(cache.container_id(&["Nowhere"]), ROOT_CONTAINER_ID);
        assert_eq!(cache.get("Nowhere"), None);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut cache = PathContainerCache::new();
        let root: [String; 0] = [];
        cache.record(&root, "Music", "1");
        assert_eq!(cache.len(), 1);
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.get("Music"), None);
    }
}

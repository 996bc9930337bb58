//! Request store
//!
//! Keyed mapping from request id to request, plus an incrementally
//! maintained index of the types each origin currently has pending.

use super::error::{ApprovalError, ApprovalResult};
use super::types::ApprovalRequest;
use std::collections::{BTreeMap, HashMap, HashSet};

pub struct ApprovalStore {
    requests: HashMap<String, ApprovalRequest>,
    /// origin -> effective types pending for that origin
    origins: HashMap<String, HashSet<String>>,
    default_type: String,
}

impl ApprovalStore {
    pub fn new(default_type: impl Into<String>) -> Self {
        Self {
            requests: HashMap::new(),
            origins: HashMap::new(),
            default_type: default_type.into(),
        }
    }

    /// Insert a request, enforcing id and (origin, type) uniqueness.
    pub fn insert(&mut self, request: ApprovalRequest) -> ApprovalResult<()> {
        if self.requests.contains_key(&request.id) {
            return Err(ApprovalError::IdCollision {
                id: request.id.clone(),
            });
        }

        let effective_type = request.effective_type(&self.default_type).to_string();
        if self.has_origin_type(&request.origin, &effective_type) {
            // the default type is reported without a type clause
            let request_type = if effective_type == self.default_type {
                None
            } else {
                Some(effective_type)
            };
            return Err(ApprovalError::OriginTypeCollision {
                origin: request.origin.clone(),
                request_type,
            });
        }

        self.origins
            .entry(request.origin.clone())
            .or_default()
            .insert(effective_type);
        self.requests.insert(request.id.clone(), request);
        Ok(())
    }

    /// Remove a request by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<ApprovalRequest> {
        let request = self.requests.remove(id)?;

        let effective_type = request.effective_type(&self.default_type);
        if let Some(types) = self.origins.get_mut(&request.origin) {
            types.remove(effective_type);
            if types.is_empty() {
                self.origins.remove(&request.origin);
            }
        }
        Some(request)
    }

    pub fn get(&self, id: &str) -> Option<&ApprovalRequest> {
        self.requests.get(id)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.requests.contains_key(id)
    }

    pub fn has_origin(&self, origin: &str) -> bool {
        self.origins.contains_key(origin)
    }

    pub fn has_origin_type(&self, origin: &str, request_type: &str) -> bool {
        self.origins
            .get(origin)
            .map(|types| types.contains(request_type))
            .unwrap_or(false)
    }

    /// Current id -> request mapping, ordered by id.
    pub fn snapshot(&self) -> BTreeMap<String, ApprovalRequest> {
        self.requests
            .iter()
            .map(|(id, request)| (id.clone(), request.clone()))
            .collect()
    }

    /// Remove every request, returning them in id order.
    pub fn drain(&mut self) -> Vec<ApprovalRequest> {
        self.origins.clear();
        let mut drained: Vec<ApprovalRequest> =
            self.requests.drain().map(|(_, request)| request).collect();
        drained.sort_by(|a, b| a.id.cmp(&b.id));
        drained
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::DEFAULT_APPROVAL_TYPE;

    fn request(id: &str, origin: &str, request_type: Option<&str>) -> ApprovalRequest {
        ApprovalRequest {
            id: id.to_string(),
            origin: origin.to_string(),
            request_type: request_type.map(str::to_string),
            request_data: None,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = ApprovalStore::new(DEFAULT_APPROVAL_TYPE);
        store.insert(request("foo", "bar.baz", None)).unwrap();

        assert!(store.has_id("foo"));
        assert!(store.has_origin("bar.baz"));
        assert!(store.has_origin_type("bar.baz", DEFAULT_APPROVAL_TYPE));
        assert!(!store.has_origin_type("bar.baz", "myType"));
        assert_eq!(store.get("foo").map(|r| r.origin.as_str()), Some("bar.baz"));
    }

    #[test]
    fn test_id_collision_checked_before_origin_type() {
        let mut store = ApprovalStore::new(DEFAULT_APPROVAL_TYPE);
        store.insert(request("foo", "bar.baz", None)).unwrap();

        let err = store.insert(request("foo", "bar.baz", None)).unwrap_err();
        assert_eq!(err, ApprovalError::IdCollision { id: "foo".into() });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_explicit_sentinel_collides_with_omitted_type() {
        let mut store = ApprovalStore::new(DEFAULT_APPROVAL_TYPE);
        store.insert(request("foo", "bar.baz", None)).unwrap();

        let err = store
            .insert(request("foo1", "bar.baz", Some(DEFAULT_APPROVAL_TYPE)))
            .unwrap_err();
        assert_eq!(
            err,
            ApprovalError::OriginTypeCollision {
                origin: "bar.baz".into(),
                request_type: None
            }
        );
        assert_eq!(
            err.to_string(),
            "Request already pending for origin bar.baz. Please wait."
        );
    }

    #[test]
    fn test_remove_keeps_other_types_of_origin() {
        let mut store = ApprovalStore::new(DEFAULT_APPROVAL_TYPE);
        store.insert(request("foo1", "bar.baz", None)).unwrap();
        store.insert(request("foo2", "bar.baz", Some("myType"))).unwrap();

        assert!(store.remove("foo1").is_some());
        assert!(store.has_origin("bar.baz"));
        assert!(!store.has_origin_type("bar.baz", DEFAULT_APPROVAL_TYPE));

        assert!(store.remove("foo2").is_some());
        assert!(!store.has_origin("bar.baz"));
        assert!(store.remove("foo2").is_none());
    }

    #[test]
    fn test_drain_empties_index() {
        let mut store = ApprovalStore::new(DEFAULT_APPROVAL_TYPE);
        store.insert(request("b", "one", None)).unwrap();
        store.insert(request("a", "two", None)).unwrap();

        let drained = store.drain();
        assert_eq!(
            drained.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(store.is_empty());
        assert!(!store.has_origin("one"));
        assert!(store.snapshot().is_empty());
    }
}

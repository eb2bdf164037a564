use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::domain::solution::SolveStatus;
use crate::models::{SolveRequest, SolveResponse};

/// Bounded memo of solve responses keyed by the canonical request JSON.
///
/// The key is the full serialized request, so two requests share an entry
/// only when they serialize identically.
///
/// Only proven optima are stored: a run stopped by its time limit could
/// return a different incumbent next time.
pub struct SolutionCache {
    entries: Mutex<LruCache<String, SolveResponse>>,
}

impl SolutionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        SolutionCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, request: &SolveRequest) -> Option<SolveResponse> {
        let key = request_key(request)?;
        self.entries.lock().get(&key).cloned()
    }

    /// Store `response` if it is reproducible. Returns whether it was stored.
    pub fn put(&self, request: &SolveRequest, response: &SolveResponse) -> bool {
        if response.solution.status != SolveStatus::Optimal {
            return false;
        }
        match request_key(request) {
            Some(key) => {
                self.entries.lock().put(key, response.clone());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn request_key(request: &SolveRequest) -> Option<String> {
    serde_json::to_string(request).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solution::Solution;
    use crate::domain::variant::Variant;
    use serde_json::json;

    fn request(p: usize) -> SolveRequest {
        serde_json::from_value(json!({
            "instance": {
                "num_centers": p,
                "source": { "kind": "coordinates", "points": [[0.0, 0.0], [1.0, 0.0]] }
            },
            "variant": "classical"
        }))
        .unwrap()
    }

    fn response(status: SolveStatus) -> SolveResponse {
        SolveResponse {
            solver: "GLPK".to_string(),
            variant: Variant::Classical,
            time_limit_secs: None,
            solution: Solution::empty(Variant::Classical, status, "Optimal"),
        }
    }

    #[test]
    fn test_get_given_identical_request_should_return_stored_response() {
        let cache = SolutionCache::new(NonZeroUsize::new(4).unwrap());
        assert!(cache.is_empty());
        assert!(cache.put(&request(1), &response(SolveStatus::Optimal)));
        assert_eq!(cache.get(&request(1)), Some(response(SolveStatus::Optimal)));
        assert_eq!(cache.get(&request(2)), None);
    }

    #[test]
    fn test_put_given_time_limited_solution_should_not_store() {
        let cache = SolutionCache::new(NonZeroUsize::new(4).unwrap());
        assert!(!cache.put(&request(1), &response(SolveStatus::TimeLimitFeasible)));
        assert!(!cache.put(&request(1), &response(SolveStatus::NoSolution)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_given_full_cache_should_evict_least_recent() {
        let cache = SolutionCache::new(NonZeroUsize::new(1).unwrap());
        cache.put(&request(1), &response(SolveStatus::Optimal));
        cache.put(&request(2), &response(SolveStatus::Optimal));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&request(1)), None);
        assert!(cache.get(&request(2)).is_some());
    }

    #[test]
    fn test_put_should_key_entries_on_full_request_json() {
        let cache = SolutionCache::new(NonZeroUsize::new(4).unwrap());
        cache.put(&request(1), &response(SolveStatus::Optimal));

        let canonical = serde_json::to_string(&request(1)).unwrap();
        assert!(canonical.contains("\"points\""));
        assert!(cache.entries.lock().contains(&canonical));
    }
}

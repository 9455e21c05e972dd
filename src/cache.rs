//! Small bounded memoization cache used by the content device (§4.2) for
//! `_find_parent` and `try_open_dir`-style lookups. Unlike the archive cache,
//! these lookups don't need single-flight dedup, so a miss simply computes
//! the value with the lock released — a benign race may recompute once.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use parking_lot::Mutex;

struct Inner<K, V> {
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().map.get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        if !inner.map.contains_key(&key) {
            while inner.map.len() >= inner.capacity {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.map.remove(&oldest);
                    }
                    None => break,
                }
            }
            inner.order.push_back(key.clone());
        }
        inner.map.insert(key, value);
    }

    pub fn get_or_insert_with(&self, key: K, produce: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let v = produce();
        self.insert(key, v.clone());
        v
    }
}

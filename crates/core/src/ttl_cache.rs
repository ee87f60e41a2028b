// Hearth is an open source community crowdfunding platform.
// Copyright (C) 2024 Hearth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
    time::{Duration, Instant},
};

/// Bounded map whose entries expire after a fixed time-to-live.
///
/// Expired entries are evicted lazily on lookup; there is no background
/// sweeper. When the cache is full, the oldest insertions are dropped first.
/// State is process-local with no cross-instance invalidation.
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_size: usize,
    entries: HashMap<K, (V, Instant)>,
    insertion_order: VecDeque<K>,
}

impl<K: Hash + Eq + Clone, V> TtlCache<K, V> {
    pub fn with_ttl_and_max_size(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.prune();

        if self.entries.insert(key.clone(), (value, Instant::now())).is_some() {
            self.insertion_order.retain(|k| k != &key);
        }

        self.insertion_order.push_back(key);
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some((_, inserted_at)) => inserted_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            self.insertion_order.retain(|k| k != key);
            return None;
        }

        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    fn prune(&mut self) {
        while self.entries.len() >= self.max_size {
            let Some(front) = self.insertion_order.pop_front() else {
                break;
            };
            self.entries.remove(&front);
        }

        while let Some(front) = self.insertion_order.front() {
            match self.entries.get(front) {
                Some((_, inserted_at)) if inserted_at.elapsed() >= self.ttl => {
                    let front = self.insertion_order.pop_front().unwrap();
                    self.entries.remove(&front);
                }
                _ => break,
            }
        }
    }
}

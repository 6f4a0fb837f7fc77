/*
* Copyright (C) 2019-2023 EverX. All Rights Reserved.
*
* Licensed under the SOFTWARE EVALUATION License (the "License"); you may not use
* this file except in compliance with the License.
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific EVERX DEV software governing permissions and
* limitations under the License.
*/

use crate::{
    common::{ExtractStatus, StatusObject},
    dht::{TARGET, key::{Key, XorMetric}}
};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Random number source injected into a bucket
pub type RandomSource = Box<dyn Fn() -> u64>;

/// Value stored in a bucket
pub trait BucketValue: ExtractStatus {
    /// Key the value is stored under
    fn id(&self) -> &Key;
    /// True if this value carries strictly fresher data than `other`
    fn is_newer_than(&self, other: &Self) -> bool;
}

/// DHT node table ordered by distance from the local identity.
///
/// Nearest-neighbour searches never tie: XOR with a fixed target is a bijection,
/// so distinct keys always have distinct distances to it.
pub struct Bucket<V: BucketValue> {
    metric: XorMetric,
    // Keyed by distance from the local identity
    nodes: BTreeMap<Key, V>,
    random: RandomSource
}

impl<V: BucketValue> Bucket<V> {

    /// Constructor
    pub fn new(us: Key, random: impl Fn() -> u64 + 'static) -> Self {
        Self {
            metric: XorMetric::new(us),
            nodes: BTreeMap::new(),
            random: Box::new(random)
        }
    }

    /// Constructor with thread-local RNG as random source
    pub fn with_thread_rng(us: Key) -> Self {
        Self::new(us, || rand::thread_rng().gen())
    }

    /// Local identity
    pub fn us(&self) -> &Key {
        self.metric.pivot()
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear()
    }

    pub fn get(&self, key: &Key) -> Option<&V> {
        self.nodes.get(&self.metric.distance(key))
    }

    /// Values in order of distance from the local identity
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.nodes.values()
    }

    fn keys(&self) -> impl Iterator<Item = &Key> {
        self.nodes.values().map(|val| val.id())
    }

    /// Insert node; an existing entry is replaced only by a strictly newer value.
    /// Returns true if the value was stored
    pub fn put_node(&mut self, val: V) -> bool {
        let slot = self.metric.distance(val.id());
        if let Some(old) = self.nodes.get(&slot) {
            if !val.is_newer_than(old) {
                log::trace!(target: TARGET, "Keep stored node {}, update is not newer", val.id());
                return false
            }
        }
        self.nodes.insert(slot, val);
        true
    }

    /// Remove node if present
    pub fn del_node(&mut self, key: &Key) -> bool {
        self.nodes.remove(&self.metric.distance(key)).is_some()
    }

    pub fn has_node(&self, key: &Key) -> bool {
        self.nodes.contains_key(&self.metric.distance(key))
    }

    /// Stored key closest to `target`, none if bucket is empty
    pub fn find_closest(&self, target: &Key) -> Option<Key> {
        self.keys().min_by_key(|key| *key ^ target).cloned()
    }

    /// Stored key closest to `target` which is not in `exclude`
    pub fn find_close_excluding(&self, target: &Key, exclude: &BTreeSet<Key>) -> Option<Key> {
        self.keys()
            .filter(|key| !exclude.contains(*key))
            .min_by_key(|key| *key ^ target)
            .cloned()
    }

    /// `n` distinct stored keys nearest to `target`, none of them in `exclude`.
    /// Partial picks are discarded if fewer than `n` candidates exist
    pub fn get_many_near_excluding(
        &self,
        target: &Key,
        n: usize,
        exclude: &BTreeSet<Key>
    ) -> Option<BTreeSet<Key>> {
        let mut skip = exclude.clone();
        let mut ret = BTreeSet::new();
        while ret.len() < n {
            let Some(peer) = self.find_close_excluding(target, &skip) else {
                log::debug!(
                    target: TARGET,
                    "Not enough DHT nodes near {}, have {} want {}",
                    target, ret.len(), n
                );
                return None
            };
            skip.insert(peer);
            ret.insert(peer);
        }
        Some(ret)
    }

    /// Uniformly drawn stored key which is not in `exclude`
    pub fn get_random_node_excluding(&self, exclude: &BTreeSet<Key>) -> Option<Key> {
        let candidates = self.keys()
            .filter(|key| !exclude.contains(*key))
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return None
        }
        let index = self.random_index(candidates.len());
        Some(*candidates[index])
    }

    /// `n` distinct stored keys drawn uniformly
    pub fn get_many_random(&self, n: usize) -> Option<BTreeSet<Key>> {
        if self.nodes.len() < n {
            log::warn!(target: TARGET, "Not enough DHT nodes, have {} want {}", self.nodes.len(), n);
            return None
        }
        if self.nodes.len() == n {
            return Some(self.keys().cloned().collect())
        }
        // Partial Fisher-Yates: first n slots end up holding a uniform sample
        let mut keys = self.keys().collect::<Vec<_>>();
        for i in 0..n {
            let j = i + self.random_index(keys.len() - i);
            keys.swap(i, j);
        }
        Some(keys.into_iter().take(n).cloned().collect())
    }

    fn random_index(&self, len: usize) -> usize {
        ((self.random)() % len as u64) as usize
    }

}

impl<V: BucketValue> ExtractStatus for Bucket<V> {
    fn extract_status(&self) -> StatusObject {
        let mut obj = serde_json::Map::new();
        for val in self.nodes.values() {
            obj.insert(val.id().to_hex(), val.extract_status());
        }
        StatusObject::Object(obj)
    }
}

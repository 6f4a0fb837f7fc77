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

use hsdht::{
    common::ExtractStatus,
    dht::{Bucket, BucketValue, IntroSetNode, Key, RouterNode}
};
use proptest::prelude::*;
use std::{cell::Cell, collections::BTreeSet, rc::Rc};

use test_utils::{
    address, init_test_log, introset, key_with_last_byte, seeded_random, TestNode
};

fn bucket_with(us: Key, keys: &[Key], seed: u64) -> Bucket<TestNode> {
    let mut bucket = Bucket::new(us, seeded_random(seed));
    for key in keys {
        bucket.put_node(TestNode::new(*key, 0));
    }
    bucket
}

#[test]
fn test_find_closest_scenario() {
    init_test_log();
    let a = Key::filled(0x01);
    let b = Key::filled(0x02);
    let c = Key::filled(0xff);
    let bucket = bucket_with(Key::filled(0), &[a, b, c], 1);
    assert_eq!(bucket.find_closest(&Key::filled(0x03)), Some(b));
    assert_eq!(bucket.find_closest(&Key::filled(0xfe)), Some(c));
    let exclude = [b].into_iter().collect();
    assert_eq!(bucket.find_close_excluding(&Key::filled(0x03), &exclude), Some(a));
    let exclude = [a, b, c].into_iter().collect();
    assert_eq!(bucket.find_close_excluding(&Key::filled(0x03), &exclude), None)
}

#[test]
fn test_empty_bucket() {
    let bucket = bucket_with(Key::random(), &[], 1);
    assert!(bucket.is_empty());
    assert_eq!(bucket.find_closest(&Key::random()), None);
    assert_eq!(bucket.find_close_excluding(&Key::random(), &BTreeSet::new()), None);
    assert_eq!(bucket.get_random_node_excluding(&BTreeSet::new()), None);
    assert_eq!(bucket.get_many_random(1), None);
    assert_eq!(bucket.get_many_random(0), Some(BTreeSet::new()));
    assert_eq!(bucket.get_many_near_excluding(&Key::random(), 1, &BTreeSet::new()), None);
    assert_eq!(bucket.extract_status(), serde_json::json!({}))
}

#[test]
fn test_put_node_freshness() {
    let key = Key::filled(0x42);
    let mut bucket = bucket_with(Key::filled(0), &[], 1);
    assert!(bucket.put_node(TestNode::new(key, 5)));
    assert!(!bucket.put_node(TestNode::new(key, 3)));
    assert_eq!(bucket.get(&key).map(|node| node.version), Some(5));
    // Tie keeps the stored entry
    assert!(!bucket.put_node(TestNode::new(key, 5)));
    assert!(bucket.put_node(TestNode::new(key, 6)));
    assert_eq!(bucket.get(&key).map(|node| node.version), Some(6));
    assert_eq!(bucket.size(), 1)
}

#[test]
fn test_del_and_has_node() {
    let a = Key::filled(0x10);
    let b = Key::filled(0x20);
    let mut bucket = bucket_with(Key::filled(0x11), &[a, b], 1);
    assert!(bucket.has_node(&a));
    assert!(bucket.del_node(&a));
    assert!(!bucket.has_node(&a));
    assert!(!bucket.del_node(&a));
    assert!(bucket.has_node(&b));
    bucket.clear();
    assert_eq!(bucket.size(), 0)
}

#[test]
fn test_iteration_follows_distance_from_us() {
    let us = Key::filled(0xf0);
    let keys = [Key::filled(0x00), Key::filled(0xf1), Key::filled(0x80), Key::filled(0xff)];
    let bucket = bucket_with(us, &keys, 1);
    let order = bucket.iter().map(|node| node.id).collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![Key::filled(0xf1), Key::filled(0xff), Key::filled(0x80), Key::filled(0x00)]
    );
    assert_eq!(bucket.us(), &us)
}

#[test]
fn test_get_many_near_excluding() {
    let keys = (1..=8).map(key_with_last_byte).collect::<Vec<_>>();
    let bucket = bucket_with(Key::filled(0xff), &keys, 1);
    let target = key_with_last_byte(0);
    let exclude = [key_with_last_byte(1)].into_iter().collect();
    let near = bucket.get_many_near_excluding(&target, 3, &exclude).unwrap();
    let expected = (2..=4).map(key_with_last_byte).collect::<BTreeSet<_>>();
    assert_eq!(near, expected);
    // Not enough candidates: nothing is returned
    assert_eq!(bucket.get_many_near_excluding(&target, 8, &exclude), None);
    assert_eq!(bucket.get_many_near_excluding(&target, 0, &exclude), Some(BTreeSet::new()))
}

#[test]
fn test_get_random_node_excluding() {
    let keys = (1..=5).map(key_with_last_byte).collect::<Vec<_>>();
    let bucket = bucket_with(Key::default(), &keys, 7);
    let exclude = (1..=4).map(key_with_last_byte).collect::<BTreeSet<_>>();
    for _ in 0..20 {
        assert_eq!(bucket.get_random_node_excluding(&exclude), Some(key_with_last_byte(5)));
    }
    let exclude = keys.iter().cloned().collect();
    assert_eq!(bucket.get_random_node_excluding(&exclude), None);
    let mut seen = BTreeSet::new();
    for _ in 0..200 {
        seen.insert(bucket.get_random_node_excluding(&BTreeSet::new()).unwrap());
    }
    assert_eq!(seen.len(), 5)
}

#[test]
fn test_random_source_is_used() {
    let calls = Rc::new(Cell::new(0u64));
    let counter = calls.clone();
    let mut bucket = Bucket::new(
        Key::default(),
        move || {
            counter.set(counter.get() + 1);
            0
        }
    );
    for i in 1..=4 {
        bucket.put_node(TestNode::new(key_with_last_byte(i), 0));
    }
    // Index 0 of candidates in distance order from us
    assert_eq!(bucket.get_random_node_excluding(&BTreeSet::new()), Some(key_with_last_byte(1)));
    assert_eq!(calls.get(), 1);
    let picked = bucket.get_many_random(2).unwrap();
    assert_eq!(picked.len(), 2);
    assert_eq!(calls.get(), 3)
}

#[test]
fn test_get_many_random() {
    let keys = (1..=10).map(key_with_last_byte).collect::<Vec<_>>();
    let bucket = bucket_with(Key::random(), &keys, 3);
    assert_eq!(bucket.get_many_random(11), None);
    let all = bucket.get_many_random(10).unwrap();
    assert_eq!(all, keys.iter().cloned().collect::<BTreeSet<_>>());
    for n in 1..10 {
        let picked = bucket.get_many_random(n).unwrap();
        assert_eq!(picked.len(), n);
        assert!(picked.iter().all(|key| bucket.has_node(key)));
    }
}

#[test]
fn test_extract_status() {
    let mut bucket = Bucket::with_thread_rng(Key::default());
    bucket.put_node(RouterNode::new(Key::filled(0x01), 1000));
    bucket.put_node(RouterNode::new(Key::filled(0x01), 500));
    let status = bucket.extract_status();
    let entry = &status[Key::filled(0x01).to_hex()];
    assert_eq!(entry["lastUpdated"], 1000);
    assert_eq!(entry["router"], Key::filled(0x01).to_hex())
}

#[test]
fn test_introset_nodes() {
    let addr = address(0x33);
    let mut bucket = Bucket::with_thread_rng(Key::default());
    assert!(bucket.put_node(IntroSetNode::new(introset(addr, 2000, 50000))));
    assert!(!bucket.put_node(IntroSetNode::new(introset(addr, 1000, 60000))));
    assert!(bucket.put_node(IntroSetNode::new(introset(addr, 3000, 70000))));
    let stored = bucket.get(&addr.dht_key()).unwrap();
    assert_eq!(stored.introset().timestamp(), 3000);
    assert_eq!(stored.id(), &addr.dht_key());
    let status = bucket.extract_status();
    assert_eq!(status[addr.dht_key().to_hex()]["introset"]["timestamp"], 3000)
}

fn keys_strategy() -> impl Strategy<Value = Vec<Key>> {
    prop::collection::vec(prop::array::uniform32(any::<u8>()), 0..40)
        .prop_map(|keys| keys.into_iter().map(Key::from_data).collect())
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop::array::uniform32(any::<u8>()).prop_map(Key::from_data)
}

proptest! {

    #[test]
    fn prop_find_closest_is_minimal(keys in keys_strategy(), us in key_strategy(), target in key_strategy()) {
        let bucket = bucket_with(us, &keys, 1);
        match bucket.find_closest(&target) {
            None => prop_assert!(keys.is_empty()),
            Some(found) => {
                prop_assert!(bucket.has_node(&found));
                for key in keys.iter() {
                    prop_assert!((found ^ target) <= (*key ^ target));
                }
            }
        }
    }

    #[test]
    fn prop_find_close_excluding(
        keys in keys_strategy(),
        target in key_strategy(),
        mask in prop::collection::vec(any::<bool>(), 40)
    ) {
        let bucket = bucket_with(Key::default(), &keys, 1);
        let exclude = keys.iter()
            .zip(mask.iter())
            .filter(|(_, skip)| **skip)
            .map(|(key, _)| *key)
            .collect::<BTreeSet<_>>();
        let rest = keys.iter().filter(|key| !exclude.contains(*key)).collect::<Vec<_>>();
        match bucket.find_close_excluding(&target, &exclude) {
            None => prop_assert!(rest.is_empty()),
            Some(found) => {
                prop_assert!(!exclude.contains(&found));
                for key in rest {
                    prop_assert!((found ^ target) <= (*key ^ target));
                }
            }
        }
    }

    #[test]
    fn prop_get_many_near_excluding(
        keys in keys_strategy(),
        target in key_strategy(),
        n in 0usize..10,
        skip in 0usize..5
    ) {
        let bucket = bucket_with(Key::default(), &keys, 1);
        let exclude = keys.iter().take(skip).cloned().collect::<BTreeSet<_>>();
        let available = bucket.size() - bucket.iter().filter(|node| exclude.contains(&node.id)).count();
        match bucket.get_many_near_excluding(&target, n, &exclude) {
            None => prop_assert!(available < n),
            Some(near) => {
                prop_assert_eq!(near.len(), n);
                prop_assert!(near.is_disjoint(&exclude));
                let farthest = near.iter().map(|key| *key ^ target).max();
                if let Some(farthest) = farthest {
                    for node in bucket.iter() {
                        if !near.contains(&node.id) && !exclude.contains(&node.id) {
                            prop_assert!((node.id ^ target) > farthest);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn prop_get_many_random(keys in keys_strategy(), n in 0usize..45, seed in any::<u64>()) {
        let bucket = bucket_with(Key::default(), &keys, seed);
        let size = bucket.size();
        match bucket.get_many_random(n) {
            None => prop_assert!(size < n),
            Some(picked) => {
                prop_assert_eq!(picked.len(), n);
                prop_assert!(picked.iter().all(|key| bucket.has_node(key)));
            }
        }
    }

    #[test]
    fn prop_put_node_never_regresses(key in key_strategy(), v1 in any::<u32>(), v2 in any::<u32>()) {
        let mut bucket = bucket_with(Key::default(), &[], 1);
        bucket.put_node(TestNode::new(key, v1));
        bucket.put_node(TestNode::new(key, v2));
        prop_assert_eq!(bucket.get(&key).map(|node| node.version), Some(v1.max(v2)));
        bucket.del_node(&key);
        prop_assert!(!bucket.has_node(&key));
    }

}

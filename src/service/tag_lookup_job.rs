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
    common::{is_elapsed, ExtractStatus, Millis, StatusObject},
    service::{
        TARGET, Endpoint, Tag, intro_set::IntroSet,
        lookup::{LookupBase, LookupTable, ServiceLookup},
        message::{DhtMessage, FindIntroMessage, RoutingMessage}
    }
};
use std::{cell::RefCell, collections::{BTreeSet, HashMap}, rc::Rc};

/// Cached introsets published under one subscription tag
pub struct CachedTagResult {
    tag: Tag,
    endpoint: Rc<dyn Endpoint>,
    last_request: Millis,
    last_modified: Millis,
    result: BTreeSet<IntroSet>
}

impl CachedTagResult {

    pub const TTL: Millis = 10000;

    pub fn new(tag: Tag, endpoint: Rc<dyn Endpoint>) -> Self {
        Self {
            tag,
            endpoint,
            last_request: 0,
            last_modified: 0,
            result: BTreeSet::new()
        }
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn result(&self) -> &BTreeSet<IntroSet> {
        &self.result
    }

    pub fn last_request(&self) -> Millis {
        self.last_request
    }

    pub fn last_modified(&self) -> Millis {
        self.last_modified
    }

    /// Drop cached introsets with expired introductions
    pub fn expire(&mut self, now: Millis) {
        let tag = &self.tag;
        self.result.retain(
            |introset| if introset.has_expired_intros(now) {
                log::info!(
                    target: TARGET,
                    "Removing expired tag entry {} for {}",
                    introset.address(), tag
                );
                false
            } else {
                true
            }
        )
    }

    /// Clock regression never triggers refresh
    pub fn should_refresh(&self, now: Millis) -> bool {
        is_elapsed(now, self.last_request, Self::TTL)
    }

    /// Stamps `now` as the last request time
    pub fn build_request_message(&mut self, txid: u64, now: Millis) -> RoutingMessage {
        self.last_request = now;
        RoutingMessage::dht(DhtMessage::FindIntro(FindIntroMessage::for_tag(txid, self.tag)))
    }

    /// Replace cached introsets with the received ones.
    /// Records are kept whatever their topic is: the responder decides what matches the tag
    pub fn handle_response(&mut self, results: &BTreeSet<IntroSet>) -> bool {
        let now = self.endpoint.now();
        self.result = results.clone();
        self.last_modified = now;
        log::info!(
            target: TARGET,
            "Tag result for {} got {} results from lookup at {}",
            self.tag, self.result.len(), now
        );
        true
    }

}

impl ExtractStatus for CachedTagResult {
    fn extract_status(&self) -> StatusObject {
        let result = self.result.iter().map(
            |introset| introset.extract_status()
        ).collect::<Vec<_>>();
        serde_json::json!({
            "tag": self.tag.to_string(),
            "lastRequest": self.last_request,
            "lastModified": self.last_modified,
            "result": result
        })
    }
}

/// Lookup refreshing one cached tag result
pub struct TagLookupJob {
    base: LookupBase,
    requested_at: Millis,
    result: Rc<RefCell<CachedTagResult>>
}

impl TagLookupJob {

    pub const NAME: &'static str = "TagLookup";

    pub fn new(endpoint: Rc<dyn Endpoint>, result: Rc<RefCell<CachedTagResult>>, txid: u64) -> Self {
        let now = endpoint.now();
        Self::with_request_time(endpoint, result, txid, now)
    }

    /// Job whose request is stamped with `requested_at` instead of endpoint time
    pub fn with_request_time(
        endpoint: Rc<dyn Endpoint>,
        result: Rc<RefCell<CachedTagResult>>,
        txid: u64,
        requested_at: Millis
    ) -> Self {
        Self {
            base: LookupBase::new(endpoint, txid, Self::NAME),
            requested_at,
            result
        }
    }

}

impl ServiceLookup for TagLookupJob {

    fn base(&self) -> &LookupBase {
        &self.base
    }

    fn build_request_message(&mut self) -> RoutingMessage {
        self.result.borrow_mut().build_request_message(self.base.txid(), self.requested_at)
    }

    /// Topic of received records is not checked against the tag
    fn handle_response(self: Box<Self>, results: &BTreeSet<IntroSet>) -> bool {
        self.result.borrow_mut().handle_response(results)
    }

    fn handle_timeout(self: Box<Self>) -> bool {
        // Cached introsets stay until their own expiry
        log::debug!(
            target: TARGET,
            "Tag lookup for {} timed out, keeping cached result",
            self.result.borrow().tag()
        );
        false
    }

}

/// Tag subscriptions of one endpoint
pub struct TagCache {
    endpoint: Rc<dyn Endpoint>,
    tags: HashMap<Tag, Rc<RefCell<CachedTagResult>>>
}

impl TagCache {

    pub fn new(endpoint: Rc<dyn Endpoint>) -> Self {
        Self {
            endpoint,
            tags: HashMap::new()
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Start caching tag; returns false if already subscribed
    pub fn subscribe(&mut self, tag: Tag) -> bool {
        if self.tags.contains_key(&tag) {
            return false
        }
        log::debug!(target: TARGET, "{} subscribed to tag {}", self.endpoint.name(), tag);
        self.tags.insert(
            tag,
            Rc::new(RefCell::new(CachedTagResult::new(tag, self.endpoint.clone())))
        );
        true
    }

    /// Stop caching tag; returns false if not subscribed
    pub fn unsubscribe(&mut self, tag: &Tag) -> bool {
        self.tags.remove(tag).is_some()
    }

    pub fn get(&self, tag: &Tag) -> Option<Rc<RefCell<CachedTagResult>>> {
        self.tags.get(tag).cloned()
    }

    /// Expire cached introsets and start refresh lookups where TTL has elapsed.
    /// Refreshes are stamped with `now`. Returns (txid, request) pairs for the transport
    pub fn tick(&mut self, now: Millis, lookups: &mut LookupTable) -> Vec<(u64, RoutingMessage)> {
        for cached in self.tags.values() {
            cached.borrow_mut().expire(now);
        }
        let mut ret = Vec::new();
        for cached in self.tags.values() {
            if !cached.borrow().should_refresh(now) {
                continue
            }
            let txid = lookups.next_txid();
            let job = TagLookupJob::with_request_time(
                self.endpoint.clone(), cached.clone(), txid, now
            );
            match lookups.put_lookup(Box::new(job)) {
                Ok(msg) => ret.push((txid, msg)),
                Err(e) => {
                    // Remaining refreshes wait for the next tick
                    log::warn!(target: TARGET, "Cannot refresh tag {}: {}", cached.borrow().tag(), e);
                    break
                }
            }
        }
        ret
    }

}

impl ExtractStatus for TagCache {
    fn extract_status(&self) -> StatusObject {
        let mut obj = serde_json::Map::new();
        for (tag, cached) in self.tags.iter() {
            obj.insert(tag.to_string(), cached.borrow().extract_status());
        }
        StatusObject::Object(obj)
    }
}

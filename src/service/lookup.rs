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
    fail,
    common::{is_elapsed, ExtractStatus, Millis, Result, StatusObject},
    config::LookupConfig,
    service::{TARGET, Endpoint, intro_set::IntroSet, message::RoutingMessage}
};
use rand::Rng;
use std::{collections::{BTreeSet, HashMap}, rc::Rc};

/// Fields shared by every lookup job
pub struct LookupBase {
    endpoint: Rc<dyn Endpoint>,
    txid: u64,
    name: &'static str,
    created: Millis
}

impl LookupBase {

    pub fn new(endpoint: Rc<dyn Endpoint>, txid: u64, name: &'static str) -> Self {
        let created = endpoint.now();
        Self {
            endpoint,
            txid,
            name,
            created
        }
    }

    pub fn endpoint(&self) -> &Rc<dyn Endpoint> {
        &self.endpoint
    }

    pub fn txid(&self) -> u64 {
        self.txid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn created(&self) -> Millis {
        self.created
    }

}

/// One-shot lookup correlating an outbound query with its reply
pub trait ServiceLookup {
    fn base(&self) -> &LookupBase;
    /// Build request, called once at send time
    fn build_request_message(&mut self) -> RoutingMessage;
    /// Consume the reply; returns whether the outcome was accepted
    fn handle_response(self: Box<Self>, results: &BTreeSet<IntroSet>) -> bool;
    /// No reply arrived in time; by default it is a definitive negative answer
    fn handle_timeout(self: Box<Self>) -> bool {
        self.handle_response(&BTreeSet::new())
    }
    fn txid(&self) -> u64 {
        self.base().txid()
    }
    fn name(&self) -> &str {
        self.base().name()
    }
    fn is_timed_out(&self, now: Millis, timeout: Millis) -> bool {
        is_elapsed(now, self.base().created(), timeout)
    }
}

/// Pending lookups keyed by transaction ID
pub struct LookupTable {
    config: LookupConfig,
    pending: HashMap<u64, Box<dyn ServiceLookup>>
}

impl LookupTable {

    pub fn new() -> Self {
        Self::with_config(LookupConfig::default())
    }

    pub fn with_config(config: LookupConfig) -> Self {
        Self {
            config,
            pending: HashMap::new()
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, txid: u64) -> bool {
        self.pending.contains_key(&txid)
    }

    /// Random transaction ID not used by any pending lookup
    pub fn next_txid(&self) -> u64 {
        loop {
            let txid: u64 = rand::thread_rng().gen();
            if (txid != 0) && !self.pending.contains_key(&txid) {
                break txid
            }
        }
    }

    /// Register lookup and build its request for the transport
    pub fn put_lookup(&mut self, mut job: Box<dyn ServiceLookup>) -> Result<RoutingMessage> {
        let txid = job.txid();
        if self.pending.contains_key(&txid) {
            fail!("Lookup {} with txid {} is already pending", job.name(), txid)
        }
        if self.pending.len() >= self.config.max_pending_lookups {
            fail!(
                "Too many pending lookups ({}), cannot add {} txid {}",
                self.pending.len(), job.name(), txid
            )
        }
        let msg = job.build_request_message();
        log::debug!(target: TARGET, "Sending {} lookup txid {}", job.name(), txid);
        self.pending.insert(txid, job);
        Ok(msg)
    }

    /// Deliver reply to the lookup with given transaction ID.
    /// Returns none if no such lookup is pending
    pub fn handle_reply(&mut self, txid: u64, results: &BTreeSet<IntroSet>) -> Option<bool> {
        let Some(job) = self.pending.remove(&txid) else {
            log::debug!(target: TARGET, "Reply for unknown lookup txid {}", txid);
            return None
        };
        log::debug!(
            target: TARGET,
            "Reply for {} lookup txid {} with {} introset(s)",
            job.name(), txid, results.len()
        );
        Some(job.handle_response(results))
    }

    /// Drop pending lookup without answering it
    pub fn cancel(&mut self, txid: u64) -> bool {
        self.pending.remove(&txid).is_some()
    }

    /// Finish timed out lookups; returns count of expired
    pub fn expire(&mut self, now: Millis) -> usize {
        let timeout = self.config.lookup_timeout_ms;
        let expired = self.pending.iter()
            .filter(|(_, job)| job.is_timed_out(now, timeout))
            .map(|(txid, _)| *txid)
            .collect::<Vec<_>>();
        for txid in expired.iter() {
            if let Some(job) = self.pending.remove(txid) {
                log::info!(target: TARGET, "{} lookup txid {} timed out", job.name(), txid);
                job.handle_timeout();
            }
        }
        expired.len()
    }

}

impl Default for LookupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractStatus for LookupTable {
    fn extract_status(&self) -> StatusObject {
        let mut obj = serde_json::Map::new();
        for (txid, job) in self.pending.iter() {
            obj.insert(
                txid.to_string(),
                serde_json::json!({
                    "name": job.name(),
                    "endpoint": job.base().endpoint().name(),
                    "created": job.base().created()
                })
            );
        }
        StatusObject::Object(obj)
    }
}

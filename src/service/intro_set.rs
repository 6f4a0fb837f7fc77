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
    common::{ExtractStatus, Millis, StatusObject},
    dht::Key,
    service::{Address, Tag}
};

/// Path through which a service can be reached
#[derive(
    Clone, Debug, Eq, Ord, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize
)]
pub struct Introduction {
    pub router: Key,
    pub path_id: u64,
    pub expires_at: Millis,
    pub latency: Millis
}

impl Introduction {
    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.expires_at
    }
}

/// Reachability records published by a hidden service
#[derive(
    Clone, Debug, Eq, Ord, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize
)]
pub struct IntroSet {
    address: Address,
    timestamp: Millis,
    topic: Option<Tag>,
    intros: Vec<Introduction>
}

impl IntroSet {

    pub fn new(address: Address, timestamp: Millis) -> Self {
        Self {
            address,
            timestamp,
            topic: None,
            intros: Vec::new()
        }
    }

    pub fn with_topic(mut self, topic: Tag) -> Self {
        self.topic = Some(topic);
        self
    }

    pub fn with_intro(mut self, intro: Introduction) -> Self {
        self.intros.push(intro);
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn timestamp(&self) -> Millis {
        self.timestamp
    }

    pub fn topic(&self) -> Option<&Tag> {
        self.topic.as_ref()
    }

    pub fn intros(&self) -> &[Introduction] {
        &self.intros
    }

    /// True if `other` was published strictly later than this one
    pub fn other_is_newer(&self, other: &IntroSet) -> bool {
        self.timestamp < other.timestamp
    }

    pub fn has_expired_intros(&self, now: Millis) -> bool {
        self.intros.iter().any(|intro| intro.is_expired(now))
    }

}

impl ExtractStatus for IntroSet {
    fn extract_status(&self) -> StatusObject {
        let intros = self.intros.iter().map(
            |intro| serde_json::json!({
                "router": intro.router.to_hex(),
                "path": intro.path_id,
                "expiresAt": intro.expires_at,
                "latency": intro.latency
            })
        ).collect::<Vec<_>>();
        serde_json::json!({
            "address": self.address.to_string(),
            "timestamp": self.timestamp,
            "topic": self.topic.map(|tag| tag.to_string()),
            "intros": intros
        })
    }
}

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
    dht::{bucket::BucketValue, key::Key},
    service::intro_set::IntroSet
};

/// Router known to the DHT
#[derive(Clone, Debug, PartialEq)]
pub struct RouterNode {
    id: Key,
    last_updated: Millis
}

impl RouterNode {

    pub fn new(id: Key, last_updated: Millis) -> Self {
        Self { id, last_updated }
    }

    pub fn last_updated(&self) -> Millis {
        self.last_updated
    }

}

impl BucketValue for RouterNode {
    fn id(&self) -> &Key {
        &self.id
    }
    fn is_newer_than(&self, other: &Self) -> bool {
        self.last_updated > other.last_updated
    }
}

impl ExtractStatus for RouterNode {
    fn extract_status(&self) -> StatusObject {
        serde_json::json!({
            "router": self.id.to_hex(),
            "lastUpdated": self.last_updated
        })
    }
}

/// Introduction set stored at the DHT location of its service address
#[derive(Clone, Debug, PartialEq)]
pub struct IntroSetNode {
    id: Key,
    introset: IntroSet
}

impl IntroSetNode {

    pub fn new(introset: IntroSet) -> Self {
        Self {
            id: introset.address().dht_key(),
            introset
        }
    }

    pub fn introset(&self) -> &IntroSet {
        &self.introset
    }

}

impl BucketValue for IntroSetNode {
    fn id(&self) -> &Key {
        &self.id
    }
    fn is_newer_than(&self, other: &Self) -> bool {
        other.introset.other_is_newer(&self.introset)
    }
}

impl ExtractStatus for IntroSetNode {
    fn extract_status(&self) -> StatusObject {
        serde_json::json!({
            "introset": self.introset.extract_status()
        })
    }
}

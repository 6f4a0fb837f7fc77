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

use crate::{common::Millis, dht::Key};
use std::fmt::{self, Debug, Display, Formatter};

pub mod hidden_service_address_lookup;
pub mod intro_set;
pub mod lookup;
pub mod message;
pub mod tag_lookup_job;

pub use hidden_service_address_lookup::{AddressLookupHandler, HiddenServiceAddressLookup};
pub use intro_set::{IntroSet, Introduction};
pub use lookup::{LookupBase, LookupTable, ServiceLookup};
pub use message::{DhtMessage, FindIntroMessage, IntroTarget, RoutingMessage};
pub use tag_lookup_job::{CachedTagResult, TagCache, TagLookupJob};

pub const TARGET: &str = "service";

/// Owner of lookups: a hidden service endpoint
pub trait Endpoint {
    /// Endpoint name for logging
    fn name(&self) -> &str;
    /// Current router time
    fn now(&self) -> Millis;
}

/// Hidden service address
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize
)]
pub struct Address([u8; 32]);

impl Address {

    pub fn from_data(data: [u8; 32]) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &[u8; 32] {
        &self.0
    }

    /// Location of the address in the DHT key space
    pub fn dht_key(&self) -> Key {
        Key::from_data(self.0)
    }

}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Subscription tag: short text label zero-padded to 16 bytes
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize
)]
pub struct Tag([u8; 16]);

impl Tag {

    pub const SIZE: usize = 16;

    /// Build tag from text, truncated to 16 bytes
    pub fn new(name: &str) -> Self {
        let mut data = [0u8; Self::SIZE];
        let src = name.as_bytes();
        let len = src.len().min(Self::SIZE);
        data[..len].copy_from_slice(&src[..len]);
        Self(data)
    }

    pub fn data(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|a| *a == 0)
    }

}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let len = self.0.iter().position(|a| *a == 0).unwrap_or(Self::SIZE);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..len]))
    }
}

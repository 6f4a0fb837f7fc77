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

use crate::service::{Address, Tag};
use enum_as_inner::EnumAsInner;

/// What an introduction lookup asks for
#[derive(Clone, Debug, EnumAsInner, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum IntroTarget {
    Address(Address),
    Tag(Tag)
}

/// DHT request for introduction sets
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FindIntroMessage {
    pub txid: u64,
    pub target: IntroTarget,
    pub recursion_depth: u64
}

impl FindIntroMessage {

    /// Address lookups are answered by the node holding the record
    pub fn for_address(txid: u64, address: Address) -> Self {
        Self {
            txid,
            target: IntroTarget::Address(address),
            recursion_depth: 0
        }
    }

    /// Tag lookups are relayed one hop further
    pub fn for_tag(txid: u64, tag: Tag) -> Self {
        Self {
            txid,
            target: IntroTarget::Tag(tag),
            recursion_depth: 1
        }
    }

}

#[derive(Clone, Debug, EnumAsInner, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DhtMessage {
    FindIntro(FindIntroMessage)
}

/// Message handed over to the transport
#[derive(Clone, Debug, EnumAsInner, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RoutingMessage {
    Dht(Vec<DhtMessage>)
}

impl RoutingMessage {

    pub fn dht(msg: DhtMessage) -> Self {
        RoutingMessage::Dht(vec![msg])
    }

    /// Transaction ID of the first DHT request carried
    pub fn txid(&self) -> Option<u64> {
        match self {
            RoutingMessage::Dht(msgs) => msgs.iter().map(
                |msg| match msg {
                    DhtMessage::FindIntro(find) => find.txid
                }
            ).next()
        }
    }

}

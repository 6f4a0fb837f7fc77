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

use crate::service::{
    TARGET, Address, Endpoint, intro_set::IntroSet, lookup::{LookupBase, ServiceLookup},
    message::{DhtMessage, FindIntroMessage, RoutingMessage}
};
use std::{collections::BTreeSet, rc::Rc};

/// Continuation of address lookup: (remote, found introset if any, endpoint) -> accepted
pub type AddressLookupHandler = Box<
    dyn FnOnce(&Address, Option<&IntroSet>, &Rc<dyn Endpoint>) -> bool
>;

/// Resolves hidden service address into its newest introduction set
pub struct HiddenServiceAddressLookup {
    base: LookupBase,
    remote: Address,
    handle: AddressLookupHandler
}

impl HiddenServiceAddressLookup {

    pub const NAME: &'static str = "HSLookup";

    pub fn new(
        endpoint: Rc<dyn Endpoint>,
        handle: impl FnOnce(&Address, Option<&IntroSet>, &Rc<dyn Endpoint>) -> bool + 'static,
        remote: Address,
        txid: u64
    ) -> Self {
        Self {
            base: LookupBase::new(endpoint, txid, Self::NAME),
            remote,
            handle: Box::new(handle)
        }
    }

    pub fn remote(&self) -> &Address {
        &self.remote
    }

    /// Newest introset published by `remote`, records of other addresses never qualify
    fn select<'a>(remote: &Address, results: &'a BTreeSet<IntroSet>) -> Option<&'a IntroSet> {
        let mut selected: Option<&IntroSet> = None;
        for introset in results.iter() {
            if introset.address() != remote {
                log::debug!(
                    target: TARGET,
                    "Discard introset of {} in lookup for {}",
                    introset.address(), remote
                );
                continue
            }
            match selected {
                Some(current) if !current.other_is_newer(introset) => (),
                _ => selected = Some(introset)
            }
        }
        selected
    }

}

impl ServiceLookup for HiddenServiceAddressLookup {

    fn base(&self) -> &LookupBase {
        &self.base
    }

    fn build_request_message(&mut self) -> RoutingMessage {
        RoutingMessage::dht(
            DhtMessage::FindIntro(FindIntroMessage::for_address(self.base.txid(), self.remote))
        )
    }

    fn handle_response(self: Box<Self>, results: &BTreeSet<IntroSet>) -> bool {
        let Self { base, remote, handle } = *self;
        log::info!(target: TARGET, "found {} for {}", results.len(), remote);
        let selected = Self::select(&remote, results);
        if selected.is_none() {
            log::debug!(target: TARGET, "No introset for {}", remote);
        }
        handle(&remote, selected, base.endpoint())
    }

}

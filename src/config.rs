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

use crate::{common::{Millis, Result}, fail};

/// Service lookup settings
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// Age after which a pending lookup is answered negatively
    pub lookup_timeout_ms: Millis,
    /// Limit of concurrently pending lookups
    pub max_pending_lookups: usize
}

impl LookupConfig {

    pub const DEFAULT_LOOKUP_TIMEOUT: Millis = 20000;
    pub const DEFAULT_MAX_PENDING_LOOKUPS: usize = 128;

    /// Parse JSON config, absent fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let ret: LookupConfig = serde_json::from_str(json)?;
        if ret.lookup_timeout_ms == 0 {
            fail!("Lookup timeout must be positive")
        }
        if ret.max_pending_lookups == 0 {
            fail!("At least one pending lookup must be allowed")
        }
        Ok(ret)
    }

}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: Self::DEFAULT_LOOKUP_TIMEOUT,
            max_pending_lookups: Self::DEFAULT_MAX_PENDING_LOOKUPS
        }
    }
}

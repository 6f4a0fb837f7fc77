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

pub type Result<T> = anyhow::Result<T>;

/// Milliseconds on the router clock
pub type Millis = u64;

/// Structured diagnostic snapshot
pub type StatusObject = serde_json::Value;

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::anyhow::anyhow!($($arg)*)
    };
}

#[macro_export]
macro_rules! fail {
    ($($arg:tt)*) => {
        return Err($crate::error!($($arg)*))
    };
}

/// Status snapshot producer
pub trait ExtractStatus {
    fn extract_status(&self) -> StatusObject;
}

/// Elapsed check tolerant to clock regression: `now <= since` is never elapsed
pub fn is_elapsed(now: Millis, since: Millis, period: Millis) -> bool {
    if now <= since {
        return false
    }
    now - since > period
}

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

use rand::Rng;
use std::{
    cmp::Ordering, fmt::{self, Debug, Display, Formatter}, ops::BitXor
};

/// DHT key (coordinate in the key space).
/// Derived ordering compares bytes lexicographically, i.e. as an unsigned
/// big-endian integer.
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize
)]
pub struct Key([u8; 32]);

impl Key {

    pub const SIZE: usize = 32;

    pub fn from_data(data: [u8; 32]) -> Self {
        Self(data)
    }

    /// Key with every byte set to `value`
    pub fn filled(value: u8) -> Self {
        Self([value; 32])
    }

    pub fn random() -> Self {
        Self(rand::thread_rng().gen())
    }

    pub fn data(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn fill(&mut self, value: u8) {
        self.0.iter_mut().for_each(|a| *a = value)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|a| *a == 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

}

impl BitXor for Key {
    type Output = Key;
    fn bitxor(self, other: Key) -> Key {
        &self ^ &other
    }
}

impl BitXor for &Key {
    type Output = Key;
    fn bitxor(self, other: &Key) -> Key {
        let mut ret = [0u8; 32];
        for (i, byte) in ret.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i]
        }
        Key(ret)
    }
}

impl From<[u8; 32]> for Key {
    fn from(data: [u8; 32]) -> Self {
        Self(data)
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Key({})", self.to_hex())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// XOR distance comparator bound to a pivot key for its whole lifetime
#[derive(Clone, Copy, Debug)]
pub struct XorMetric {
    pivot: Key
}

impl XorMetric {

    pub fn new(pivot: Key) -> Self {
        Self { pivot }
    }

    pub fn pivot(&self) -> &Key {
        &self.pivot
    }

    /// Distance of `key` from the pivot
    pub fn distance(&self, key: &Key) -> Key {
        key ^ &self.pivot
    }

    /// Orders `a` and `b` by their distance from the pivot
    pub fn compare(&self, a: &Key, b: &Key) -> Ordering {
        self.distance(a).cmp(&self.distance(b))
    }

}

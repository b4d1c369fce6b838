//! Advertising payload composition.
//!
//! The payload is always rebuilt from scratch: every registered provider is
//! asked for its UUIDs in registration order and the result is capped at
//! `MAX_ADV_UUIDS`. Anything beyond the cap is dropped and only counted.

use crate::ble::{AdvUuid, UuidProvider};
use crate::config::{ADV_FLAGS_LE_ONLY_GENERAL_DISC, MAX_ADV_UUIDS, MAX_UUID_PROVIDERS};
use crate::error::{Error, RegistryKind};
use crate::registry::Registry;
use heapless::Vec;

/// Flags + complete service UUID list. The device name is never included.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingPayload {
    flags: u8,
    uuids: Vec<AdvUuid, MAX_ADV_UUIDS>,
    truncated: usize,
}

impl AdvertisingPayload {
    /// Empty payload: flags only.
    pub const fn new() -> Self {
        Self {
            flags: ADV_FLAGS_LE_ONLY_GENERAL_DISC,
            uuids: Vec::new(),
            truncated: 0,
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn uuids(&self) -> &[AdvUuid] {
        &self.uuids
    }

    pub fn len(&self) -> usize {
        self.uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }

    /// Identifiers providers offered but that did not fit.
    pub fn truncated(&self) -> usize {
        self.truncated
    }
}

impl Default for AdvertisingPayload {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PayloadComposer<'a> {
    providers: Registry<&'a dyn UuidProvider, MAX_UUID_PROVIDERS>,
}

impl<'a> PayloadComposer<'a> {
    pub const fn new() -> Self {
        Self {
            providers: Registry::new(RegistryKind::UuidProvider),
        }
    }

    pub fn register(&mut self, provider: &'a dyn UuidProvider) -> Result<(), Error> {
        self.providers.register(provider)
    }

    /// Build the payload from the current provider set.
    pub fn rebuild(&self) -> AdvertisingPayload {
        let mut payload = AdvertisingPayload::new();

        for provider in self.providers.iter() {
            let mut contributed = Vec::new();
            provider.provide_uuids(&mut contributed);
            for uuid in contributed {
                if payload.uuids.push(uuid).is_err() {
                    payload.truncated += 1;
                }
            }
        }

        if payload.truncated > 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "adv: payload full, dropped {=usize} uuid(s)",
                payload.truncated
            );
        }

        payload
    }
}

impl Default for PayloadComposer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

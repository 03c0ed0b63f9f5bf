// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use rand::{Rng as _, RngCore};
use serde_json::{Map, Value};

use crate::{error::Result, rng};

/// Client-side identifier for a guest record, `GUEST_` and four digits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GuestNumber(String);

impl GuestNumber {
    pub(crate) fn generate(rng: Option<&mut (dyn RngCore + Send)>) -> Self {
        rng::map_option(rng, |rng| Self(format!("GUEST_{}", rng.gen_range(1000..=9999_u32))))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GuestNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whatever the guest dialog collected. The server owns the shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct GuestDetails(Map<String, Value>);

impl GuestDetails {
    pub(crate) fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The record sent to the server, tagged with its guest number.
    pub(crate) fn with_number(&self, number: &GuestNumber) -> Map<String, Value> {
        let mut data = self.0.clone();
        let _ = data.insert(
            "guestNumber".to_owned(),
            Value::String(number.as_str().to_owned()),
        );
        data
    }
}

/// Collects guest details once a guest registration passes validation.
#[async_trait]
pub(crate) trait GuestDialog: Send + Sync {
    /// `None` means the dialog was closed without submitting.
    async fn collect(&self) -> Result<Option<GuestDetails>>;
}

/// A dialog whose answers were given up front, such as on the command line.
pub(crate) struct Preset(Option<GuestDetails>);

impl Preset {
    pub(crate) const fn new(details: Option<GuestDetails>) -> Self {
        Self(details)
    }
}

#[async_trait]
impl GuestDialog for Preset {
    async fn collect(&self) -> Result<Option<GuestDetails>> {
        Ok(self.0.clone())
    }
}

// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use clap::ValueEnum;
use url::Url;

use crate::error::Result;

/// What to do when the username availability check cannot be completed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum UsernameCheckPolicy {
    /// Carry on with registration and let the server reject a duplicate.
    #[default]
    FailOpen,
    /// Refuse to register until availability has been confirmed.
    FailClosed,
}

/// How a role is picked out of the authorities carried by a session token.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum RoleLookup {
    /// Look roles up by name and take the most privileged one.
    #[default]
    Priority,
    /// Expect each role at a fixed index in the authority list, as older
    /// servers issue them.
    Positional,
}

#[derive(Clone, Debug)]
pub(crate) struct Endpoints {
    pub(crate) user_exists: Url,
    pub(crate) user_register: Url,
    pub(crate) guest_add: Url,
    pub(crate) session: Url,
}

impl Endpoints {
    pub(crate) fn new(api_url: &Url, session_url: Option<&Url>) -> Result<Self> {
        let base = directory(api_url);
        Ok(Self {
            user_exists: base.join("user/exists")?,
            user_register: base.join("user/register")?,
            guest_add: base.join("guest/addGuest")?,
            session: match session_url {
                Some(url) => url.clone(),
                None => base.join("login")?,
            },
        })
    }
}

// `Url::join` replaces the last path segment unless the base ends in a slash.
fn directory(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) endpoints: Endpoints,
    pub(crate) username_check: UsernameCheckPolicy,
    pub(crate) role_lookup: RoleLookup,
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        // LINT: Constant input.
        #[allow(clippy::unwrap_used)]
        let api_url = Url::parse("http://localhost:8080").unwrap();
        #[allow(clippy::unwrap_used)]
        let endpoints = Endpoints::new(&api_url, None).unwrap();
        Self {
            endpoints,
            username_check: UsernameCheckPolicy::default(),
            role_lookup: RoleLookup::default(),
        }
    }
}

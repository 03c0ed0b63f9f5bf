// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// LINT: Constant patterns.
#[allow(clippy::expect_used)]
static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("username pattern is valid"));

// `[[:word:]]` keeps `\w` to ASCII, as browsers apply it.
#[allow(clippy::expect_used)]
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[[:word:]]+([.-]?[[:word:]]+)*@[[:word:]]+([.-]?[[:word:]]+)*(\.[[:word:]]{2,3})+$",
    )
    .expect("email pattern is valid")
});

/// A reason to refuse a registration draft before it is sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Invalid {
    #[error("Please enter a valid username (use alphanumeric characters only).")]
    Username,
    #[error("USERNAME ALREADY EXISTS.")]
    UsernameTaken,
    #[error("Could not verify that the username is available. Please try again.")]
    UsernameUnverified,
    #[error("Please enter a password.")]
    Password,
    #[error("Please enter your member number.")]
    MemberNumber,
    #[error("Please enter a valid email address.")]
    Email,
}

pub(crate) fn username(username: &str) -> Result<(), Invalid> {
    if USERNAME.is_match(username) {
        Ok(())
    } else {
        Err(Invalid::Username)
    }
}

pub(crate) fn password(password: &str) -> Result<(), Invalid> {
    if password.is_empty() {
        Err(Invalid::Password)
    } else {
        Ok(())
    }
}

pub(crate) fn member_number(member_number: &str) -> Result<(), Invalid> {
    if member_number.is_empty() {
        Err(Invalid::MemberNumber)
    } else {
        Ok(())
    }
}

pub(crate) fn email(email: &str) -> Result<(), Invalid> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(Invalid::Email)
    }
}

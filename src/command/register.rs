// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;

use crate::{
    error::{self, Result},
    navigation, password,
    registration::{
        guest::{GuestDetails, GuestDialog, Preset},
        Draft, Form, Outcome, UserType,
    },
};

use super::Context;

/// Create a new account.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The kind of account to create.
    #[arg(long = "type", short = 't', value_enum, default_value_t = UserType::Student)]
    user_type: UserType,

    /// The name to sign in with. Letters and digits only.
    #[arg(long, short)]
    username: String,

    /// Student number for students, employee number otherwise. Not used for
    /// guests.
    #[arg(long, short, default_value = "")]
    member_number: String,

    /// Contact email address. Not used for guests.
    #[arg(long, short, default_value = "")]
    email: String,

    /// A detail for the guest record, as KEY=VALUE. Repeat for each detail.
    #[arg(long = "detail", short = 'd', value_parser = parse_detail)]
    details: Vec<(String, String)>,
}

fn parse_detail(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        Some(_) | None => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: Context) -> Result<()> {
        let password =
            password::require(&ctx.prompt, password::Request::new_account(&self.username)).await?;
        let mut form = Form::new(ctx.config, ctx.transport, navigation::Terminal);

        let mut outcome = form
            .submit(Draft {
                user_type: self.user_type,
                username: self.username,
                password,
                member_number: self.member_number,
                email: self.email,
            })
            .await;

        if form.shows_guest_dialog() {
            let details = GuestDetails::from_pairs(self.details);
            let dialog = Preset::new(Some(details).filter(|d| !d.is_empty()));
            outcome = match dialog.collect().await? {
                Some(details) => form.submit_guest(&details).await,
                None => {
                    form.close_guest_dialog();
                    error!("Guest registration needs details; give them with --detail KEY=VALUE");
                    return Err(error::Error::Command);
                }
            };
        }
        debug_assert!(!form.is_submitting());

        match outcome {
            Outcome::Registered | Outcome::GuestRegistered => Ok(()),
            Outcome::AwaitingGuestDetails | Outcome::Rejected(_) => {
                if let Some(message) = form.error_message() {
                    error!("{message}");
                }
                Err(error::Error::Command)
            }
        }
    }
}

// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};

use crate::{
    error::{self, Result},
    navigation, password,
    session::{Credentials, Flow, State},
    storage::IsPersistent as _,
};

use super::Context;

/// Sign in and print the page to open for your role.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The name to sign in with.
    #[arg(long, short)]
    username: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: Context) -> Result<()> {
        if !ctx.storage.is_persistent() {
            warn!("The session will be forgotten when this command exits");
        }

        let password =
            password::require(&ctx.prompt, password::Request::existing(&self.username)).await?;
        let credentials = Credentials {
            username: self.username,
            password,
        };

        let mut flow = Flow::new(ctx.config, ctx.transport, ctx.storage, navigation::Terminal);
        let state = flow.login(&credentials).await?.clone();
        if let State::Authenticated(_) = state {
            Ok(())
        } else {
            if let Some(message) = flow.error_message() {
                error!("{message}");
            }
            Err(error::Error::Command)
        }
    }
}

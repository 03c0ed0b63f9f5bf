// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;

use crate::{error::Result, session, storage::Storage};

use super::Context;

/// Forget the stored session.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    async fn execute(self, mut ctx: Context) -> Result<()> {
        Storage::<session::Data>::clear(&mut ctx.storage).await?;
        info!("Signed out");
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{
    config::Config, error::Result, password::Prompt, session, storage::Storage, transport::Http,
};

pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod register;
pub(crate) mod status;

/// Everything a command may need, assembled once from the arguments.
pub(crate) struct Context {
    pub(crate) config: Config,
    pub(crate) transport: Http,
    pub(crate) storage: Box<dyn Storage<session::Data>>,
    pub(crate) prompt: Box<dyn Prompt>,
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: Context) -> Result<()>;
}

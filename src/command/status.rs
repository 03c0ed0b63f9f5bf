// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table, Tabled};

use crate::{error::Result, session, storage::Storage};

use super::Context;

/// Show who is signed in.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "User ID")]
    user_id: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Page")]
    page: String,
}

impl Row {
    fn new(data: &session::Data, now: u64) -> Self {
        Self {
            role: data
                .role()
                .map_or_else(|| "unknown".to_owned(), |role| role.to_string()),
            user_id: data.user_id().unwrap_or("-").to_owned(),
            expires: match data.expiry() {
                Some(exp) if exp <= now => format!("{exp} (expired)"),
                Some(exp) => exp.to_string(),
                None => "unknown".to_owned(),
            },
            page: data
                .role()
                .map_or_else(|| "-".to_owned(), |role| role.landing().to_string()),
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, mut ctx: Context) -> Result<()> {
        match Storage::<session::Data>::get(&mut ctx.storage).await? {
            Some(data) if !data.token().is_empty() => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |elapsed| elapsed.as_secs());
                println!(
                    "{}",
                    Table::new([Row::new(&data, now)]).with(Style::rounded())
                );
            }
            Some(_) | None => println!("Not signed in."),
        }
        Ok(())
    }
}

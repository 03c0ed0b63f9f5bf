// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod command;
mod config;
mod error;
mod metadata;
mod navigation;
mod password;
mod registration;
mod rng;
mod role;
mod session;
mod storage;
mod token;
mod transport;

use std::{path::PathBuf, process};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::{debug, error, warn};
use url::Url;

use config::{Config, Endpoints, RoleLookup, UsernameCheckPolicy};
use error::Result;

#[derive(Debug, Subcommand)]
enum Command {
    Register(command::register::Command),
    Login(command::login::Command),
    Status(command::status::Command),
    Logout(command::logout::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: command::Context) -> Result<()> {
        match self {
            Self::Register(cmd) => cmd.execute(ctx).await,
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Status(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the violation tracker API.
    #[arg(long, env = "VTRACK_API_URL", default_value = "http://localhost:8080/", value_parser = Url::parse)]
    api_url: Url,

    /// The URL credentials are posted to when signing in. Defaults to the
    /// login endpoint under the API URL.
    #[arg(long, env = "VTRACK_SESSION_URL", value_parser = Url::parse)]
    session_url: Option<Url>,

    /// What to do when the server cannot say whether a username is taken.
    #[arg(long, env = "VTRACK_USERNAME_CHECK", value_enum, default_value_t)]
    username_check: UsernameCheckPolicy,

    /// How to find the role among the authorities granted by the server.
    #[arg(long, env = "VTRACK_ROLE_LOOKUP", value_enum, default_value_t)]
    role_lookup: RoleLookup,

    /// Keep the session in memory only, instead of remembering it between
    /// runs.
    #[arg(long)]
    no_persist_session: bool,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

fn get_session_storage(args: &Args) -> Box<dyn storage::Storage<session::Data>> {
    if !args.no_persist_session {
        if let Some(file_storage) = storage::File::new("session.json") {
            debug!("Storing the session in {}", file_storage.path().display());
            return Box::new(file_storage);
        }
        warn!("We need to fall back to in-memory storage because there is no data directory for this user");
    }

    Box::new(storage::Memory::<session::Data>::new())
}

async fn run(args: Args) -> Result<()> {
    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let ctx = command::Context {
        config: Config {
            endpoints: Endpoints::new(&args.api_url, args.session_url.as_ref())?,
            username_check: args.username_check,
            role_lookup: args.role_lookup,
        },
        transport: transport::Http::new()?,
        storage: get_session_storage(&args),
        prompt: Box::new(prompt),
    };

    command::Command::execute(args.command, ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("VTRACK_LOG", "warn")
        .write_style("VTRACK_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}

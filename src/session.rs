// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{error, info, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    api::{self, Executor as _},
    config::Config,
    error::{self, Result},
    navigation::{Navigator, Route},
    role::{self, Role},
    storage::Storage,
    token::SessionToken,
    transport::{Reply, Transport},
};

pub(crate) const GENERIC_FAILURE: &str = "An error occurred while processing your request.";
pub(crate) const LOGIN_REJECTED: &str = "Login failed. Please check your credentials and try again.";
pub(crate) const MISSING_TOKEN: &str = "The server did not return a session token.";
pub(crate) const UNRECOGNIZED_ROLE: &str = "This account does not have a role that can sign in here.";

/// What the client remembers about a signed-in user. Every value is a string.
///
/// The token fields are kept for every decoded token; `role` and `userId`
/// only appear once the token granted a role this client can route.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Data {
    token: String,
    exp: String,
    #[serde(rename = "tokenDecoded")]
    token_decoded: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl Data {
    fn new(token: &SessionToken, role: Option<Role>, user_id: Option<String>) -> Result<Self> {
        Ok(Self {
            token: token.raw().to_owned(),
            exp: token.expiry().to_string(),
            token_decoded: serde_json::to_string(token.claims())?,
            role: role.map(|role| role.authority().to_owned()),
            user_id,
        })
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Seconds since the Unix epoch, if the stored value is a number.
    pub(crate) fn expiry(&self) -> Option<u64> {
        self.exp.parse().ok()
    }

    pub(crate) fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::from_authority)
    }

    pub(crate) fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

pub(crate) struct Credentials {
    pub(crate) username: String,
    pub(crate) password: SecretString,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum State {
    Idle,
    Submitting,
    Authenticated(Role),
    Failed(String),
}

/// Signs a user in and sends them to the page for their role.
pub(crate) struct Flow<T, S, N> {
    config: Config,
    transport: T,
    storage: S,
    navigator: N,
    state: State,
}

impl<T: Transport, S: Storage<Data>, N: Navigator> Flow<T, S, N> {
    pub(crate) const fn new(config: Config, transport: T, storage: S, navigator: N) -> Self {
        Self {
            config,
            transport,
            storage,
            navigator,
            state: State::Idle,
        }
    }

    /// The message to show beneath the form, if any.
    pub(crate) fn error_message(&self) -> Option<&str> {
        match &self.state {
            State::Failed(message) => Some(message.as_str()),
            State::Idle | State::Submitting | State::Authenticated(_) => None,
        }
    }

    pub(crate) async fn login(&mut self, credentials: &Credentials) -> Result<&State> {
        if let State::Authenticated(role) = self.state {
            warn!("Already signed in as {role}; ignoring another login");
            return Ok(&self.state);
        }

        self.state = State::Submitting;
        self.state = match self.authenticate(credentials).await {
            Ok(Some(role)) => State::Authenticated(role),
            Ok(None) => {
                self.navigator.navigate(Route::Login);
                State::Failed(UNRECOGNIZED_ROLE.to_owned())
            }
            Err(Failure::Rejected(message)) => State::Failed(message),
            Err(Failure::Fault(e)) => {
                self.state = State::Idle;
                return Err(e);
            }
        };
        Ok(&self.state)
    }

    // `Ok(None)` means the server accepted the credentials but granted no role
    // this client knows how to route.
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<Option<Role>, Failure> {
        let reply = match (api::Authenticate {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        })
        .execute(&self.transport, &self.config.endpoints)
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("We could not reach the login service: {e}");
                return Err(Failure::Rejected(GENERIC_FAILURE.to_owned()));
            }
        };

        if reply.is_error() {
            error!("Login failed with status {}", reply.status);
            return Err(Failure::Rejected(
                reply.message().unwrap_or(GENERIC_FAILURE).to_owned(),
            ));
        }
        if !reply.is_ok() {
            error!("Login failed with status {}", reply.status);
            return Err(Failure::Rejected(LOGIN_REJECTED.to_owned()));
        }

        let token = match reply.token.as_deref().map(SessionToken::decode) {
            Some(Ok(token)) => token,
            Some(Err(e)) => {
                error!("We could not read the session token: {e}");
                return Err(Failure::Rejected(GENERIC_FAILURE.to_owned()));
            }
            None => {
                error!("{}", error::Token::Missing);
                return Err(Failure::Rejected(MISSING_TOKEN.to_owned()));
            }
        };

        let (role, user_id) = match role::resolve(self.config.role_lookup, token.authorities()) {
            Some(resolution) if resolution.keeps_user_id => {
                (Some(resolution.role), reply_user_id(&reply))
            }
            Some(resolution) => (Some(resolution.role), None),
            None => {
                warn!(
                    "None of the granted authorities {:?} maps to a known role",
                    token.authorities()
                );
                (None, None)
            }
        };
        self.storage.update(&Data::new(&token, role, user_id)?).await?;

        let Some(role) = role else {
            return Ok(None);
        };
        info!("Signed in as {role}");
        self.navigator.navigate(role.landing());
        Ok(Some(role))
    }
}

enum Failure {
    Rejected(String),
    Fault(error::Error),
}

impl From<error::Error> for Failure {
    fn from(value: error::Error) -> Self {
        Self::Fault(value)
    }
}

fn reply_user_id(reply: &Reply) -> Option<String> {
    match reply.body.get("userId") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        Some(Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_)) | None => {
            warn!("The login reply did not include a user identifier");
            None
        }
    }
}

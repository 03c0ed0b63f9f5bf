// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::Endpoints,
    error::Result,
    transport::{Method, Reply, Request, Transport},
};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub(crate) struct Account<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

/// Member details, keyed on the wire by the kind of member.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Membership<'a> {
    Student {
        #[serde(rename = "studentNumber")]
        number: &'a str,
        email: &'a str,
    },
    Employee {
        #[serde(rename = "employeeNumber")]
        number: &'a str,
        email: &'a str,
    },
    External {
        #[serde(rename = "employeeNumber")]
        number: &'a str,
        email: &'a str,
    },
}

pub(crate) struct UsernameExists<'a> {
    pub(crate) username: &'a str,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub(crate) struct RegisterMember<'a> {
    pub(crate) user: Account<'a>,
    #[serde(flatten)]
    pub(crate) membership: Membership<'a>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddGuest<'a> {
    pub(crate) guest_data: &'a Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GuestReference<'a> {
    pub(crate) guest_number: &'a str,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub(crate) struct RegisterGuest<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
    pub(crate) guest: GuestReference<'a>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub(crate) struct Authenticate<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

#[async_trait]
pub(crate) trait Executor: Sized + Send {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request>;

    async fn execute<T: Transport + ?Sized>(
        self,
        transport: &T,
        endpoints: &Endpoints,
    ) -> Result<Reply> {
        transport.send(self.into_request(endpoints)?).await
    }
}

fn post<T: Serialize>(url: &url::Url, body: &T) -> Result<Request> {
    Ok(Request {
        method: Method::Post,
        url: url.clone(),
        body: Some(serde_json::to_value(body)?),
    })
}

impl Executor for UsernameExists<'_> {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request> {
        let mut url = endpoints.user_exists.clone();
        let _ = url
            .query_pairs_mut()
            .append_pair("username", self.username);
        Ok(Request {
            method: Method::Get,
            url,
            body: None,
        })
    }
}

impl Executor for RegisterMember<'_> {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request> {
        post(&endpoints.user_register, &self)
    }
}

impl Executor for AddGuest<'_> {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request> {
        post(&endpoints.guest_add, &self)
    }
}

impl Executor for RegisterGuest<'_> {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request> {
        post(&endpoints.user_register, &self)
    }
}

impl Executor for Authenticate<'_> {
    fn into_request(self, endpoints: &Endpoints) -> Result<Request> {
        post(&endpoints.session, &self)
    }
}

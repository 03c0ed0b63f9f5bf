// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod guest;
mod validate;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::ValueEnum;
use log::{error, info, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;

use crate::{
    api::{self, Executor as _},
    config::{Config, UsernameCheckPolicy},
    navigation::{Navigator, Route},
    transport::{Reply, Transport},
};

use guest::{GuestDetails, GuestNumber};
use validate::Invalid;

pub(crate) const GENERIC_FAILURE: &str = "An error occurred while processing your request.";
pub(crate) const SERVER_FAILURE: &str = "An error occurred.";
pub(crate) const GUEST_SAVE_FAILED: &str = "Failed to save guest details.";
pub(crate) const GUEST_REGISTER_FAILED: &str = "Failed to register the guest account.";
pub(crate) const GUEST_FAILURE: &str = "An error occurred during guest registration.";
pub(crate) const NO_GUEST_PENDING: &str = "There is no guest registration waiting for details.";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum UserType {
    Student,
    Employee,
    External,
    Guest,
}

/// A registration form as the user filled it in.
#[derive(Clone, Debug)]
pub(crate) struct Draft {
    pub(crate) user_type: UserType,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) member_number: String,
    pub(crate) email: String,
}

impl Draft {
    fn membership(&self) -> Option<api::Membership<'_>> {
        let number = self.member_number.as_str();
        let email = self.email.as_str();
        match self.user_type {
            UserType::Student => Some(api::Membership::Student { number, email }),
            UserType::Employee => Some(api::Membership::Employee { number, email }),
            UserType::External => Some(api::Membership::External { number, email }),
            UserType::Guest => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The account exists and awaits one-time passcode confirmation.
    Registered,
    /// Validation passed for a guest; the guest dialog has to supply details.
    AwaitingGuestDetails,
    /// The guest record and its account were both created.
    GuestRegistered,
    Rejected(String),
}

// Raised for the lifetime of a submission and lowered on drop, so an early
// return or a cancelled future never leaves the form stuck. The guard owns
// its handle on the flag so the form can still be borrowed mutably.
struct Busy(Arc<AtomicBool>);

impl Busy {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The account registration form.
pub(crate) struct Form<T, N> {
    config: Config,
    transport: T,
    navigator: N,
    submitting: Arc<AtomicBool>,
    error_message: Option<String>,
    show_guest_dialog: bool,
    pending_guest: Option<Draft>,
}

impl<T: Transport, N: Navigator> Form<T, N> {
    pub(crate) fn new(config: Config, transport: T, navigator: N) -> Self {
        Self {
            config,
            transport,
            navigator,
            submitting: Arc::new(AtomicBool::new(false)),
            error_message: None,
            show_guest_dialog: false,
            pending_guest: None,
        }
    }

    /// Whether the submit control should be disabled.
    pub(crate) fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub(crate) fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub(crate) const fn shows_guest_dialog(&self) -> bool {
        self.show_guest_dialog
    }

    /// Abandons a guest registration without creating anything.
    pub(crate) fn close_guest_dialog(&mut self) {
        self.show_guest_dialog = false;
        self.pending_guest = None;
    }

    pub(crate) async fn submit(&mut self, draft: Draft) -> Outcome {
        let _busy = Busy::raise(&self.submitting);
        self.error_message = None;

        if let Err(invalid) = self.validate(&draft).await {
            return self.reject(invalid.to_string());
        }

        let membership = match draft.membership() {
            Some(membership) => membership,
            None => {
                info!("Waiting for guest details for {}", draft.username);
                self.pending_guest = Some(draft);
                self.show_guest_dialog = true;
                return Outcome::AwaitingGuestDetails;
            }
        };

        let result = api::RegisterMember {
            user: api::Account {
                username: &draft.username,
                password: draft.password.expose_secret(),
            },
            membership,
        }
        .execute(&self.transport, &self.config.endpoints)
        .await;

        match result {
            Ok(reply) if reply.is_ok() => {
                info!("Registered {}", draft.username);
                self.navigator.navigate(Route::AccountOtp);
                Outcome::Registered
            }
            Ok(reply) => {
                warn!("Registration refused with status {}", reply.status);
                let fallback = if reply.is_error() {
                    GENERIC_FAILURE
                } else {
                    SERVER_FAILURE
                };
                self.reject(reply.message().unwrap_or(fallback).to_owned())
            }
            Err(e) => {
                error!("We could not submit the registration: {e}");
                self.reject(GENERIC_FAILURE.to_owned())
            }
        }
    }

    /// Finishes a guest registration with the details from the guest dialog.
    pub(crate) async fn submit_guest(&mut self, details: &GuestDetails) -> Outcome {
        let Some(draft) = self.pending_guest.take() else {
            return self.reject(NO_GUEST_PENDING.to_owned());
        };
        let _busy = Busy::raise(&self.submitting);
        self.error_message = None;

        let outcome = self.register_guest(&draft, details).await;
        if outcome == Outcome::GuestRegistered {
            self.show_guest_dialog = false;
            self.navigator.navigate(Route::Login);
        } else {
            self.pending_guest = Some(draft);
        }
        outcome
    }

    async fn register_guest(&mut self, draft: &Draft, details: &GuestDetails) -> Outcome {
        // Guests skip the availability check until there is something to
        // register.
        if let Err(invalid) = self.check_availability(&draft.username).await {
            return self.reject(invalid.to_string());
        }

        let number = GuestNumber::generate(None);
        let added = api::AddGuest {
            guest_data: &details.with_number(&number),
        }
        .execute(&self.transport, &self.config.endpoints)
        .await;
        match added {
            Ok(reply) if reply.is_ok() => {}
            Ok(reply) => {
                warn!("Saving guest {number} failed with status {}", reply.status);
                return self.reject(GUEST_SAVE_FAILED.to_owned());
            }
            Err(e) => {
                error!("We could not save guest {number}: {e}");
                return self.reject(GUEST_FAILURE.to_owned());
            }
        }

        let registered = api::RegisterGuest {
            username: &draft.username,
            password: draft.password.expose_secret(),
            guest: api::GuestReference {
                guest_number: number.as_str(),
            },
        }
        .execute(&self.transport, &self.config.endpoints)
        .await;
        match registered {
            Ok(reply) if reply.is_ok() => {
                info!("Registered guest {} as {number}", draft.username);
                Outcome::GuestRegistered
            }
            Ok(reply) => {
                warn!(
                    "Registering guest {number} failed with status {}; the guest record is left without an account",
                    reply.status
                );
                self.reject(GUEST_REGISTER_FAILED.to_owned())
            }
            Err(e) => {
                error!("We could not register guest {number}, whose record is left without an account: {e}");
                self.reject(GUEST_FAILURE.to_owned())
            }
        }
    }

    async fn validate(&self, draft: &Draft) -> Result<(), Invalid> {
        validate::username(&draft.username)?;
        if draft.user_type != UserType::Guest {
            self.check_availability(&draft.username).await?;
        }
        validate::password(draft.password.expose_secret())?;
        if draft.user_type != UserType::Guest {
            validate::member_number(&draft.member_number)?;
            validate::email(&draft.email)?;
        }
        Ok(())
    }

    async fn check_availability(&self, username: &str) -> Result<(), Invalid> {
        let reply = api::UsernameExists { username }
            .execute(&self.transport, &self.config.endpoints)
            .await;
        match reply {
            Ok(Reply {
                status: 200,
                body: Value::Bool(true),
                ..
            }) => Err(Invalid::UsernameTaken),
            Ok(reply) if reply.is_ok() => Ok(()),
            Ok(reply) => self.unverified(&format!("status {}", reply.status)),
            Err(e) => self.unverified(&e.to_string()),
        }
    }

    fn unverified(&self, cause: &str) -> Result<(), Invalid> {
        error!("Error checking username existence: {cause}");
        match self.config.username_check {
            UsernameCheckPolicy::FailOpen => Ok(()),
            UsernameCheckPolicy::FailClosed => Err(Invalid::UsernameUnverified),
        }
    }

    fn reject(&mut self, message: String) -> Outcome {
        self.error_message = Some(message.clone());
        Outcome::Rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use crate::{
        error::Result,
        navigation::testing::History,
        transport::{testing::Scripted, Method, Request},
    };

    use super::*;

    fn draft(user_type: UserType) -> Draft {
        Draft {
            user_type,
            username: "ab1".to_owned(),
            password: SecretString::new("secret".to_owned()),
            member_number: "2021001".to_owned(),
            email: "a@b.co".to_owned(),
        }
    }

    fn new_form(transport: Scripted) -> (Form<Scripted, History>, History) {
        let history = History::default();
        (
            Form::new(Config::for_tests(), transport, history.clone()),
            history,
        )
    }

    fn guest_details() -> GuestDetails {
        GuestDetails::from_pairs([("name", "Ada Lovelace"), ("purpose", "Campus tour")])
    }

    #[tokio::test]
    async fn student_registration() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(200, Value::Null);
        let (mut form, history) = new_form(transport);

        assert_eq!(form.submit(draft(UserType::Student)).await, Outcome::Registered);
        assert_eq!(history.routes(), [Route::AccountOtp]);
        assert_eq!(form.error_message(), None);
        assert!(!form.is_submitting());

        let requests = form.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(
            requests[0].url.as_str(),
            "http://localhost:8080/user/exists?username=ab1"
        );
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(
            requests[1].body,
            Some(json!({
                "user": { "username": "ab1", "password": "secret" },
                "student": { "studentNumber": "2021001", "email": "a@b.co" },
            })),
        );
    }

    #[tokio::test]
    async fn employee_registration_uses_employee_number() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(200, Value::Null);
        let (mut form, _) = new_form(transport);

        assert_eq!(form.submit(draft(UserType::Employee)).await, Outcome::Registered);
        assert_eq!(
            form.transport.requests()[1].body,
            Some(json!({
                "user": { "username": "ab1", "password": "secret" },
                "employee": { "employeeNumber": "2021001", "email": "a@b.co" },
            })),
        );
    }

    #[tokio::test]
    async fn invalid_username_makes_no_calls() {
        for username in ["", "ab 1", "ab_1", "ab1!"] {
            let (mut form, history) = new_form(Scripted::new());
            let mut d = draft(UserType::Student);
            d.username = username.to_owned();

            assert_eq!(
                form.submit(d).await,
                Outcome::Rejected(Invalid::Username.to_string())
            );
            assert!(form.transport.requests().is_empty());
            assert!(history.routes().is_empty());
            assert!(!form.is_submitting());
        }
    }

    #[tokio::test]
    async fn taken_username() {
        let (mut form, _) = new_form(Scripted::new().reply(200, json!(true)));

        assert_eq!(
            form.submit(draft(UserType::Student)).await,
            Outcome::Rejected("USERNAME ALREADY EXISTS.".to_owned())
        );
        assert_eq!(form.error_message(), Some("USERNAME ALREADY EXISTS."));
        assert_eq!(form.transport.paths(), ["/user/exists"]);
    }

    #[tokio::test]
    async fn truthy_non_boolean_does_not_block() {
        let transport = Scripted::new()
            .reply(200, json!("yes"))
            .reply(200, Value::Null);
        let (mut form, _) = new_form(transport);

        assert_eq!(form.submit(draft(UserType::Student)).await, Outcome::Registered);
    }

    #[tokio::test]
    async fn missing_fields_rejected_before_register() {
        let cases: [(fn(&mut Draft), Invalid); 3] = [
            (|d| d.password = SecretString::new(String::new()), Invalid::Password),
            (|d| d.member_number.clear(), Invalid::MemberNumber),
            (|d| d.email = "not-an-email".to_owned(), Invalid::Email),
        ];
        for (edit, invalid) in cases {
            let (mut form, _) = new_form(Scripted::new().reply(200, json!(false)));
            let mut d = draft(UserType::External);
            edit(&mut d);

            assert_eq!(form.submit(d).await, Outcome::Rejected(invalid.to_string()));
            assert_eq!(form.transport.paths(), ["/user/exists"]);
            assert!(!form.is_submitting());
        }
    }

    #[tokio::test]
    async fn availability_check_fails_open() {
        let transport = Scripted::new().fail().reply(200, Value::Null);
        let (mut form, history) = new_form(transport);

        assert_eq!(form.submit(draft(UserType::Student)).await, Outcome::Registered);
        assert_eq!(form.transport.paths(), ["/user/exists", "/user/register"]);
        assert_eq!(history.routes(), [Route::AccountOtp]);
    }

    #[tokio::test]
    async fn availability_check_fails_closed() {
        let mut config = Config::for_tests();
        config.username_check = UsernameCheckPolicy::FailClosed;
        let mut form = Form::new(config, Scripted::new().reply(503, Value::Null), History::default());

        assert_eq!(
            form.submit(draft(UserType::Student)).await,
            Outcome::Rejected(Invalid::UsernameUnverified.to_string())
        );
        assert_eq!(form.transport.paths(), ["/user/exists"]);
    }

    #[tokio::test]
    async fn server_message_is_shown_verbatim() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(400, json!({ "message": "USERNAME ALREADY EXISTS." }));
        let (mut form, history) = new_form(transport);

        let _ = form.submit(draft(UserType::Student)).await;
        assert_eq!(form.error_message(), Some("USERNAME ALREADY EXISTS."));
        assert!(history.routes().is_empty());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn server_failure_without_message() {
        for (status, body) in [
            (400, Value::Null),
            (500, Value::String("Internal Server Error".to_owned())),
        ] {
            let transport = Scripted::new().reply(200, json!(false)).reply(status, body);
            let (mut form, _) = new_form(transport);

            let _ = form.submit(draft(UserType::Student)).await;
            assert_eq!(form.error_message(), Some(GENERIC_FAILURE));
        }
    }

    #[tokio::test]
    async fn unexpected_success_status() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(202, Value::Null)
            .reply(200, json!(false))
            .reply(202, json!({ "message": "Pending review" }));
        let (mut form, history) = new_form(transport);

        let _ = form.submit(draft(UserType::Student)).await;
        assert_eq!(form.error_message(), Some(SERVER_FAILURE));
        let _ = form.submit(draft(UserType::Student)).await;
        assert_eq!(form.error_message(), Some("Pending review"));
        assert!(history.routes().is_empty());
    }

    #[tokio::test]
    async fn unreachable_register() {
        let transport = Scripted::new().reply(200, json!(false)).fail();
        let (mut form, _) = new_form(transport);

        let _ = form.submit(draft(UserType::Student)).await;
        assert_eq!(form.error_message(), Some(GENERIC_FAILURE));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn resubmission_is_not_deduplicated() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(200, Value::Null)
            .reply(200, json!(false))
            .reply(200, Value::Null);
        let (mut form, history) = new_form(transport);

        assert_eq!(form.submit(draft(UserType::Student)).await, Outcome::Registered);
        assert_eq!(form.submit(draft(UserType::Student)).await, Outcome::Registered);
        assert_eq!(
            form.transport.paths(),
            ["/user/exists", "/user/register", "/user/exists", "/user/register"]
        );
        assert_eq!(history.routes(), [Route::AccountOtp, Route::AccountOtp]);
    }

    struct FlagProbe {
        inner: Scripted,
        flag: Arc<AtomicBool>,
        seen: std::sync::Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl Transport for FlagProbe {
        async fn send(&self, req: Request) -> Result<Reply> {
            self.seen
                .lock()
                .unwrap()
                .push(self.flag.load(Ordering::SeqCst));
            self.inner.send(req).await
        }
    }

    #[tokio::test]
    async fn submit_flag_raised_while_in_flight() {
        let flag = Arc::new(AtomicBool::new(false));
        let probe = FlagProbe {
            inner: Scripted::new().reply(200, json!(false)).fail(),
            flag: Arc::clone(&flag),
            seen: std::sync::Mutex::default(),
        };
        let mut form = Form::new(Config::for_tests(), probe, History::default());
        form.submitting = flag;

        let _ = form.submit(draft(UserType::Student)).await;
        assert_eq!(*form.transport.seen.lock().unwrap(), [true, true]);
        assert!(!form.is_submitting());
    }

    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        async fn send(&self, _req: Request) -> Result<Reply> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn submit_flag_lowered_when_abandoned() {
        let mut form = Form::new(Config::for_tests(), Stalled, History::default());

        tokio::select! {
            biased;
            _ = form.submit(draft(UserType::Student)) => panic!("a stalled request completed"),
            () = std::future::ready(()) => {}
        }
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn guest_waits_for_dialog() {
        let (mut form, history) = new_form(Scripted::new());
        let mut d = draft(UserType::Guest);
        d.member_number.clear();
        d.email.clear();

        assert_eq!(form.submit(d).await, Outcome::AwaitingGuestDetails);
        assert!(form.shows_guest_dialog());
        assert!(form.transport.requests().is_empty());
        assert!(history.routes().is_empty());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn guest_still_needs_password() {
        let (mut form, _) = new_form(Scripted::new());
        let mut d = draft(UserType::Guest);
        d.password = SecretString::new(String::new());

        assert_eq!(
            form.submit(d).await,
            Outcome::Rejected(Invalid::Password.to_string())
        );
        assert!(!form.shows_guest_dialog());
    }

    #[tokio::test]
    async fn guest_registration() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(200, Value::Null)
            .reply(200, Value::Null);
        let (mut form, history) = new_form(transport);

        let _ = form.submit(draft(UserType::Guest)).await;
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::GuestRegistered
        );
        assert!(!form.shows_guest_dialog());
        assert_eq!(history.routes(), [Route::Login]);

        let requests = form.transport.requests();
        assert_eq!(
            form.transport.paths(),
            ["/user/exists", "/guest/addGuest", "/user/register"]
        );
        let guest_data = requests[1].body.as_ref().unwrap()["guestData"].clone();
        assert_eq!(guest_data["name"], json!("Ada Lovelace"));
        let number = guest_data["guestNumber"].as_str().unwrap().to_owned();
        assert!(number.starts_with("GUEST_"));
        assert_eq!(
            requests[2].body,
            Some(json!({
                "username": "ab1",
                "password": "secret",
                "guest": { "guestNumber": number },
            })),
        );
    }

    #[tokio::test]
    async fn guest_save_failure_stops_chain() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(500, Value::Null);
        let (mut form, history) = new_form(transport);

        let _ = form.submit(draft(UserType::Guest)).await;
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(GUEST_SAVE_FAILED.to_owned())
        );
        assert_eq!(form.transport.paths(), ["/user/exists", "/guest/addGuest"]);
        assert!(form.shows_guest_dialog());
        assert!(history.routes().is_empty());
    }

    #[tokio::test]
    async fn guest_account_failure() {
        let transport = Scripted::new()
            .reply(200, json!(false))
            .reply(200, Value::Null)
            .reply(400, json!({ "message": "bad guest" }));
        let (mut form, history) = new_form(transport);

        let _ = form.submit(draft(UserType::Guest)).await;
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(GUEST_REGISTER_FAILED.to_owned())
        );
        assert!(history.routes().is_empty());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn guest_transport_failure() {
        let transport = Scripted::new().reply(200, json!(false)).fail();
        let (mut form, _) = new_form(transport);

        let _ = form.submit(draft(UserType::Guest)).await;
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(GUEST_FAILURE.to_owned())
        );
    }

    #[tokio::test]
    async fn guest_username_taken() {
        let (mut form, _) = new_form(Scripted::new().reply(200, json!(true)));

        let _ = form.submit(draft(UserType::Guest)).await;
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(Invalid::UsernameTaken.to_string())
        );
        assert_eq!(form.transport.paths(), ["/user/exists"]);
    }

    #[tokio::test]
    async fn guest_details_without_pending_draft() {
        let (mut form, _) = new_form(Scripted::new());

        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(NO_GUEST_PENDING.to_owned())
        );

        let _ = form.submit(draft(UserType::Guest)).await;
        form.close_guest_dialog();
        assert!(!form.shows_guest_dialog());
        assert_eq!(
            form.submit_guest(&guest_details()).await,
            Outcome::Rejected(NO_GUEST_PENDING.to_owned())
        );
        assert!(form.transport.requests().is_empty());
    }
}

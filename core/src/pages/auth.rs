//! Login and register forms.
//!
//! Both forms validate locally first and issue no request when any field is
//! invalid. A submit holds the busy flag for the whole round trip and always
//! releases it, whatever the outcome.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::notify::{Navigation, Toast};
use crate::session::SessionStore;
use crate::types::{LoginInput, RegisterInput};
use crate::validation::{login_schema, register_schema, FieldErrors, FormValues, Schema};

const LOGIN_TOAST_MS: u64 = 1500;
const REGISTER_SUCCESS_TOAST_MS: u64 = 1500;
const REGISTER_ERROR_TOAST_MS: u64 = 4000;
const REDIRECT_DELAY_MS: u64 = 2000;

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Schema rejected the input; nothing was sent.
    Invalid(FieldErrors),
    Succeeded { toast: Toast, navigation: Navigation },
    /// The request failed. The toast is absent when the server gave no message.
    Failed { toast: Option<Toast> },
}

/// Busy flag plus the inline errors of the last submit.
#[derive(Debug, Default)]
struct FormState {
    busy: bool,
    errors: FieldErrors,
}

impl FormState {
    fn check(&mut self, schema: &Schema, values: &dyn FormValues) -> Result<(), FieldErrors> {
        match schema.validate(values) {
            Ok(()) => {
                self.errors = FieldErrors::default();
                Ok(())
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    fn run<T>(&mut self, f: impl FnOnce() -> Result<T, ApiError>) -> Result<T, ApiError> {
        self.busy = true;
        let result = f();
        self.busy = false;
        result
    }
}

fn failure_toast(err: &ApiError, duration_ms: u64) -> Option<Toast> {
    err.server_message()
        .map(|message| Toast::error(message, duration_ms))
}

#[derive(Debug, Default)]
pub struct LoginForm {
    state: FormState,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.state.errors
    }

    /// On success the stored session is exactly the server's payload.
    pub fn submit(
        &mut self,
        input: &LoginInput,
        client: &ApiClient,
        transport: &dyn Transport,
        store: &dyn SessionStore,
    ) -> SubmitOutcome {
        if let Err(errors) = self.state.check(&login_schema(), input) {
            return SubmitOutcome::Invalid(errors);
        }

        let result = self.state.run(|| {
            let request = client.build_login(input)?;
            let session = client.parse_login(transport.execute(request)?)?;
            store.save(&session)?;
            Ok(session)
        });

        match result {
            Ok(session) => {
                info!(user_id = session.user.id, "logged in");
                SubmitOutcome::Succeeded {
                    toast: Toast::success("Logged In Successfully", LOGIN_TOAST_MS),
                    navigation: Navigation {
                        to: "/".to_string(),
                        after: Duration::from_millis(REDIRECT_DELAY_MS),
                        replace: true,
                    },
                }
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                SubmitOutcome::Failed {
                    toast: failure_toast(&e, LOGIN_TOAST_MS),
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RegisterForm {
    state: FormState,
}

impl RegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.state.errors
    }

    /// Registration never stores a session; the user logs in afterwards.
    pub fn submit(
        &mut self,
        input: &RegisterInput,
        client: &ApiClient,
        transport: &dyn Transport,
    ) -> SubmitOutcome {
        if let Err(errors) = self.state.check(&register_schema(), input) {
            return SubmitOutcome::Invalid(errors);
        }

        let result = self.state.run(|| {
            let request = client.build_register(input)?;
            client.parse_register(transport.execute(request)?)
        });

        match result {
            Ok(session) => {
                info!(user_id = session.user.id, "registered");
                SubmitOutcome::Succeeded {
                    toast: Toast::success(
                        "You will navigate to login page after 2 seconds to login",
                        REGISTER_SUCCESS_TOAST_MS,
                    ),
                    navigation: Navigation {
                        to: "/login".to_string(),
                        after: Duration::from_millis(REDIRECT_DELAY_MS),
                        replace: false,
                    },
                }
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                SubmitOutcome::Failed {
                    toast: failure_toast(&e, REGISTER_ERROR_TOAST_MS),
                }
            }
        }
    }
}

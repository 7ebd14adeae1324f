//! Credential submission: sign-in, sign-up and identity-provider exchange
//!
//! Each successful path ends the same way: the response is checked, stored,
//! and only then does navigation to the role's destination happen.

use mentorlink_api::{AuthResponse, GoogleLoginRequest, LoginRequest, RegisterRequest, ServiceApi};
use mentorlink_core::{
    log_operation_error, log_operation_start, log_operation_success, performance, MentorlinkResult,
    Role, Route, Session, SignupRole,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::identity::{decode_identity_display, IdentityDisplay, ProviderError};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::router::RoleRouter;
use crate::store::SessionContext;
use crate::{InFlight, SessionResult};

/// Server failures containing this text are shown as information, not as errors
pub const INACTIVE_ACCOUNT_PATTERN: &str = "account is currently inactive";

/// Classify a server failure message for display
pub fn classify_failure_message(message: &str) -> NoticeKind {
    if message
        .to_lowercase()
        .contains(INACTIVE_ACCOUNT_PATTERN)
    {
        NoticeKind::Info
    } else {
        NoticeKind::Error
    }
}

/// Credentials entered by the user
#[derive(Debug, Clone)]
pub enum Submission {
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        email: String,
        password: String,
        role: SignupRole,
    },
}

impl Submission {
    fn operation(&self) -> &'static str {
        match self {
            Submission::SignIn { .. } => "login",
            Submission::SignUp { .. } => "register",
        }
    }

    /// Copy with the email trimmed, or the message explaining what is missing
    fn normalized(&self) -> Result<Self, String> {
        let (email, password) = match self {
            Submission::SignIn { email, password } | Submission::SignUp { email, password, .. } => {
                (email.trim().to_string(), password.clone())
            }
        };

        if email.is_empty() || password.trim().is_empty() {
            return Err("Email and password are required.".to_string());
        }
        if !email.contains('@') {
            return Err("Please enter a valid email address.".to_string());
        }

        Ok(match self {
            Submission::SignIn { .. } => Submission::SignIn { email, password },
            Submission::SignUp { role, .. } => Submission::SignUp {
                email,
                password,
                role: *role,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Session stored and navigation performed
    SignedIn {
        session: Session,
        route: Route,
        identity: Option<IdentityDisplay>,
    },
    /// Nothing stored; the notice tells the user why
    Rejected(Notice),
    /// Another submission is still in flight
    Busy,
}

pub struct CredentialSubmitter {
    api: Arc<dyn ServiceApi>,
    session: SessionContext,
    router: RoleRouter,
    notices: NoticeBoard,
    in_flight: AtomicBool,
}

impl CredentialSubmitter {
    pub fn new(
        api: Arc<dyn ServiceApi>,
        session: SessionContext,
        router: RoleRouter,
        notices: NoticeBoard,
    ) -> Self {
        Self {
            api,
            session,
            router,
            notices,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        InFlight::acquire(&self.in_flight)
    }

    /// Submit email/password credentials in sign-in or sign-up mode
    pub async fn submit(&self, submission: Submission) -> SessionResult<SubmitOutcome> {
        let Some(_guard) = self.begin() else {
            debug!("Submission ignored, another one is in flight");
            return Ok(SubmitOutcome::Busy);
        };
        self.notices.clear();

        let operation = submission.operation();
        let submission = match submission.normalized() {
            Ok(submission) => submission,
            Err(message) => return Ok(self.reject(Notice::error(message))),
        };

        log_operation_start!(operation);
        let result = match submission {
            Submission::SignIn { email, password } => {
                let request = LoginRequest { email, password };
                performance::measure_async(operation, self.api.login(&request)).await
            }
            Submission::SignUp {
                email,
                password,
                role,
            } => {
                let request = RegisterRequest {
                    email,
                    password,
                    role,
                };
                performance::measure_async(operation, self.api.register(&request)).await
            }
        };

        self.complete(operation, result, None)
    }

    /// Exchange the identity provider's result for a session
    pub async fn submit_identity_token(
        &self,
        provider_result: Result<String, ProviderError>,
    ) -> SessionResult<SubmitOutcome> {
        let Some(_guard) = self.begin() else {
            debug!("Identity sign-in ignored, another submission is in flight");
            return Ok(SubmitOutcome::Busy);
        };
        self.notices.clear();

        let token = match provider_result {
            Ok(token) if !token.trim().is_empty() => token,
            Ok(_) => return Ok(self.reject(Notice::error("Google sign-in failed."))),
            Err(e) => {
                warn!(error = %e, "Identity provider reported a failure");
                return Ok(self.reject(Notice::error(e.to_string())));
            }
        };

        let identity = match decode_identity_display(&token) {
            Ok(display) => Some(display),
            Err(e) => {
                debug!(error = %e, "Identity token has no displayable claims");
                None
            }
        };

        let operation = "google_login";
        log_operation_start!(operation);
        let request = GoogleLoginRequest { token };
        let result =
            performance::measure_async(operation, self.api.google_login(&request)).await;

        self.complete(operation, result, identity)
    }

    fn complete(
        &self,
        operation: &str,
        result: MentorlinkResult<AuthResponse>,
        identity: Option<IdentityDisplay>,
    ) -> SessionResult<SubmitOutcome> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log_operation_error!(operation, e);
                let message = e.user_message();
                let notice = match classify_failure_message(&message) {
                    NoticeKind::Info => Notice::info(message),
                    _ => Notice::error(message),
                };
                return Ok(self.reject(notice));
            }
        };

        let session = match Session::new(
            response.token,
            response.id,
            response.name,
            Role::parse(&response.role),
        ) {
            Ok(session) => session.with_status(response.status),
            Err(e) => {
                log_operation_error!(operation, e);
                return Ok(self.reject(Notice::error(
                    "Unexpected response from the server. Please try again.",
                )));
            }
        };

        if let Err(e) = self.session.write(&session) {
            log_operation_error!(operation, e);
            self.notices
                .show_error("Could not save your session on this device.");
            return Err(e);
        }

        let route = self.router.navigate(&session.role);
        log_operation_success!(operation, user_id = %session.user_id, route = %route);

        Ok(SubmitOutcome::SignedIn {
            session,
            route,
            identity,
        })
    }

    fn reject(&self, notice: Notice) -> SubmitOutcome {
        self.notices.show(notice.clone());
        SubmitOutcome::Rejected(notice)
    }
}

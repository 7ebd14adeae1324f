//! Administrative user directory

use mentorlink_api::{MessageResponse, ServiceApi, UserSummary};
use mentorlink_core::{
    log_operation_error, log_operation_success, performance, AccountStatus, MentorlinkError, Role,
};
use std::sync::Arc;
use tracing::debug;

use crate::store::SessionContext;
use crate::{SessionError, SessionResult};

/// Client-side filter over the user list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    /// Case-insensitive match against name or email
    pub query: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &UserSummary) -> bool {
        if let Some(role) = &self.role {
            if Role::parse(&user.role) != *role {
                return false;
            }
        }
        if let Some(status) = self.status {
            if user.status != Some(status) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                user.name.to_lowercase().contains(&query)
                    || user.email.to_lowercase().contains(&query)
            }
            _ => true,
        }
    }
}

pub struct UserDirectory {
    api: Arc<dyn ServiceApi>,
    session: SessionContext,
}

impl UserDirectory {
    pub fn new(api: Arc<dyn ServiceApi>, session: SessionContext) -> Self {
        Self { api, session }
    }

    fn token(&self) -> SessionResult<String> {
        self.session.token().ok_or(SessionError::NotAuthenticated)
    }

    fn fail(&self, operation: &str, token: &str, error: MentorlinkError) -> SessionError {
        log_operation_error!(operation, error);
        if error.is_authorization_failure() {
            self.session.invalidate("user_directory", token);
        }
        error.into()
    }

    /// Users matching `filter`; an empty list is a normal result
    pub async fn list(&self, filter: &UserFilter) -> SessionResult<Vec<UserSummary>> {
        let token = self.token()?;
        let users = performance::measure_async("list_users", self.api.list_users(&token))
            .await
            .map_err(|e| self.fail("list_users", &token, e))?;

        let total = users.len();
        let users: Vec<_> = users.into_iter().filter(|u| filter.matches(u)).collect();
        debug!(total, matched = users.len(), "Listed users");
        Ok(users)
    }

    pub async fn set_status(
        &self,
        user_id: &str,
        status: AccountStatus,
    ) -> SessionResult<MessageResponse> {
        let token = self.token()?;
        let ack = self
            .api
            .update_user_status(&token, user_id, status)
            .await
            .map_err(|e| self.fail("update_user_status", &token, e))?;
        log_operation_success!("update_user_status", user_id = user_id, status = %status);
        Ok(ack)
    }

    pub async fn delete(&self, user_id: &str) -> SessionResult<MessageResponse> {
        let token = self.token()?;
        let ack = self
            .api
            .delete_user(&token, user_id)
            .await
            .map_err(|e| self.fail("delete_user", &token, e))?;
        log_operation_success!("delete_user", user_id = user_id);
        Ok(ack)
    }
}

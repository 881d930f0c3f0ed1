pub mod login;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod users;

use devlab::ApiClient;
use devlab::api::User;
use devlab::permissions::Permission;

use crate::{Error, Result};

/// The logged-in account, fetched once and then served from the session cache.
pub async fn current_user(client: &ApiClient) -> Result<User> {
    if !client.session().is_authenticated() {
        return Err(Error::NotLoggedIn);
    }
    match client.session().current_user() {
        Some(user) => Ok(user),
        None => Ok(client.auth().fetch_current_user().await?),
    }
}

/// Advisory gate in front of a command; the backend still decides.
pub async fn require(client: &ApiClient, permission: Permission, action: &'static str) -> Result<User> {
    let user = current_user(client).await?;
    if user.role.allows(permission) {
        Ok(user)
    } else {
        Err(Error::NotPermitted {
            role: user.role,
            action,
        })
    }
}

pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

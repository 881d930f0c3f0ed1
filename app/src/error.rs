use devlab::api::{ApiError, Role};
use devlab::io::StoreError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Api(#[from] ApiError),

    #[error("Session store: {}", .0)]
    Store(#[from] StoreError),

    #[error("IO: {}", .0)]
    Io(#[from] std::io::Error),

    #[error("Not logged in, run `devlab login` first")]
    NotLoggedIn,

    #[error("A {role} account cannot {action}")]
    NotPermitted { role: Role, action: &'static str },
}

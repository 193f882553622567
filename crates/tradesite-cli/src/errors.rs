use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use thiserror::Error;

macro_rules! impl_debug_for_error {
    ($($t:ty),*) => {
        $(
            impl Debug for $t {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self)
                }
            }
        )*
    };
}

#[derive(Error)]
pub enum InitError {
    #[error("{path} already exists, pass --force to overwrite it")]
    AlreadyExists { path: PathBuf },
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a contact form submission is rejected before anything is sent.
#[derive(Error, PartialEq, Eq)]
pub enum FormError {
    #[error("field `{field}` is too long")]
    TooLong { field: &'static str },
    #[error("Missing required fields")]
    MissingFields,
}

#[derive(Error)]
pub enum MailError {
    #[error("Invalid email address `{address}`")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl_debug_for_error!(InitError, FormError, MailError);

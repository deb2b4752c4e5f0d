extern crate regex;
extern crate serde_derive;
extern crate thiserror;
extern crate toml;

use thiserror::Error;

pub use config::Config;
pub use ipset::{IpsetCommand, SetType};
pub use list::IpsetSet;
pub use messages::MessageTable;

mod config;
mod ipset;
mod list;
mod messages;

#[derive(Clone, Debug, Error)]
pub enum IpsetError {
    #[error("the set does not exist")]
    SetNotFound(String),
    #[error("the element is already a member of the set")]
    AlreadyMember(String, String),
    #[error("the element is not a member of the set")]
    NotAMember(String, String),
    #[error("the element does not resolve to an IPv4 address")]
    InvalidAddress(String),
    #[error("not a supported set type")]
    UnsupportedSetType(String),
    #[error("ipset output could not be parsed")]
    MalformedOutput(String),
    #[error("unrecognized ipset error message")]
    UnrecognizedError(String),
    #[error("an IO error has occured")]
    IOError(String),
}

pub type IpsetResult<V> = Result<V, IpsetError>;

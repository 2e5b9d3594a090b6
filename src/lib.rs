#[macro_use]
extern crate serde_derive;

pub mod block;
pub mod chain;
pub mod codec;
pub mod consenter;
pub mod lifecycle;
pub mod message;
pub mod pool;
pub mod settings;
pub mod support;

#[cfg(test)]
pub mod test_util;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Bincode(bincode::Error),
    Config(config::ConfigError),

    // chain errors
    NotStarted,
    AlreadyStarted,
    ChainHalted,

    /// Message rejected by the configuration collaborator
    InvalidMessage(String),
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl std::convert::From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Self {
        Error::Bincode(error)
    }
}

impl std::convert::From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid access code: {0}")]
    InvalidAccessCode(String),

    #[error("Invalid caller id: {0}")]
    InvalidUserId(String),
}

pub type Result<T> = std::result::Result<T, Error>;

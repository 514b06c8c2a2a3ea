use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] field_core::Error),

    #[error("No proposal with id '{0}'")]
    UnknownProposal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

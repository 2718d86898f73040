pub mod author;
pub mod dto;
pub mod oekaki;
pub mod tag;

use crate::{
    model::{
        author::{InvalidDidError, InvalidHandleError},
        tag::InvalidTagNameError,
    },
    tid::TidParseError,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Did(#[from] InvalidDidError),
    #[error(transparent)]
    Handle(#[from] InvalidHandleError),
    #[error(transparent)]
    TagName(#[from] InvalidTagNameError),
    #[error("The TID is invalid: {0}")]
    Tid(#[from] TidParseError),
}

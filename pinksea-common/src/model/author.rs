use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const DID_MAX_LEN: usize = 2048;
pub const HANDLE_MAX_LEN: usize = 253;
pub const HANDLE_LABEL_MAX_LEN: usize = 63;

/// Shown in place of a handle that could not be resolved.
pub const INVALID_HANDLE: &str = "Invalid handle";

/// A decentralized identifier, the stable identity of an author.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Did(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The DID is invalid: {0}")]
pub struct InvalidDidError(String);

impl Did {
    pub fn new(did: String) -> Result<Self, InvalidDidError> {
        if is_valid_did(&did) {
            Ok(Did(did))
        } else {
            Err(InvalidDidError(did))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

fn is_valid_did(did: &str) -> bool {
    if did.len() > DID_MAX_LEN || did.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = did.splitn(3, ':');
    let (Some("did"), Some(method), Some(identifier)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && !identifier.is_empty()
        && !identifier.ends_with(':')
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = InvalidDidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Did::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Did"))
    }
}

/// A human readable, domain shaped name of an author.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Handle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The handle is invalid: {0}")]
pub struct InvalidHandleError(String);

impl Handle {
    pub fn new(handle: String) -> Result<Self, InvalidHandleError> {
        if is_valid_handle(&handle) {
            Ok(Handle(handle))
        } else {
            Err(InvalidHandleError(handle))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

fn is_valid_handle(handle: &str) -> bool {
    if handle.is_empty() || handle.len() > HANDLE_MAX_LEN {
        return false;
    }

    let mut labels = 0;
    for label in handle.split('.') {
        let valid = !label.is_empty()
            && label.len() <= HANDLE_LABEL_MAX_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return false;
        }
        labels += 1;
    }

    labels >= 2
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = InvalidHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Handle::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Handle"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Author {
    pub did: Did,
    pub handle: Option<Handle>,
}

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const TAG_NAME_MAX_LEN: usize = 64;

/// The name of a tag. Tag names compare case sensitively.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct TagName(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The tag name is invalid: {0}")]
pub struct InvalidTagNameError(String);

impl TagName {
    pub fn new(name: String) -> Result<Self, InvalidTagNameError> {
        if !name.is_empty()
            && name.chars().count() <= TAG_NAME_MAX_LEN
            && !name.chars().any(char::is_whitespace)
        {
            Ok(TagName(name))
        } else {
            Err(InvalidTagNameError(name))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for TagName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        TagName::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"TagName"))
    }
}

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::listing::Selector;

// date and number inputs submit "" when left blank
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// filter selects send "all" for no constraint
pub fn deserialize_selector<'de, D, T>(deserializer: D) -> Result<Selector<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map_or(Selector::All, |raw| Selector::parse(&raw)))
}

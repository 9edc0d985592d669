//! Optional fields where an empty string means "unset"
//!
//! `{{ env.VAR | default("") }}` lets a deployment leave a credential out
//! without failing expansion; the field then reads as `None`.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    present(deserializer)
}

pub fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present(deserializer)?.map(SecretString::from))
}

pub fn url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    present(deserializer)?
        .map(|raw| Url::parse(raw.trim()).map_err(|e| serde::de::Error::custom(format!("invalid URL '{raw}': {e}"))))
        .transpose()
}

//! Environment-backed configuration.
//!
//! Deserialization is a trimmed-down take on the [`envy`] crate: every variable in the process
//! environment (plus anything `dotenvy` picks up from a `.env` file) is fed through a map
//! deserializer, so [`Config`] can lean on plain serde attributes for renames and defaults.
//!
//! [`envy`]: https://github.com/softprops/envy

use core::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::de::value::MapDeserializer;
use serde::de::{self, IntoDeserializer};
use thiserror::Error;

use crate::constants::{
    DEFAULT_DAILY_FILE, DEFAULT_RANK_FILE, DEFAULT_SERVER_PORT, DEFAULT_SERVICE_NAME,
};

#[derive(Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Opaque platform token; never inspected beyond equality checks
    pub discord_token: String,

    /// Designated leaderboard channel, `0` turns ingestion off
    #[serde(default)]
    pub rank_channel_id: u64,

    #[serde(default = "default_rank_file")]
    pub rank_file: PathBuf,

    #[serde(default = "default_daily_file")]
    pub daily_file: PathBuf,

    #[serde(default = "default_port")]
    pub server_api_port: u16,

    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    #[serde(default = "default_service_name")]
    pub api_service_name: String,
}

fn default_rank_file() -> PathBuf {
    PathBuf::from(DEFAULT_RANK_FILE)
}

fn default_daily_file() -> PathBuf {
    PathBuf::from(DEFAULT_DAILY_FILE)
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

impl Config {
    /// Reads the process environment, loading `.env` first when one exists.
    pub fn from_env() -> EnvResult<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(e.into());
        }

        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<Iter>(vars: Iter) -> EnvResult<Self>
    where
        Iter: IntoIterator<Item = (String, String)>,
    {
        Ok(from_iter(vars)?)
    }

    /// Whether messages from `channel_id` count as leaderboard posts.
    pub fn is_rank_channel(&self, channel_id: u64) -> bool {
        self.rank_channel_id != 0 && self.rank_channel_id == channel_id
    }

    /// Collector endpoint, ignoring a variable that is present but blank.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otel_exporter_otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|ep| !ep.is_empty())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("rank_channel_id", &self.rank_channel_id)
            .field("rank_file", &self.rank_file)
            .field("daily_file", &self.daily_file)
            .field("server_api_port", &self.server_api_port)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("api_service_name", &self.api_service_name)
            .finish()
    }
}

// ---
//  Deserializer implementation
// ---

struct EnvValue {
    key: String,
    raw: String,
}

struct EnvKey(String);

struct Vars<Iter> {
    inner: Iter,
}

impl<Iter: Iterator<Item = (String, String)>> Iterator for Vars<Iter> {
    type Item = (EnvKey, EnvValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, raw)| (EnvKey(key.clone()), EnvValue { key, raw }))
    }
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for EnvValue {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for EnvKey {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! forward_parsed_vals {
    ($($ty:ident => $method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, EnvDeserializeError>
            where
                V: de::Visitor<'de>
            {
                match self.raw.trim().parse::<$ty>() {
                    Ok(val) => val.into_deserializer().$method(visitor),
                    Err(e) => Err(de::Error::custom(format_args!(
                        "{}: while parsing '{}' (variable: {})",
                        e, self.raw, self.key
                    )))
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for EnvValue {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.raw.into_deserializer().deserialize_any(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_parsed_vals! {
        bool => deserialize_bool,
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
    }

    serde::forward_to_deserialize_any! {
        i8 i16 f32 f64 char str string unit seq bytes byte_buf map
        unit_struct tuple_struct identifier tuple enum
        ignored_any struct
    }
}

impl<'de> de::Deserializer<'de> for EnvKey {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.0.into_deserializer().deserialize_any(visitor)
    }

    serde::forward_to_deserialize_any! {
        char str string unit seq option bytes byte_buf map newtype_struct
        unit_struct tuple_struct identifier tuple ignored_any
        bool u8 u16 u32 u64 i8 i16 i32 i64 f32 f64 enum struct
    }
}

struct EnvDeserializer<'de, Iter: Iterator<Item = (String, String)>> {
    inner: MapDeserializer<'de, Vars<Iter>, EnvDeserializeError>,
}

impl<'de, Iter: Iterator<Item = (String, String)>> de::Deserializer<'de>
    for EnvDeserializer<'de, Iter>
{
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(self.inner)
    }

    serde::forward_to_deserialize_any! {
        char str string unit seq option bytes byte_buf map
        newtype_struct unit_struct tuple_struct identifier
        tuple ignored_any bool u8 u16 u32 u64 i8 i16 i32 i64
        f32 f64 enum struct
    }
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    T::deserialize(EnvDeserializer {
        inner: MapDeserializer::new(Vars {
            inner: iter.into_iter(),
        }),
    })
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        EnvDeserializeError::MissingValue(field.to_ascii_uppercase())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),
}

#[derive(Debug, Error)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),

    #[error("missing required variable {0}")]
    MissingValue(String),
}

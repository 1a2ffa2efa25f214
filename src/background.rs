use clap::{
    builder::{TypedValueParser, ValueParserFactory},
    error::ErrorKind,
};
use image::Rgba;
use itertools::Itertools;
use std::{fmt::Display, str::FromStr};

/// Opaque fill color for grid cells that have no tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub Rgba<u8>);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("error parsing color {0:?}, expected RRGGBB or #RRGGBB")]
pub struct BackgroundError(String);

impl Background {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Rgba([r, g, b, 255]))
    }
}

impl Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, _] = self.0.0;

        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl FromStr for Background {
    type Err = BackgroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);

        if hex.len() != 6 || !hex.is_ascii() {
            return Err(BackgroundError(s.to_owned()));
        }

        hex.chars()
            .chunks(2)
            .into_iter()
            .map(Iterator::collect::<String>)
            .map(|c| u8::from_str_radix(&c, 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| BackgroundError(s.to_owned()))
            .map(|rgb| Self::rgb(rgb[0], rgb[1], rgb[2]))
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundParser;

impl TypedValueParser for BackgroundParser {
    type Value = Background;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let value_str = value
            .to_str()
            .ok_or_else(|| clap::Error::raw(ErrorKind::InvalidUtf8, "Invalid UTF-8"))?;

        Background::from_str(value_str).map_err(|e| clap::Error::raw(ErrorKind::ValueValidation, e))
    }
}

impl ValueParserFactory for Background {
    type Parser = BackgroundParser;

    fn value_parser() -> Self::Parser {
        BackgroundParser
    }
}

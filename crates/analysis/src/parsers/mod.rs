//! Decoders for `network` output files
//!
//! Each decoder is a pure function from the file text to a record. The
//! `format` passed to `Error::decode` is the output file extension.

mod block;
mod chan;
mod oms;
mod res;
mod sa;
mod strinfo;
mod vol;

pub use block::parse_block;
pub use chan::parse_chan;
pub use oms::parse_oms;
pub use res::parse_res;
pub use sa::parse_sa;
pub use strinfo::parse_strinfo;
pub use vol::{parse_vol, VolumeFlavor};

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use zeorun_core::{Error, Result};

/// A whitespace-delimited `label:` token followed by a number
static LABELLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(\S+:)\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)")
        .expect("valid regex")
});

/// Value following `label` (e.g. `Density:`) anywhere in `text`.
///
/// Labels are compared as whole tokens so `ASA_A^2:` does not match inside
/// `NASA_A^2:`.
pub(crate) fn labelled_value(text: &str, label: &str) -> Option<f64> {
    LABELLED
        .captures_iter(text)
        .find(|caps| &caps[1] == label)
        .and_then(|caps| caps[2].parse().ok())
}

pub(crate) fn required_value(text: &str, label: &str, format: &str) -> Result<f64> {
    labelled_value(text, label)
        .ok_or_else(|| Error::decode(format, format!("missing value for '{label}'")))
}

pub(crate) fn parse_token<T: FromStr>(token: &str, what: &str, format: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::decode(format, format!("invalid {what} '{token}'")))
}

/// Leading decimal digits of `token`, e.g. `3` from `3D` or `0:`
pub(crate) fn leading_int(token: &str, what: &str, format: &str) -> Result<u32> {
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
    parse_token(&digits, what, format)
        .map_err(|_| Error::decode(format, format!("invalid {what} '{token}'")))
}

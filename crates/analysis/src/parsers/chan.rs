use super::parse_token;
use crate::report::{ChannelEntry, Channels};
use once_cell::sync::Lazy;
use regex::Regex;
use zeorun_core::{Error, Result};

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s+channels identified of dimensionality\s+(\d+)").expect("valid regex")
});

/// Header line plus one `Channel <id> <inc> <free> <inc_along_free>` row per
/// channel. Summary lines are ignored.
pub fn parse_chan(text: &str) -> Result<Channels> {
    let caps = HEADER
        .captures(text)
        .ok_or_else(|| Error::decode("chan", "missing channel summary header"))?;
    let num_channels = parse_token(&caps[1], "channel count", "chan")?;
    let dimensionality = parse_token(&caps[2], "dimensionality", "chan")?;

    let mut channels = Vec::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"Channel") {
            continue;
        }
        if parts.len() < 5 {
            return Err(Error::decode(
                "chan",
                format!("channel row has {} fields: '{}'", parts.len(), line.trim()),
            ));
        }
        channels.push(ChannelEntry {
            id: parse_token(parts[1], "channel id", "chan")?,
            included_diameter: parse_token(parts[2], "included diameter", "chan")?,
            free_diameter: parse_token(parts[3], "free diameter", "chan")?,
            included_along_free: parse_token(parts[4], "included along free diameter", "chan")?,
        });
    }

    Ok(Channels {
        num_channels,
        dimensionality,
        channels,
    })
}

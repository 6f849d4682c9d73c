use super::parse_token;
use crate::report::PoreDiameters;
use zeorun_core::{Error, Result};

/// `<name> <included> <free> <included_along_free>` on the first line
pub fn parse_res(text: &str) -> Result<PoreDiameters> {
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| Error::decode("res", "file is empty"))?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(Error::decode(
            "res",
            format!("expected 4 fields, found {}", parts.len()),
        ));
    }

    Ok(PoreDiameters {
        included_diameter: parse_token(parts[1], "included diameter", "res")?,
        free_diameter: parse_token(parts[2], "free diameter", "res")?,
        included_along_free: parse_token(parts[3], "included along free diameter", "res")?,
    })
}

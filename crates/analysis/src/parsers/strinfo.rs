use super::{leading_int, parse_token};
use crate::report::{FrameworkEntry, StructureInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use zeorun_core::{Error, Result};

static MOLECULES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Molecules identified:\s*(\d+)").expect("valid regex")
});

/// Molecule count (0 when not reported) and `Framework <id> ... <dim>` rows
pub fn parse_strinfo(text: &str) -> Result<StructureInfo> {
    let molecules = match MOLECULES.captures(text) {
        Some(caps) => parse_token(&caps[1], "molecule count", "strinfo")?,
        None => 0,
    };

    let mut frameworks = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| l.starts_with("Framework")) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (id, dimensionality) = match (parts.get(1), parts.last()) {
            (Some(id), Some(dim)) if parts.len() >= 3 => (*id, *dim),
            _ => {
                return Err(Error::decode(
                    "strinfo",
                    format!("malformed framework row '{line}'"),
                ))
            }
        };
        frameworks.push(FrameworkEntry {
            id: leading_int(id, "framework id", "strinfo")?,
            dimensionality: leading_int(dimensionality, "dimensionality", "strinfo")?,
        });
    }

    Ok(StructureInfo {
        molecules,
        frameworks,
    })
}

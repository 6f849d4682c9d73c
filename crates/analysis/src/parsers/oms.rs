use super::parse_token;
use crate::report::OpenMetalSites;
use once_cell::sync::Lazy;
use regex::Regex;
use zeorun_core::Result;

static OMS_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"OMS detected:\s*(\d+)").expect("valid regex")
});

/// `OMS detected: <n>`; a file without the line reports zero sites
pub fn parse_oms(text: &str) -> Result<OpenMetalSites> {
    let oms_count = match OMS_COUNT.captures(text) {
        Some(caps) => parse_token(&caps[1], "open metal site count", "oms")?,
        None => 0,
    };
    Ok(OpenMetalSites { oms_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oms() {
        assert_eq!(parse_oms("structure.oms\nOMS detected: 4\n").unwrap().oms_count, 4);
        assert_eq!(parse_oms("").unwrap().oms_count, 0);
    }
}

use super::parse_token;
use crate::report::{BlockingSphere, BlockingSpheres};
use zeorun_core::{Error, Result};

/// Sphere count followed by that many `x y z r` rows
pub fn parse_block(text: &str) -> Result<BlockingSpheres> {
    let mut tokens = text.split_whitespace();
    let count: usize = match tokens.next() {
        Some(token) => parse_token(token, "sphere count", "block")?,
        None => return Err(Error::decode("block", "file is empty")),
    };

    let values = tokens
        .map(|t| parse_token::<f64>(t, "coordinate", "block"))
        .collect::<Result<Vec<_>>>()?;
    let expected = count
        .checked_mul(4)
        .ok_or_else(|| Error::decode("block", format!("sphere count {count} is out of range")))?;
    if values.len() != expected {
        return Err(Error::decode(
            "block",
            format!(
                "header declares {count} spheres but {} values follow",
                values.len()
            ),
        ));
    }

    let spheres = values
        .chunks_exact(4)
        .map(|row| BlockingSphere {
            x: row[0],
            y: row[1],
            z: row[2],
            radius: row[3],
        })
        .collect();

    Ok(BlockingSpheres { count, spheres })
}

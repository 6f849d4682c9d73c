//! Multipart upload parsing

use super::error::ApiError;
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;
use zeorun_analysis::OperationParams;

/// Form field carrying the structure file
pub const STRUCTURE_FIELD: &str = "structure_file";

/// A structure upload plus its text form fields
#[derive(Debug)]
pub struct UploadForm {
    pub file_name: String,
    pub structure: Bytes,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == STRUCTURE_FIELD {
                let file_name = field.file_name().map(str::to_string).ok_or_else(|| {
                    ApiError::BadRequest(format!("{STRUCTURE_FIELD} must be a file upload"))
                })?;
                upload = Some((file_name, field.bytes().await?));
            } else {
                fields.insert(name, field.text().await?);
            }
        }

        let (file_name, structure) = upload
            .ok_or_else(|| ApiError::BadRequest(format!("missing {STRUCTURE_FIELD}")))?;
        if structure.is_empty() {
            return Err(ApiError::BadRequest(format!("{STRUCTURE_FIELD} is empty")));
        }

        Ok(Self {
            file_name,
            structure,
            fields,
        })
    }

    pub fn params(&self) -> Result<OperationParams, ApiError> {
        params_from_fields(&self.fields)
    }
}

/// Map loose form fields onto operation parameters; unknown fields are ignored
pub fn params_from_fields(fields: &HashMap<String, String>) -> Result<OperationParams, ApiError> {
    Ok(OperationParams {
        high_accuracy: field(fields, "ha", parse_flag)?,
        chan_radius: field(fields, "chan_radius", |raw| raw.parse().ok())?,
        probe_radius: field(fields, "probe_radius", |raw| raw.parse().ok())?,
        samples: field(fields, "samples", |raw| raw.parse().ok())?,
        use_radii: field(fields, "use_radii", parse_flag)?,
    })
}

fn field<T>(
    fields: &HashMap<String, String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match fields.get(name).map(|raw| raw.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid {name}: '{raw}'"))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_params_from_fields() {
        let params = params_from_fields(&fields(&[
            ("ha", "False"),
            ("chan_radius", "1.2"),
            ("probe_radius", " 1.5 "),
            ("samples", "2000"),
            ("output_filename", "ignored.sa"),
        ]))
        .unwrap();

        assert_eq!(
            params,
            OperationParams {
                high_accuracy: Some(false),
                chan_radius: Some(1.2),
                probe_radius: Some(1.5),
                samples: Some(2000),
                use_radii: None,
            }
        );
    }

    #[test]
    fn test_empty_fields_are_unset() {
        let params = params_from_fields(&fields(&[("ha", ""), ("samples", "  ")])).unwrap();
        assert_eq!(params, OperationParams::default());
    }

    #[test]
    fn test_malformed_fields_are_rejected() {
        assert!(matches!(
            params_from_fields(&fields(&[("samples", "-3")])),
            Err(ApiError::BadRequest(message)) if message.contains("samples")
        ));
        assert!(params_from_fields(&fields(&[("use_radii", "maybe")])).is_err());
        assert!(params_from_fields(&fields(&[("chan_radius", "wide")])).is_err());
    }
}

//! `Upload-Metadata` header parsing.
//!
//! The header is a comma separated list of `key base64value` pairs; a key may appear without
//! a value.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hullmedia_core::models::UploadMetadata;
use hullmedia_core::AppError;
use std::collections::HashMap;
use uuid::Uuid;

/// Decode the raw header into key/value pairs.
pub fn parse_pairs(header: &str) -> Result<HashMap<String, String>, AppError> {
    let mut pairs = HashMap::new();

    for entry in header.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(2, ' ');
        let key = parts.next().unwrap_or_default().trim();
        if key.is_empty() {
            continue;
        }
        let value = match parts.next().map(str::trim).filter(|v| !v.is_empty()) {
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded).map_err(|_| {
                    AppError::Validation(format!("Upload-Metadata value for '{}' is not base64", key))
                })?;
                String::from_utf8(bytes).map_err(|_| {
                    AppError::Validation(format!("Upload-Metadata value for '{}' is not UTF-8", key))
                })?
            }
            None => String::new(),
        };
        pairs.insert(key.to_string(), value);
    }

    Ok(pairs)
}

/// Build [`UploadMetadata`] from the header.
///
/// Recognised keys: `filename` (or `name`), `contentType` (or `filetype`), `correlationId`,
/// `associationId` (or `vesselPartId`).
pub fn parse_upload_metadata(header: Option<&str>) -> Result<UploadMetadata, AppError> {
    let pairs = match header {
        Some(header) => parse_pairs(header)?,
        None => HashMap::new(),
    };
    let get = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| pairs.get(*k))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let correlation_id = get(&["correlationId", "correlation_id"])
        .map(|v| {
            Uuid::parse_str(&v)
                .map_err(|_| AppError::Validation("correlationId must be a UUID".to_string()))
        })
        .transpose()?;
    let association_id = get(&["associationId", "vesselPartId"])
        .map(|v| {
            v.parse::<i64>().map_err(|_| {
                AppError::Validation("associationId must be an integer".to_string())
            })
        })
        .transpose()?;

    Ok(UploadMetadata {
        filename: get(&["filename", "name"]).unwrap_or_default(),
        content_type: get(&["contentType", "filetype"]),
        correlation_id,
        association_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_parse_full_metadata() {
        let correlation = Uuid::new_v4();
        let header = format!(
            "filename {},contentType {},correlationId {}, vesselPartId {},is_confidential",
            b64("bow.png"),
            b64("image/png"),
            b64(&correlation.to_string()),
            b64("17")
        );
        let meta = parse_upload_metadata(Some(&header)).unwrap();
        assert_eq!(meta.filename, "bow.png");
        assert_eq!(meta.content_type.as_deref(), Some("image/png"));
        assert_eq!(meta.correlation_id, Some(correlation));
        assert_eq!(meta.association_id, Some(17));
    }

    #[test]
    fn test_missing_header_yields_empty_filename() {
        let meta = parse_upload_metadata(None).unwrap();
        assert!(meta.filename.is_empty());
        assert!(meta.correlation_id.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_pairs("filename ***").is_err());
        let header = format!("filename {},correlationId {}", b64("a.png"), b64("nope"));
        assert!(matches!(
            parse_upload_metadata(Some(&header)),
            Err(AppError::Validation(_))
        ));
    }
}

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use gridsly_core::GridSnapshot;

const TRANSFER_DOMAIN: &str = "gridsly";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded grid payload.
pub(crate) const TRANSFER_HEADER: &str = "gridsly:v1";
const FIELD_DELIMITER: char = ':';

/// Encodes the grid into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(snapshot: &GridSnapshot) -> Result<String, TransferError> {
    let json = serde_json::to_vec(&snapshot.canonical()).map_err(TransferError::Serialize)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{TRANSFER_HEADER}{FIELD_DELIMITER}{encoded}"))
}

/// Decodes a grid from the provided share string.
pub(crate) fn decode(value: &str) -> Result<GridSnapshot, TransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(TransferError::EmptyPayload)?;
    let version = parts.next().ok_or(TransferError::MissingVersion)?;
    let payload = parts.next().ok_or(TransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(TransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(TransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(TransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)
}

/// Errors that can occur while converting grids to and from share strings.
#[derive(Debug)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The share string did not contain a version segment.
    MissingVersion,
    /// The share string did not include the payload segment.
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload was not a valid grid.
    InvalidPayload(serde_json::Error),
    /// The grid could not be serialised.
    Serialize(serde_json::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share string was empty"),
            Self::MissingVersion => write!(f, "share string is missing the version"),
            Self::MissingPayload => write!(f, "share string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => write!(f, "could not decode grid payload: {error}"),
            Self::InvalidPayload(error) => write!(f, "could not parse grid payload: {error}"),
            Self::Serialize(error) => write!(f, "could not serialise grid: {error}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) | Self::Serialize(error) => Some(error),
            _ => None,
        }
    }
}

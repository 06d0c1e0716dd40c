//! Payload encoding for byte-oriented transports.

use crate::request::MutationRequest;
use csbind_codec::{from_cbor, to_canonical_cbor, CodecError, CodecResult};

/// Encodes a payload to canonical CBOR.
///
/// # Errors
///
/// Fails if a field holds a callback, which has no wire form.
pub fn encode_payload(request: &MutationRequest) -> CodecResult<Vec<u8>> {
    to_canonical_cbor(&request.clone().into_value())
}

/// Decodes a payload from CBOR.
///
/// # Errors
///
/// Fails on malformed CBOR or when the top-level item is not a map.
pub fn decode_payload(bytes: &[u8]) -> CodecResult<MutationRequest> {
    let value = from_cbor(bytes)?;
    let type_name = value.type_name();
    MutationRequest::from_value(value).ok_or_else(|| {
        CodecError::invalid_structure(format!("payload must be a map, found {type_name}"))
    })
}

//! Binary data frames.
//!
//! ```text
//! TOPIC            0x01 | endpoint id (u32 LE) | payload
//! SERVICE_REQUEST  0x02 | client id (u32 LE) | call id (u32 LE) | payload
//! SERVICE_RESPONSE 0x03 | call id (u32 LE) | payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::WireError;

pub const TOPIC: u8 = 0x01;
pub const SERVICE_REQUEST: u8 = 0x02;
pub const SERVICE_RESPONSE: u8 = 0x03;

/// A decoded binary data frame. Payloads are zero-copy slices of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFrame {
    Topic {
        endpoint_id: u32,
        payload: Bytes,
    },
    ServiceRequest {
        client_id: u32,
        call_id: u32,
        payload: Bytes,
    },
    ServiceResponse {
        call_id: u32,
        payload: Bytes,
    },
}

fn min_len(opcode: u8) -> Option<usize> {
    match opcode {
        TOPIC | SERVICE_RESPONSE => Some(5),
        SERVICE_REQUEST => Some(9),
        _ => None,
    }
}

fn u32_at(frame: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ])
}

impl DataFrame {
    pub fn opcode(&self) -> u8 {
        match self {
            DataFrame::Topic { .. } => TOPIC,
            DataFrame::ServiceRequest { .. } => SERVICE_REQUEST,
            DataFrame::ServiceResponse { .. } => SERVICE_RESPONSE,
        }
    }

    pub fn payload(&self) -> &Bytes {
        match self {
            DataFrame::Topic { payload, .. }
            | DataFrame::ServiceRequest { payload, .. }
            | DataFrame::ServiceResponse { payload, .. } => payload,
        }
    }

    /// Parse a binary frame, checking the per-opcode minimum length.
    pub fn parse(frame: Bytes) -> Result<Self, WireError> {
        let opcode = *frame.first().ok_or(WireError::Empty)?;
        let min = min_len(opcode).ok_or(WireError::UnknownOpcode(opcode))?;
        if frame.len() < min {
            return Err(WireError::TooShort {
                opcode,
                len: frame.len(),
                min,
            });
        }

        Ok(match opcode {
            TOPIC => DataFrame::Topic {
                endpoint_id: u32_at(&frame, 1),
                payload: frame.slice(5..),
            },
            SERVICE_REQUEST => DataFrame::ServiceRequest {
                client_id: u32_at(&frame, 1),
                call_id: u32_at(&frame, 5),
                payload: frame.slice(9..),
            },
            _ => DataFrame::ServiceResponse {
                call_id: u32_at(&frame, 1),
                payload: frame.slice(5..),
            },
        })
    }

    pub fn encode(&self) -> Bytes {
        match self {
            DataFrame::Topic {
                endpoint_id,
                payload,
            } => encode_topic(*endpoint_id, payload),
            DataFrame::ServiceRequest {
                client_id,
                call_id,
                payload,
            } => encode_service_request(*client_id, *call_id, payload),
            DataFrame::ServiceResponse { call_id, payload } => {
                encode_service_response(*call_id, payload)
            }
        }
    }
}

fn with_header(opcode: u8, ids: &[u32], payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + 4 * ids.len() + payload.len());
    buf.put_u8(opcode);
    for id in ids {
        buf.put_u32_le(*id);
    }
    buf.put_slice(payload);
    buf.freeze()
}

pub fn encode_topic(endpoint_id: u32, payload: &[u8]) -> Bytes {
    with_header(TOPIC, &[endpoint_id], payload)
}

pub fn encode_service_request(client_id: u32, call_id: u32, payload: &[u8]) -> Bytes {
    with_header(SERVICE_REQUEST, &[client_id, call_id], payload)
}

pub fn encode_service_response(call_id: u32, payload: &[u8]) -> Bytes {
    with_header(SERVICE_RESPONSE, &[call_id], payload)
}

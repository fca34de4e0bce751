// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The wire envelope shared by every gateway frame, and the small bodies the
//! client sends (IDENTIFY, RESUME, HEARTBEAT).

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_repr::{Deserialize_repr, Serialize_repr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Opcode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    Resume = 6,
    Reconnect = 7,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

/// A decoded frame in its most generic shape: `d` is left as a [`RawValue`]
/// so the connection loop can dispatch on `op` before paying the cost of
/// decoding a concrete payload type.
#[derive(Debug, Deserialize)]
pub struct IncomingPayload<'a> {
    pub op: Opcode,
    #[serde(borrow)]
    pub d: Option<&'a RawValue>,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutgoingPayload<D> {
    pub op: Opcode,
    pub d: D,
}

#[derive(Debug, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "fluxcrystal".to_string(),
            device: "fluxcrystal".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdentifyData {
    pub token: String,
    pub properties: IdentifyProperties,
}

#[derive(Debug, Serialize)]
pub struct ResumeData {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

#[derive(Debug, Deserialize)]
pub struct HelloData {
    pub heartbeat_interval: u64,
}

pub fn identify_payload(token: &str) -> OutgoingPayload<IdentifyData> {
    OutgoingPayload {
        op: Opcode::Identify,
        d: IdentifyData {
            token: token.to_string(),
            properties: IdentifyProperties::default(),
        },
    }
}

pub fn resume_payload(token: &str, session_id: &str, seq: u64) -> OutgoingPayload<ResumeData> {
    OutgoingPayload {
        op: Opcode::Resume,
        d: ResumeData {
            token: token.to_string(),
            session_id: session_id.to_string(),
            seq,
        },
    }
}

pub fn heartbeat_payload(last_sequence: Option<u64>) -> OutgoingPayload<Option<u64>> {
    OutgoingPayload {
        op: Opcode::Heartbeat,
        d: last_sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_carries_fluxcrystal_device_properties() {
        let payload = identify_payload("tok");
        assert_eq!(payload.d.properties.browser, "fluxcrystal");
        assert_eq!(payload.d.properties.device, "fluxcrystal");
    }

    #[test]
    fn decodes_hello_with_interval() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250}}"#;
        let decoded: IncomingPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.op, Opcode::Hello);
        let hello: HelloData = serde_json::from_str(decoded.d.unwrap().get()).unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }
}

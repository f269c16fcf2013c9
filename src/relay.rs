use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response status the wire contract defines.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("relay JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed request {request_id}: {reason}")]
    MalformedRequest { request_id: String, reason: String },
}

/// Signing request as posted by the companion app.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigningRequest {
    #[serde(rename = "transactionPayload")]
    pub transaction_payload: String,
}

/// Response released by the device once the gesture is confirmed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigningResponse {
    pub signature: String,
    pub status: String,
    pub timestamp: f64,
}

/// Transport between the companion app and the device. The request is
/// removed only after its response is posted.
pub trait SigningRelay {
    /// Pending request ids with their payloads, oldest first.
    fn pending_requests(&mut self) -> Result<Vec<(String, SigningRequest)>, RelayError>;
    /// Writes the response for a request, then deletes the request.
    fn post_response(
        &mut self,
        request_id: &str,
        response: &SigningResponse,
    ) -> Result<(), RelayError>;
    /// Drops every pending request and stored response.
    fn clear(&mut self) -> Result<(), RelayError>;
}

/// Directory-backed relay: one JSON file per request id under
/// `signing_requests/`, responses under `signing_responses/`.
pub struct DirRelay {
    requests_dir: PathBuf,
    responses_dir: PathBuf,
}

impl DirRelay {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, RelayError> {
        let root = root.as_ref();
        let requests_dir = root.join("signing_requests");
        let responses_dir = root.join("signing_responses");
        fs::create_dir_all(&requests_dir)?;
        fs::create_dir_all(&responses_dir)?;
        Ok(Self {
            requests_dir,
            responses_dir,
        })
    }

    /// App-side helper: drops a request file for the device to pick up.
    pub fn submit(&self, request_id: &str, request: &SigningRequest) -> Result<(), RelayError> {
        let path = self.requests_dir.join(format!("{request_id}.json"));
        fs::write(path, serde_json::to_string_pretty(request)?)?;
        Ok(())
    }

    /// App-side helper: reads the response for a request if one was posted.
    pub fn response(&self, request_id: &str) -> Result<Option<SigningResponse>, RelayError> {
        let path = self.responses_dir.join(format!("{request_id}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn json_entries(dir: &Path) -> Result<Vec<PathBuf>, RelayError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl SigningRelay for DirRelay {
    fn pending_requests(&mut self) -> Result<Vec<(String, SigningRequest)>, RelayError> {
        let mut pending = Vec::new();
        for path in Self::json_entries(&self.requests_dir)? {
            let request_id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = fs::read_to_string(&path)?;
            let request: SigningRequest =
                serde_json::from_str(&text).map_err(|e| RelayError::MalformedRequest {
                    request_id: request_id.clone(),
                    reason: e.to_string(),
                })?;
            pending.push((request_id, request));
        }
        Ok(pending)
    }

    fn post_response(
        &mut self,
        request_id: &str,
        response: &SigningResponse,
    ) -> Result<(), RelayError> {
        let response_path = self.responses_dir.join(format!("{request_id}.json"));
        fs::write(response_path, serde_json::to_string_pretty(response)?)?;
        let request_path = self.requests_dir.join(format!("{request_id}.json"));
        if request_path.exists() {
            fs::remove_file(request_path)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RelayError> {
        for dir in [&self.requests_dir, &self.responses_dir] {
            for path in Self::json_entries(dir)? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// In-memory relay for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryRelay {
    requests: VecDeque<(String, SigningRequest)>,
    responses: Vec<(String, SigningResponse)>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, request_id: &str, transaction_payload: &str) {
        self.requests.push_back((
            request_id.to_string(),
            SigningRequest {
                transaction_payload: transaction_payload.to_string(),
            },
        ));
    }

    pub fn pending_len(&self) -> usize {
        self.requests.len()
    }

    pub fn responses(&self) -> &[(String, SigningResponse)] {
        &self.responses
    }
}

impl SigningRelay for MemoryRelay {
    fn pending_requests(&mut self) -> Result<Vec<(String, SigningRequest)>, RelayError> {
        Ok(self.requests.iter().cloned().collect())
    }

    fn post_response(
        &mut self,
        request_id: &str,
        response: &SigningResponse,
    ) -> Result<(), RelayError> {
        self.responses.push((request_id.to_string(), response.clone()));
        self.requests.retain(|(id, _)| id != request_id);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RelayError> {
        self.requests.clear();
        self.responses.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stepsign-relay-{tag}-{}", std::process::id()))
    }

    #[test]
    fn dir_relay_round_trips_a_request() {
        let root = temp_root("roundtrip");
        let mut relay = DirRelay::open(&root).unwrap();
        relay.clear().unwrap();

        relay
            .submit(
                "req-1",
                &SigningRequest {
                    transaction_payload: "AAECAw==".into(),
                },
            )
            .unwrap();
        let pending = relay.pending_requests().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, "req-1");
        assert_eq!(pending[0].1.transaction_payload, "AAECAw==");

        let response = SigningResponse {
            signature: "c2ln".into(),
            status: STATUS_COMPLETED.into(),
            timestamp: 1722900000.5,
        };
        relay.post_response("req-1", &response).unwrap();
        // Request deleted after the response lands.
        assert!(relay.pending_requests().unwrap().is_empty());
        assert_eq!(relay.response("req-1").unwrap().unwrap(), response);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn dir_relay_clear_empties_both_sides() {
        let root = temp_root("clear");
        let mut relay = DirRelay::open(&root).unwrap();
        relay
            .submit(
                "stale",
                &SigningRequest {
                    transaction_payload: "AA==".into(),
                },
            )
            .unwrap();
        relay
            .post_response(
                "old",
                &SigningResponse {
                    signature: "x".into(),
                    status: STATUS_COMPLETED.into(),
                    timestamp: 0.0,
                },
            )
            .unwrap();
        relay.clear().unwrap();
        assert!(relay.pending_requests().unwrap().is_empty());
        assert!(relay.response("old").unwrap().is_none());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn malformed_request_file_is_reported_with_its_id() {
        let root = temp_root("malformed");
        let mut relay = DirRelay::open(&root).unwrap();
        relay.clear().unwrap();
        fs::write(root.join("signing_requests/broken.json"), "{nope").unwrap();
        let err = relay.pending_requests().unwrap_err();
        assert!(matches!(
            err,
            RelayError::MalformedRequest { request_id, .. } if request_id == "broken"
        ));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn wire_field_names_match_the_contract() {
        let request = SigningRequest {
            transaction_payload: "AAEC".into(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"transactionPayload":"AAEC"}"#);

        let response = SigningResponse {
            signature: "c2ln".into(),
            status: STATUS_COMPLETED.into(),
            timestamp: 12.5,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["signature"], "c2ln");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["timestamp"], 12.5);
    }
}

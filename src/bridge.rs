use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};
use thiserror::Error;

use crate::dataset::GestureSample;
use crate::model::{GestureDetector, ModelError};
use crate::relay::{RelayError, SigningRelay, SigningResponse, STATUS_COMPLETED};
use crate::signal::{GestureKind, SignalError, SynthesisConfig, Synthesizer};
use crate::signer::{DeviceKey, SignerError};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("request {request_id} carries an invalid base64 payload: {reason}")]
    BadPayload { request_id: String, reason: String },

    #[error("gave up after {0} consecutive poll failures")]
    RetriesExhausted(usize),
}

/// Source of live gesture captures for the bridge to classify.
pub trait GestureCapture {
    fn capture(&mut self) -> Result<GestureSample, BridgeError>;
}

/// Stand-in for the physical insole: synthesizes a fixed gesture on demand,
/// advancing the seed per capture so traces differ run to run.
pub struct SimulatedCapture {
    synth: Synthesizer,
    kind: GestureKind,
    duration_secs: f64,
    next_seed: u64,
}

impl SimulatedCapture {
    pub fn new(
        config: SynthesisConfig,
        kind: GestureKind,
        duration_secs: f64,
        seed: u64,
    ) -> Result<Self, SignalError> {
        Ok(Self {
            synth: Synthesizer::new(config)?,
            kind,
            duration_secs,
            next_seed: seed,
        })
    }
}

impl GestureCapture for SimulatedCapture {
    fn capture(&mut self) -> Result<GestureSample, BridgeError> {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        let trace = self.synth.synthesize(self.kind, self.duration_secs, seed)?;
        Ok(GestureSample::from_trace(
            format!("capture_{seed}"),
            self.kind,
            &trace,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Polling,
    Acting,
    Terminated,
}

#[derive(Clone, Copy, Debug)]
pub struct BridgeConfig {
    /// Gesture that releases a signature.
    pub armed_gesture: GestureKind,
    pub confidence_threshold: f32,
    pub poll_interval: Duration,
    /// Longer sleep after a failed poll.
    pub error_backoff: Duration,
    pub max_consecutive_errors: usize,
    /// Stop after this many signatures; `None` runs on the error budget only.
    pub max_signatures: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            armed_gesture: GestureKind::DoubleTap,
            confidence_threshold: 0.5,
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            max_consecutive_errors: 5,
            max_signatures: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BridgeReport {
    pub signed: usize,
    pub rejected: usize,
    pub polls: u64,
}

/// Polling state machine tying the relay, the gesture detector and the
/// device key together. Single-threaded and blocking throughout.
pub struct SigningBridge<R: SigningRelay, C: GestureCapture> {
    relay: R,
    capture: C,
    detector: GestureDetector,
    key: DeviceKey,
    config: BridgeConfig,
    state: BridgeState,
}

impl<R: SigningRelay, C: GestureCapture> SigningBridge<R, C> {
    pub fn new(
        relay: R,
        capture: C,
        detector: GestureDetector,
        key: DeviceKey,
        config: BridgeConfig,
    ) -> Self {
        Self {
            relay,
            capture,
            detector,
            key,
            config,
            state: BridgeState::Polling,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn relay_mut(&mut self) -> &mut R {
        &mut self.relay
    }

    pub fn run(&mut self) -> Result<BridgeReport, BridgeError> {
        info!("signing bridge online as {}", self.key.address());
        let mut report = BridgeReport::default();
        let mut consecutive_errors = 0usize;
        loop {
            match self.poll_once(&mut report) {
                Ok(()) => consecutive_errors = 0,
                Err(err) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        self.state = BridgeState::Terminated;
                        warn!("bridge giving up: {err}");
                        return Err(BridgeError::RetriesExhausted(consecutive_errors));
                    }
                    warn!("poll failed ({err}); backing off");
                    thread::sleep(self.config.error_backoff);
                    continue;
                }
            }
            if let Some(limit) = self.config.max_signatures {
                if report.signed >= limit {
                    self.state = BridgeState::Terminated;
                    return Ok(report);
                }
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    fn poll_once(&mut self, report: &mut BridgeReport) -> Result<(), BridgeError> {
        self.state = BridgeState::Polling;
        report.polls += 1;
        for (request_id, request) in self.relay.pending_requests()? {
            self.state = BridgeState::Acting;
            let payload = BASE64
                .decode(request.transaction_payload.as_bytes())
                .map_err(|e| BridgeError::BadPayload {
                    request_id: request_id.clone(),
                    reason: e.to_string(),
                })?;
            info!("signing request received [id: {request_id}]");
            let sample = self.capture.capture()?;
            let verdict = self.detector.detect(&sample)?;
            let armed = self.config.armed_gesture.label();
            match verdict {
                Some(d) if d.label == armed && d.confidence >= self.config.confidence_threshold => {
                    let response = SigningResponse {
                        signature: self.key.sign(&payload),
                        status: STATUS_COMPLETED.to_string(),
                        timestamp: unix_now(),
                    };
                    self.relay.post_response(&request_id, &response)?;
                    report.signed += 1;
                    info!("gesture {armed} confirmed; signature posted for {request_id}");
                }
                Some(d) => {
                    report.rejected += 1;
                    warn!(
                        "gesture {} (confidence {:.2}) does not arm signing; {request_id} stays pending",
                        d.label, d.confidence
                    );
                }
                None => {
                    report.rejected += 1;
                    warn!("capture too short to classify; {request_id} stays pending");
                }
            }
        }
        self.state = BridgeState::Polling;
        Ok(())
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trainer::{synthetic_dataset, train, TrainerConfig};
    use crate::model::{quantize, GestureDetector};
    use crate::relay::MemoryRelay;

    const KEY_B64: &str = "xY+HWAwzztWjYp00T8y+G0sEwT+P3N+c1eY4j8lVpjs=";

    fn detector() -> GestureDetector {
        let report = train(&synthetic_dataset(3), &TrainerConfig::default()).unwrap();
        GestureDetector::new(quantize(&report.model).unwrap()).unwrap()
    }

    fn capture(kind: GestureKind) -> SimulatedCapture {
        SimulatedCapture::new(SynthesisConfig::default(), kind, 1.2, 555).unwrap()
    }

    fn test_config() -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::ZERO,
            error_backoff: Duration::ZERO,
            max_signatures: Some(2),
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn armed_gesture_releases_signatures_and_drains_requests() {
        let mut relay = MemoryRelay::new();
        relay.submit("req-a", &BASE64.encode(b"tx-a"));
        relay.submit("req-b", &BASE64.encode(b"tx-b"));

        let key = DeviceKey::from_base64(KEY_B64).unwrap();
        let expected_a = key.sign(b"tx-a");
        let mut bridge = SigningBridge::new(
            relay,
            capture(GestureKind::DoubleTap),
            detector(),
            DeviceKey::from_base64(KEY_B64).unwrap(),
            test_config(),
        );
        let report = bridge.run().unwrap();

        assert_eq!(report.signed, 2);
        assert_eq!(report.rejected, 0);
        assert_eq!(bridge.state(), BridgeState::Terminated);
        let relay = bridge.relay_mut();
        assert_eq!(relay.pending_len(), 0);
        assert_eq!(relay.responses().len(), 2);
        let (id, response) = &relay.responses()[0];
        assert_eq!(id, "req-a");
        assert_eq!(response.status, STATUS_COMPLETED);
        assert_eq!(response.signature, expected_a);
        assert!(response.timestamp > 0.0);
    }

    #[test]
    fn wrong_gesture_leaves_the_request_pending() {
        let mut relay = MemoryRelay::new();
        relay.submit("req-a", &BASE64.encode(b"tx-a"));
        let mut bridge = SigningBridge::new(
            relay,
            capture(GestureKind::Rest),
            detector(),
            DeviceKey::from_base64(KEY_B64).unwrap(),
            test_config(),
        );
        let mut report = BridgeReport::default();
        bridge.poll_once(&mut report).unwrap();
        assert_eq!(report.signed, 0);
        assert_eq!(report.rejected, 1);
        let relay = bridge.relay_mut();
        assert_eq!(relay.pending_len(), 1);
        assert!(relay.responses().is_empty());
    }

    #[test]
    fn bad_payload_consumes_the_retry_budget() {
        let mut relay = MemoryRelay::new();
        relay.submit("req-a", "!!not-base64!!");
        let mut bridge = SigningBridge::new(
            relay,
            capture(GestureKind::DoubleTap),
            detector(),
            DeviceKey::from_base64(KEY_B64).unwrap(),
            test_config(),
        );
        let err = bridge.run().unwrap_err();
        assert!(matches!(err, BridgeError::RetriesExhausted(5)));
        assert_eq!(bridge.state(), BridgeState::Terminated);
    }
}

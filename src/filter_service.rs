//! # Filtering Service Module
//!
//! Boundary to the external biomechanical filtering service. That service
//! receives the raw samples plus participant biometrics and answers with a
//! filtered time series and its own summary metrics. The analyzer never
//! waits on it: requests are dispatched fire-and-forget and the outcome is
//! only logged and forwarded to whoever listens.
//!
//! ## Key Components
//! - `FilterService`: Async request/response trait implemented by clients
//! - `FilterDispatcher`: Dedicated thread with its own Tokio runtime that
//!   accepts `FilterCommand`s and spawns one task per request
//! - `dispatch_filtering`: Spawn a single request on an existing runtime

use crate::error::FilterError;
use crate::sample::SensorSample;
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

/// One raw sample as the filtering service expects it
///
/// `timestamp` is Unix time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSample {
    pub timestamp: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl From<&SensorSample> for FilterSample {
    fn from(sample: &SensorSample) -> Self {
        Self {
            timestamp: sample.timestamp_ms() as f64 / 1000.0,
            accel_x: sample.accel_x,
            accel_y: sample.accel_y,
            accel_z: sample.accel_z,
            gyro_x: sample.gyro_x,
            gyro_y: sample.gyro_y,
            gyro_z: sample.gyro_z,
        }
    }
}

/// Payload sent to the filtering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(rename = "dados")]
    pub samples: Vec<FilterSample>,
    #[serde(rename = "peso")]
    pub weight_kg: f64,
    #[serde(rename = "altura")]
    pub height_m: f64,
    #[serde(rename = "idade")]
    pub age: u32,
    #[serde(rename = "sexo")]
    pub sex: String,
}

impl FilterRequest {
    pub fn new(samples: &[SensorSample], weight_kg: f64, height_m: f64, age: u32, sex: String) -> Self {
        Self {
            samples: samples.iter().map(FilterSample::from).collect(),
            weight_kg,
            height_m,
            age,
            sex,
        }
    }
}

/// One filtered sample, timed in seconds from the start of the series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredSample {
    pub time_offset: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

/// Summary metrics computed by the filtering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMetrics {
    #[serde(rename = "num_repeticoes")]
    pub repetitions: u32,
    #[serde(rename = "potencia_media")]
    pub mean_power: f64,
    #[serde(rename = "energia_total")]
    pub total_energy: f64,
    #[serde(rename = "classificacao")]
    pub classification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "timeseries_filtrada")]
    pub filtered: Vec<FilteredSample>,
    #[serde(rename = "metricas")]
    pub metrics: FilterMetrics,
}

/// Request/response client for the filtering service
#[async_trait]
pub trait FilterService: Send + Sync {
    async fn process(&self, request: FilterRequest) -> Result<FilterResponse, FilterError>;
}

/// Result of one dispatched request
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub evaluation_id: String,
    pub result: Result<FilterResponse, FilterError>,
}

#[derive(Debug, Clone)]
pub enum FilterCommand {
    Dispatch {
        evaluation_id: String,
        request: FilterRequest,
    },
    Shutdown,
}

async fn run_request(
    service: Arc<dyn FilterService>,
    evaluation_id: String,
    request: FilterRequest,
) -> FilterOutcome {
    let sample_count = request.samples.len();
    let result = service.process(request).await;
    match &result {
        Ok(response) => log::info!(
            "Filtering for evaluation {} returned {} samples, {} repetitions",
            evaluation_id,
            response.filtered.len(),
            response.metrics.repetitions
        ),
        Err(e) => log::warn!(
            "Filtering for evaluation {} ({} samples) failed: {}",
            evaluation_id,
            sample_count,
            e
        ),
    }
    FilterOutcome {
        evaluation_id,
        result,
    }
}

/// Spawn one filtering request on the current Tokio runtime
///
/// Must be called from within a runtime. The returned handle can be
/// dropped; the request still runs to completion.
pub fn dispatch_filtering(
    service: Arc<dyn FilterService>,
    evaluation_id: String,
    request: FilterRequest,
) -> JoinHandle<FilterOutcome> {
    tokio::spawn(run_request(service, evaluation_id, request))
}

/// Drop handles of requests that have already completed
fn prune_finished<T>(handles: &mut Vec<JoinHandle<T>>) {
    handles.retain(|handle| !handle.is_finished());
}

/// Runs filtering requests off the caller's thread.
///
/// Owns a Tokio runtime on a dedicated thread so synchronous callers can
/// hand off requests without blocking or running a runtime themselves.
pub struct FilterDispatcher {
    service: Arc<dyn FilterService>,
    command_receiver: Receiver<FilterCommand>,
    outcome_sender: Option<Sender<FilterOutcome>>,
}

impl FilterDispatcher {
    /// Creates a new FilterDispatcher.
    ///
    /// Returns the dispatcher and a sender for issuing commands. Outcomes are
    /// forwarded to `outcome_sender` when one is given.
    pub fn new(
        service: Arc<dyn FilterService>,
        outcome_sender: Option<Sender<FilterOutcome>>,
    ) -> (Self, Sender<FilterCommand>) {
        let (command_sender, command_receiver) = unbounded();

        let dispatcher = FilterDispatcher {
            service,
            command_receiver,
            outcome_sender,
        };

        (dispatcher, command_sender)
    }

    /// Runs the dispatch loop.
    ///
    /// This should be called in a spawned thread. It returns on `Shutdown` or
    /// when every command sender has been dropped, after in-flight requests finish.
    pub fn run(self) {
        let rt = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Filter dispatcher: failed to create async runtime: {}", e);
                return;
            }
        };

        let mut in_flight = Vec::new();

        while let Ok(command) = self.command_receiver.recv() {
            prune_finished(&mut in_flight);
            match command {
                FilterCommand::Dispatch {
                    evaluation_id,
                    request,
                } => {
                    log::debug!("Filter dispatcher: sending evaluation {}", evaluation_id);
                    let service = self.service.clone();
                    let outcome_sender = self.outcome_sender.clone();
                    in_flight.push(rt.spawn(async move {
                        let outcome = run_request(service, evaluation_id, request).await;
                        if let Some(sender) = outcome_sender {
                            let _ = sender.send(outcome);
                        }
                    }));
                }
                FilterCommand::Shutdown => {
                    log::info!("Filter dispatcher: shutdown requested");
                    break;
                }
            }
        }

        rt.block_on(async {
            for handle in in_flight {
                let _ = handle.await;
            }
        });
        log::info!("Filter dispatcher: stopped");
    }
}

//! Advisor worker.
//!
//! Bridges the synchronous game loop with an oracle running on a tokio
//! runtime. `submit` and `poll` never block the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::core::advice::{AdviceRequest, AdviceResponse};
use crate::oracle::MoveOracle;

/// Requests allowed in flight before `submit` starts refusing
pub const DEFAULT_CAPACITY: usize = 8;

/// Running advisor instance
pub struct AdvisorWorker {
    rt: Runtime,
    req_tx: mpsc::Sender<AdviceRequest>,
    resp_rx: mpsc::UnboundedReceiver<AdviceResponse>,
}

impl AdvisorWorker {
    pub fn spawn<O>(oracle: O) -> Result<Self>
    where
        O: MoveOracle + Send + Sync + 'static,
    {
        Self::with_capacity(oracle, DEFAULT_CAPACITY)
    }

    pub fn with_capacity<O>(oracle: O, capacity: usize) -> Result<Self>
    where
        O: MoveOracle + Send + Sync + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel::<AdviceRequest>(capacity.max(1));
        let (resp_tx, resp_rx) = mpsc::unbounded_channel::<AdviceResponse>();

        let rt = Runtime::new().context("failed to create advisor runtime")?;
        rt.spawn(run_oracle(Arc::new(oracle), req_rx, resp_tx));

        Ok(Self {
            rt,
            req_tx,
            resp_rx,
        })
    }

    /// Queue a request. Returns false if the worker is saturated or gone.
    pub fn submit(&self, request: AdviceRequest) -> bool {
        match self.req_tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(req)) => {
                log::warn!("advisor busy, dropping request for turn {}", req.turn_id);
                false
            }
            Err(TrySendError::Closed(req)) => {
                log::warn!("advisor stopped, dropping request for turn {}", req.turn_id);
                false
            }
        }
    }

    /// Responses that are ready now
    pub fn poll(&mut self) -> Vec<AdviceResponse> {
        let mut ready = Vec::new();
        while let Ok(resp) = self.resp_rx.try_recv() {
            ready.push(resp);
        }
        ready
    }

    /// Block until the next response arrives or `timeout` passes
    pub fn wait(&mut self, timeout: Duration) -> Option<AdviceResponse> {
        let rx = &mut self.resp_rx;
        self.rt
            .block_on(async { tokio::time::timeout(timeout, rx.recv()).await.ok().flatten() })
    }
}

async fn run_oracle<O>(
    oracle: Arc<O>,
    mut requests: mpsc::Receiver<AdviceRequest>,
    responses: mpsc::UnboundedSender<AdviceResponse>,
) where
    O: MoveOracle + Send + Sync + 'static,
{
    while let Some(mut request) = requests.recv().await {
        // Only the newest queued request can still be current.
        while let Ok(newer) = requests.try_recv() {
            log::debug!("skipping superseded request for turn {}", request.turn_id);
            request = newer;
        }

        let turn_id = request.turn_id;
        let oracle = Arc::clone(&oracle);
        let suggestion = match tokio::task::spawn_blocking(move || oracle.best_move(&request)).await {
            Ok(suggestion) => suggestion,
            Err(err) => {
                log::warn!("oracle failed for turn {}: {}", turn_id, err);
                None
            }
        };

        if responses
            .send(AdviceResponse {
                turn_id,
                suggestion,
            })
            .is_err()
        {
            break;
        }
    }
    log::debug!("advisor loop stopped");
}

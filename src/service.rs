//! Serialized access to the lighting chip.

use std::sync::Arc;

use log::info;
use tokio::sync::Mutex;

use crate::{
    bus::BusOpener,
    error::{LightingError, LightingResult},
    lighting::{Color, LightingController, Mode},
};

/// Reply of [`ControlService::ping`].
pub const PING_REPLY: &str = "pong";

/// Owns the single [`LightingController`] of the process.
///
/// Every hardware operation holds the gate for its whole register sequence,
/// so two callers can never interleave writes on the chip. Waiters are
/// served in arrival order (tokio's mutex is fair). Bus transfers block, so
/// they run on the blocking pool while the gate is held.
///
/// Writers outside this process are not guarded.
#[derive(Debug)]
pub struct ControlService<O> {
    gate: Arc<Mutex<LightingController<O>>>,
}

impl<O> Clone for ControlService<O> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<O: BusOpener> ControlService<O> {
    pub fn new(controller: LightingController<O>) -> Self {
        Self {
            gate: Arc::new(Mutex::new(controller)),
        }
    }

    /// Liveness probe; touches neither the gate nor the hardware.
    pub fn ping(&self) -> &'static str {
        info!("System pinged!");
        PING_REPLY
    }

    pub async fn get_color(&self) -> LightingResult<Color> {
        self.run(|ctrl| ctrl.get_color()).await
    }

    pub async fn set_color(&self, color: Color) -> LightingResult<()> {
        self.run(move |ctrl| ctrl.set_color(color)).await
    }

    pub async fn get_mode(&self) -> LightingResult<Mode> {
        self.run(|ctrl| ctrl.get_mode()).await
    }

    pub async fn set_mode(&self, mode: Mode) -> LightingResult<()> {
        self.run(move |ctrl| ctrl.set_mode(mode)).await
    }

    async fn run<T, F>(&self, op: F) -> LightingResult<T>
    where
        F: FnOnce(&LightingController<O>) -> LightingResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.gate.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || op(&*guard))
            .await
            .map_err(|e| LightingError::Worker(e.to_string()))?
    }
}

//! Scrape Cycle
//!
//! One scrape is a single pass of login → fetch → decode → extract, always
//! followed by logout. Cycles never overlap: the switch allows one web session
//! at a time, and a second login would kick out (or be refused by) the first.
//! Requests that arrive while a cycle is running wait for it to finish and then
//! run their own.
//!
//! # Error Handling
//!
//! Any failure ends the cycle. It is returned to the caller, which decides
//! what to publish; nothing is retried within the cycle.

use crate::config::DeviceConfig;
use crate::error::{ExporterError, Result};
use crate::gs1200::client::{Gs1200Client, Session};
use crate::gs1200::extract;
use crate::gs1200::password;
use crate::gs1200::payload;
use crate::gs1200::types::{DeviceState, Endpoint};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Runs scrape cycles against one switch, one at a time.
pub struct Scraper {
    client: Gs1200Client,
    /// Held for the whole login → logout cycle; FIFO, so waiters queue in order
    cycle: Mutex<()>,
}

impl Scraper {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        Ok(Self::with_client(Gs1200Client::new(config)?))
    }

    pub fn with_client(client: Gs1200Client) -> Self {
        Self {
            client,
            cycle: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &Gs1200Client {
        &self.client
    }

    /// Run one full cycle and return the device state it produced.
    pub async fn scrape(&self) -> Result<DeviceState> {
        self.scrape_then(|outcome, _| outcome).await
    }

    /// Run one full cycle and hand its outcome and duration to `publish`.
    ///
    /// `publish` runs before the next queued cycle starts, so results land in
    /// the order the cycles ran.
    pub async fn scrape_then<T>(
        &self,
        publish: impl FnOnce(Result<DeviceState>, Duration) -> T,
    ) -> T {
        let _cycle = self.cycle.lock().await;
        let started = Instant::now();
        let outcome = self.run_cycle().await;
        publish(outcome, started.elapsed())
    }

    async fn run_cycle(&self) -> Result<DeviceState> {
        debug!("Starting scrape cycle against {}", self.client.base_url());

        let mut session = self.client.session()?;
        let outcome = gather(&mut session).await;
        // Logout runs whatever happened above
        session.logout().await;

        match &outcome {
            Ok(state) => {
                info!(
                    "Scraped {} ({}): {} ports, {} VLANs",
                    state.identity.model,
                    state.identity.firmware,
                    state.identity.port_count,
                    state.vlans.len()
                );
                self.check_password_mode(&state.identity.firmware);
            }
            Err(ExporterError::LoginRejected(reason)) => warn!(
                "Switch rejected the login ({}); firmware V2.00(xxxx.1) and newer need obfuscate_password = true, older firmware needs false (currently {})",
                reason,
                self.client.obfuscates_password()
            ),
            Err(_) => {}
        }

        outcome
    }

    fn check_password_mode(&self, firmware: &str) {
        let expected = password::firmware_requires_obfuscation(firmware);
        if expected != self.client.obfuscates_password() {
            warn!(
                "Firmware {} usually expects obfuscate_password = {}, but it is set to {}",
                firmware,
                expected,
                self.client.obfuscates_password()
            );
        }
    }
}

async fn gather(session: &mut Session<'_>) -> Result<DeviceState> {
    session.login().await?;
    let raw = session.fetch_payloads().await?;

    let system = payload::decode(Endpoint::System, &raw.system)?;
    let link = payload::decode(Endpoint::Link, &raw.link)?;
    let vlans = payload::decode(Endpoint::Vlan, &raw.vlan)?;

    extract::extract(&system, &link, &vlans)
}

//! GS1200 Web Session Client
//!
//! The switch has no API. Its web UI logs in by posting a password form to
//! `/login.cgi`, which sets a session cookie; the UI then loads its state from
//! small script files and logs out through `/logout.html`.
//!
//! # Session lifecycle
//!
//! ```text
//! LoggedOut ──login()──► LoggingIn ──► LoggedIn ──fetch_payloads()──► FetchingPayloads
//!     ▲                                   ▲                                 │
//!     │                                   └─────────────────────────────────┘
//!     └──────────────── LoggingOut ◄──logout()── (any state, including Failed)
//! ```
//!
//! Any failed step moves the session to `Failed`. `logout()` is accepted from
//! every state because the device usually allows only one active session: a
//! session left open blocks the next scrape until it times out on the switch.
//!
//! Each [`Session`] carries its own cookie jar, so nothing leaks between
//! scrape cycles.

use crate::config::DeviceConfig;
use crate::error::{ExporterError, Result};
use crate::gs1200::password;
use crate::gs1200::payload;
use crate::gs1200::types::Endpoint;
use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const LOGIN_PATH: &str = "/login.cgi";
const LOGOUT_PATH: &str = "/logout.html";

/// Shown by the firmware when the password was not accepted; the status is still 200.
const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Where a [`Session`] is in its login → fetch → logout lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    LoggedIn,
    FetchingPayloads,
    LoggingOut,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::LoggedOut => "logged out",
            SessionState::LoggingIn => "logging in",
            SessionState::LoggedIn => "logged in",
            SessionState::FetchingPayloads => "fetching payloads",
            SessionState::LoggingOut => "logging out",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Raw script text for each endpoint, as served by the switch.
#[derive(Debug, Clone)]
pub struct RawPayloads {
    pub system: String,
    pub link: String,
    pub vlan: String,
}

/// Client for one GS1200 switch
///
/// Holds connection settings only. Every scrape cycle opens its own
/// [`Session`] through [`Gs1200Client::session`].
#[derive(Debug, Clone)]
pub struct Gs1200Client {
    base_url: Url,
    password: SecretString,
    obfuscate_password: bool,
    timeout: Duration,
}

impl Gs1200Client {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let address = config.address.trim().trim_end_matches('/');
        let base = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };
        let base_url = Url::parse(&base)
            .map_err(|e| ExporterError::Config(format!("invalid switch address '{}': {}", address, e)))?;

        Ok(Self {
            base_url,
            password: config.password.clone(),
            obfuscate_password: config.obfuscate_password,
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn obfuscates_password(&self) -> bool {
        self.obfuscate_password
    }

    /// Open a fresh, logged-out session with an empty cookie jar.
    pub fn session(&self) -> Result<Session<'_>> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(concat!("gs1200-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Session {
            client: self,
            http,
            state: SessionState::LoggedOut,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ExporterError::Config(format!("invalid request path '{}': {}", path, e)))
    }

    fn login_password(&self) -> Result<String> {
        let plain = self.password.expose_secret();
        if !self.obfuscate_password {
            return Ok(plain.to_string());
        }
        password::obfuscate(plain).ok_or_else(|| {
            ExporterError::Config("password contains characters that cannot be obfuscated".to_string())
        })
    }
}

/// One authenticated conversation with the switch.
pub struct Session<'a> {
    client: &'a Gs1200Client,
    http: reqwest::Client,
    state: SessionState,
}

impl Session<'_> {
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
    }

    /// Record the outcome of a step, moving to `Failed` on error.
    fn settle<T>(&mut self, result: Result<T>, on_success: SessionState) -> Result<T> {
        match result {
            Ok(value) => {
                self.transition(on_success);
                Ok(value)
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Post the password form.
    ///
    /// The switch answers a successful login with an unremarkable page, so this
    /// only fails on transport errors, a non-success status or the firmware's
    /// explicit wrong-password notice. Whether the session really works shows on
    /// the first fetch.
    pub async fn login(&mut self) -> Result<()> {
        self.transition(SessionState::LoggingIn);
        let result = self.post_login().await;
        self.settle(result, SessionState::LoggedIn)
    }

    async fn post_login(&self) -> Result<()> {
        let url = self.client.url(LOGIN_PATH)?;
        debug!("Logging in at {}", url);

        let form = [("password", self.client.login_password()?)];
        let resp = self.http.post(url).form(&form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExporterError::LoginRejected(format!("HTTP {}", status)));
        }

        let body = resp.text().await?;
        if body.contains(INCORRECT_PASSWORD) {
            return Err(ExporterError::LoginRejected("incorrect password".to_string()));
        }

        Ok(())
    }

    /// Fetch one script endpoint.
    ///
    /// Fails with [`ExporterError::SessionInvalid`] when the switch serves an
    /// HTML page instead, which it does when the session is not logged in.
    pub async fn fetch_payload(&self, endpoint: Endpoint) -> Result<String> {
        let url = self.client.url(&endpoint.path())?;
        debug!("Fetching {}", url);

        let text = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if payload::is_html_page(&text) {
            return Err(ExporterError::SessionInvalid {
                endpoint: endpoint.to_string(),
            });
        }

        debug!("Fetched {} ({} bytes)", endpoint, text.len());
        Ok(text)
    }

    /// Fetch all three endpoints concurrently.
    ///
    /// Every request runs to completion before this returns, even when one of
    /// them fails early; the first error in endpoint order is reported.
    pub async fn fetch_payloads(&mut self) -> Result<RawPayloads> {
        if self.state != SessionState::LoggedIn {
            warn!("Fetching payloads while session is {}", self.state);
        }
        self.transition(SessionState::FetchingPayloads);

        let (system, link, vlan) = tokio::join!(
            self.fetch_payload(Endpoint::System),
            self.fetch_payload(Endpoint::Link),
            self.fetch_payload(Endpoint::Vlan),
        );

        let result = match (system, link, vlan) {
            (Ok(system), Ok(link), Ok(vlan)) => Ok(RawPayloads { system, link, vlan }),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err(e),
        };
        self.settle(result, SessionState::LoggedIn)
    }

    /// End the session. Best effort: failures are logged, never returned.
    pub async fn logout(&mut self) {
        self.transition(SessionState::LoggingOut);

        match self.get_logout().await {
            Ok(()) => debug!("Logged out"),
            Err(e) => warn!("Logout failed, switch session will expire on its own: {}", e),
        }

        self.transition(SessionState::LoggedOut);
    }

    async fn get_logout(&self) -> Result<()> {
        let url = self.client.url(LOGOUT_PATH)?;
        debug!("Logging out at {}", url);
        self.http.get(url).send().await?.bytes().await?;
        Ok(())
    }
}

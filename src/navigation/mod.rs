pub mod channel;

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::catalog::{Payload, Target};
use crate::error::{CapdeckError, CapdeckResult};
use crate::host::ScreenResult;

pub use channel::{ChannelOutcome, ChannelState, ChannelToken, ResultChannel, ResultChannels};

/// Which screen the application is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "token", rename_all = "snake_case")]
pub enum Screen {
    Splash,
    Home,
    Secondary(ChannelToken),
}

struct NavState {
    screen: Screen,
    channels: ResultChannels,
}

/// Splash → Home → Secondary sequencing, and owner of the result channels.
///
/// Leaving `Secondary` is the single point where a result-returning flow is
/// woken: `resolve`, `cancel` and `back` all settle the channel, which fires
/// the receiver handed out by `open`.
pub struct NavigationController {
    inner: Mutex<NavState>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(NavState {
                screen: Screen::Splash,
                channels: ResultChannels::new(),
            }),
        }
    }

    /// Start directly at Home (tests, headless hosts).
    pub fn at_home() -> Self {
        let nav = Self::new();
        nav.splash_finished();
        nav
    }

    fn lock(&self) -> MutexGuard<'_, NavState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    /// Splash timer elapsed or the app reported ready.
    pub fn splash_finished(&self) {
        let mut nav = self.lock();
        if nav.screen == Screen::Splash {
            nav.screen = Screen::Home;
            log::debug!("Navigation: splash -> home");
        }
    }

    /// Move Home → Secondary with a fresh result channel.
    pub fn open(
        &self,
        target: Target,
        outbound: Payload,
    ) -> CapdeckResult<(ChannelToken, oneshot::Receiver<ChannelOutcome>)> {
        let mut nav = self.lock();
        match nav.screen {
            Screen::Splash => Err(CapdeckError::NotReady),
            Screen::Secondary(active) => {
                log::warn!("Rejected secondary screen for {}: {} still open", target, active);
                Err(CapdeckError::NavigationBusy)
            }
            Screen::Home => {
                let (token, rx) = nav.channels.open(target, outbound)?;
                nav.screen = Screen::Secondary(token);
                log::debug!("Navigation: home -> secondary({})", token);
                Ok((token, rx))
            }
        }
    }

    pub fn resolve(&self, token: ChannelToken, inbound: Payload) -> CapdeckResult<()> {
        let mut nav = self.lock();
        nav.channels.resolve(token, inbound)?;
        Self::return_home(&mut nav, token);
        Ok(())
    }

    pub fn cancel(&self, token: ChannelToken) -> CapdeckResult<()> {
        let mut nav = self.lock();
        nav.channels.cancel(token)?;
        Self::return_home(&mut nav, token);
        Ok(())
    }

    /// Apply what the secondary screen reported.
    pub fn settle(&self, token: ChannelToken, result: ScreenResult) -> CapdeckResult<()> {
        match result {
            ScreenResult::Returned(inbound) => self.resolve(token, inbound),
            ScreenResult::Cancelled => self.cancel(token),
        }
    }

    /// Back navigation from the secondary screen cancels its channel.
    pub fn back(&self) -> Option<ChannelToken> {
        let token = match self.screen() {
            Screen::Secondary(token) => token,
            _ => return None,
        };
        match self.cancel(token) {
            Ok(()) => Some(token),
            Err(e) => {
                log::warn!("Back navigation could not cancel {}: {}", token, e);
                None
            }
        }
    }

    pub fn peek(&self, token: ChannelToken) -> Option<ChannelState> {
        self.lock().channels.peek(token)
    }

    /// Inbound payload of a resolved channel that has not been consumed yet.
    pub fn inbound(&self, token: ChannelToken) -> Option<Payload> {
        self.lock()
            .channels
            .get(token)
            .and_then(|c| c.inbound.clone())
    }

    /// Discard a settled channel, returning its outcome.
    pub fn consume(&self, token: ChannelToken) -> Option<ChannelOutcome> {
        self.lock().channels.consume(token)
    }

    fn return_home(nav: &mut NavState, token: ChannelToken) {
        if nav.screen == Screen::Secondary(token) {
            nav.screen = Screen::Home;
            log::debug!("Navigation: secondary({}) -> home", token);
        }
    }
}

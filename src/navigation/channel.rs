use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::catalog::{Payload, Target};
use crate::error::{CapdeckError, CapdeckResult};

/// Correlation token binding a result request to its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelToken(Uuid);

impl ChannelToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ChannelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Open,
    Resolved,
    Cancelled,
}

/// Terminal outcome delivered to whoever opened the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Resolved(Payload),
    Cancelled,
}

#[derive(Debug)]
pub struct ResultChannel {
    pub token: ChannelToken,
    pub target: Target,
    pub outbound: Payload,
    pub state: ChannelState,
    /// Present only once `state` is `Resolved`.
    pub inbound: Option<Payload>,
    pub opened_at: DateTime<Utc>,
    notify: Option<oneshot::Sender<ChannelOutcome>>,
}

impl ResultChannel {
    fn outcome(&self) -> Option<ChannelOutcome> {
        match self.state {
            ChannelState::Open => None,
            ChannelState::Resolved => Some(ChannelOutcome::Resolved(
                self.inbound.clone().unwrap_or_default(),
            )),
            ChannelState::Cancelled => Some(ChannelOutcome::Cancelled),
        }
    }

    /// Apply the one allowed terminal transition and wake the waiter.
    fn settle(&mut self, state: ChannelState, inbound: Option<Payload>) -> CapdeckResult<()> {
        if self.state != ChannelState::Open {
            return Err(CapdeckError::AlreadyResolved(self.token));
        }
        self.state = state;
        self.inbound = inbound;
        if let (Some(tx), Some(outcome)) = (self.notify.take(), self.outcome()) {
            // The opener may have given up waiting; the state is still recorded.
            let _ = tx.send(outcome);
        }
        Ok(())
    }
}

/// Registry of result channels, at most one of them open.
#[derive(Debug, Default)]
pub struct ResultChannels {
    channels: HashMap<ChannelToken, ResultChannel>,
}

impl ResultChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel carrying `outbound` to `target`.
    ///
    /// The receiver fires exactly once, when the channel leaves `Open`.
    pub fn open(
        &mut self,
        target: Target,
        outbound: Payload,
    ) -> CapdeckResult<(ChannelToken, oneshot::Receiver<ChannelOutcome>)> {
        if self.active().is_some() {
            return Err(CapdeckError::NavigationBusy);
        }

        let (tx, rx) = oneshot::channel();
        let token = ChannelToken::generate();
        self.channels.insert(
            token,
            ResultChannel {
                token,
                target,
                outbound,
                state: ChannelState::Open,
                inbound: None,
                opened_at: Utc::now(),
                notify: Some(tx),
            },
        );
        Ok((token, rx))
    }

    pub fn resolve(&mut self, token: ChannelToken, inbound: Payload) -> CapdeckResult<()> {
        self.get_mut(token)?
            .settle(ChannelState::Resolved, Some(inbound))
    }

    pub fn cancel(&mut self, token: ChannelToken) -> CapdeckResult<()> {
        self.get_mut(token)?.settle(ChannelState::Cancelled, None)
    }

    pub fn peek(&self, token: ChannelToken) -> Option<ChannelState> {
        self.channels.get(&token).map(|c| c.state)
    }

    pub fn get(&self, token: ChannelToken) -> Option<&ResultChannel> {
        self.channels.get(&token)
    }

    /// Token of the channel currently open, if any.
    pub fn active(&self) -> Option<ChannelToken> {
        self.channels
            .values()
            .find(|c| c.state == ChannelState::Open)
            .map(|c| c.token)
    }

    /// Remove a settled channel and hand back its outcome. Open channels stay.
    pub fn consume(&mut self, token: ChannelToken) -> Option<ChannelOutcome> {
        let outcome = self.channels.get(&token)?.outcome()?;
        self.channels.remove(&token);
        Some(outcome)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn get_mut(&mut self, token: ChannelToken) -> CapdeckResult<&mut ResultChannel> {
        self.channels
            .get_mut(&token)
            .ok_or(CapdeckError::UnknownChannel(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(key: &str, value: &str) -> Payload {
        Payload::from([(key.to_string(), value.to_string())])
    }

    fn secondary() -> Target {
        Target::new("capdeck.SECONDARY")
    }

    #[test]
    fn open_then_resolve_delivers_inbound() {
        let mut channels = ResultChannels::new();
        let (token, mut rx) = channels.open(secondary(), payload("data", "X")).unwrap();
        assert_eq!(channels.peek(token), Some(ChannelState::Open));

        channels.resolve(token, payload("result", "Y")).unwrap();
        assert_eq!(channels.peek(token), Some(ChannelState::Resolved));
        assert_eq!(
            rx.try_recv().unwrap(),
            ChannelOutcome::Resolved(payload("result", "Y"))
        );
    }

    #[test]
    fn second_open_is_busy_and_first_untouched() {
        let mut channels = ResultChannels::new();
        let (first, _rx) = channels.open(secondary(), Payload::new()).unwrap();

        let err = channels.open(secondary(), Payload::new()).unwrap_err();
        assert!(matches!(err, CapdeckError::NavigationBusy));
        assert_eq!(channels.peek(first), Some(ChannelState::Open));
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn cancel_after_resolve_reports_already_resolved() {
        let mut channels = ResultChannels::new();
        let (token, _rx) = channels.open(secondary(), Payload::new()).unwrap();
        channels.resolve(token, payload("result", "Y")).unwrap();

        let err = channels.cancel(token).unwrap_err();
        assert!(matches!(err, CapdeckError::AlreadyResolved(t) if t == token));
        assert_eq!(channels.peek(token), Some(ChannelState::Resolved));
        assert_eq!(
            channels.get(token).unwrap().inbound,
            Some(payload("result", "Y"))
        );
    }

    #[test]
    fn resolve_after_cancel_reports_already_resolved() {
        let mut channels = ResultChannels::new();
        let (token, mut rx) = channels.open(secondary(), Payload::new()).unwrap();
        channels.cancel(token).unwrap();

        assert!(matches!(
            channels.resolve(token, payload("result", "late")),
            Err(CapdeckError::AlreadyResolved(_))
        ));
        assert_eq!(channels.get(token).unwrap().inbound, None);
        assert_eq!(rx.try_recv().unwrap(), ChannelOutcome::Cancelled);
    }

    #[test]
    fn consume_removes_only_settled_channels() {
        let mut channels = ResultChannels::new();
        let (token, _rx) = channels.open(secondary(), Payload::new()).unwrap();
        assert_eq!(channels.consume(token), None);
        assert_eq!(channels.len(), 1);

        channels.cancel(token).unwrap();
        assert_eq!(channels.consume(token), Some(ChannelOutcome::Cancelled));
        assert!(channels.is_empty());
        assert_eq!(channels.peek(token), None);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let mut channels = ResultChannels::new();
        let (token, _rx) = channels.open(secondary(), Payload::new()).unwrap();
        channels.cancel(token).unwrap();
        channels.consume(token);

        assert!(matches!(
            channels.cancel(token),
            Err(CapdeckError::UnknownChannel(_))
        ));
    }

    #[test]
    fn settled_channel_frees_the_slot() {
        let mut channels = ResultChannels::new();
        let (first, _rx) = channels.open(secondary(), Payload::new()).unwrap();
        channels.resolve(first, Payload::new()).unwrap();

        let (second, _rx2) = channels.open(secondary(), Payload::new()).unwrap();
        assert_ne!(first, second);
        assert_eq!(channels.active(), Some(second));
    }
}

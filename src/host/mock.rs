use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::{ScreenHost, ScreenResult};
use crate::catalog::{Payload, Target};
use crate::navigation::{ChannelToken, NavigationController, Screen};

/// One secondary-screen visit seen by `MockScreenHost`.
#[derive(Debug, Clone, PartialEq)]
pub struct Presented {
    pub token: ChannelToken,
    pub target: Target,
    pub outbound: Payload,
    /// What the navigation controller showed while the screen was up.
    pub screen: Option<Screen>,
}

/// Screen host answering every visit with a scripted result.
///
/// With `held()`, each visit parks until `release()` is called.
pub struct MockScreenHost {
    reply: Mutex<ScreenResult>,
    hold: Option<Semaphore>,
    navigation: Option<Arc<NavigationController>>,
    presented: Mutex<Vec<Presented>>,
}

impl MockScreenHost {
    pub fn new(reply: ScreenResult) -> Self {
        Self {
            reply: Mutex::new(reply),
            hold: None,
            navigation: None,
            presented: Mutex::new(Vec::new()),
        }
    }

    pub fn held(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    /// Record the controller's screen at presentation time.
    pub fn observing(mut self, navigation: Arc<NavigationController>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1);
        }
    }

    pub fn presented(&self) -> Vec<Presented> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScreenHost for MockScreenHost {
    async fn present(
        &self,
        token: ChannelToken,
        target: &Target,
        outbound: &Payload,
    ) -> ScreenResult {
        self.presented.lock().unwrap().push(Presented {
            token,
            target: target.clone(),
            outbound: outbound.clone(),
            screen: self.navigation.as_ref().map(|n| n.screen()),
        });
        if let Some(hold) = &self.hold {
            if let Ok(permit) = hold.acquire().await {
                permit.forget();
            }
        }
        self.reply.lock().unwrap().clone()
    }
}

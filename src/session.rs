use std::sync::{Arc, Mutex};

use crate::catalog::{TrainingData, TrainingItem};

/// Observable state of a presentation session. Handed out as snapshots;
/// only [`SessionController`] changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub is_active: bool,
    pub current_item_index: usize,
    pub is_image_visible: bool,
    pub is_text_visible: bool,
    pub is_transitioning: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_active: false,
            current_item_index: 0,
            is_image_visible: true,
            is_text_visible: false,
            is_transitioning: false,
        }
    }
}

impl SessionState {
    fn image_only(index: usize) -> Self {
        Self {
            is_active: true,
            current_item_index: index,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.is_active {
            Phase::Idle
        } else if self.is_transitioning {
            Phase::Transitioning
        } else if self.is_text_visible {
            Phase::ImageAndText
        } else {
            Phase::ImageOnly
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    #[strum(to_string = "Image")]
    ImageOnly,
    #[strum(to_string = "Image + text")]
    ImageAndText,
    Transitioning,
}

/// Result of asking the controller to move. `Ignored` covers late or
/// duplicate triggers that do not apply to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Transition::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&SessionState) + Send>;

/// Controller shared between threads; every operation goes through the lock.
pub type SharedSession = Arc<Mutex<SessionController>>;

/// Owns the session state and the training data being presented.
///
/// The controller owns no clock. Callers time the phases with durations
/// from [`crate::timing`] and call [`reveal_text`](Self::reveal_text) and
/// [`advance`](Self::advance) when they elapse.
pub struct SessionController {
    data: Option<TrainingData>,
    state: SessionState,
    epoch: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("items", &self.item_count())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            data: None,
            state: SessionState::default(),
            epoch: 0,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Bumped by every `start` and `reset`; lets callers drop timers armed
    /// for an earlier session.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn training_data(&self) -> Option<&TrainingData> {
        self.data.as_ref()
    }

    pub fn item_count(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.items.len())
    }

    /// The item on screen, if any.
    pub fn current_item(&self) -> Option<&TrainingItem> {
        if !self.state.is_active {
            return None;
        }
        self.data
            .as_ref()
            .and_then(|d| d.items.get(self.state.current_item_index))
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&SessionState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    /// Begin presenting `data` from its first item, replacing any running
    /// session. Missing data or an empty item list leaves the session idle.
    pub fn start(&mut self, data: Option<TrainingData>) -> Transition {
        let count = data.as_ref().map_or(0, |d| d.items.len());
        log::info!("starting training session with {count} items");

        self.epoch += 1;
        self.data = data;

        if count == 0 {
            log::warn!("no training items to show, session stays idle");
            self.publish(SessionState::default());
        } else {
            self.publish(SessionState::image_only(0));
        }
        Transition::Applied
    }

    /// Show the text of the current item next to its image.
    pub fn reveal_text(&mut self) -> Transition {
        if self.phase() != Phase::ImageOnly {
            log::debug!("reveal_text ignored in phase {}", self.phase());
            return Transition::Ignored;
        }

        log::debug!("revealing text for item {}", self.state.current_item_index);
        self.publish(SessionState {
            is_text_visible: true,
            ..self.state
        });
        Transition::Applied
    }

    /// Leave the current item. Observers see one transitioning snapshot
    /// that still carries the old index, then the next item (or idle).
    pub fn advance(&mut self) -> Transition {
        if self.phase() != Phase::ImageAndText {
            log::debug!("advance ignored in phase {}", self.phase());
            return Transition::Ignored;
        }

        let current = self.state.current_item_index;
        self.publish(SessionState {
            is_transitioning: true,
            ..self.state
        });

        let next = current + 1;
        if next >= self.item_count() {
            log::info!("training session complete after {} items", self.item_count());
            self.publish(SessionState::default());
        } else {
            log::debug!("advancing from item {current} to {next}");
            self.publish(SessionState::image_only(next));
        }
        Transition::Applied
    }

    /// Stop any session and drop the loaded training data.
    pub fn reset(&mut self) -> Transition {
        log::info!(
            "resetting training session (had {} items, phase {})",
            self.item_count(),
            self.phase()
        );
        self.epoch += 1;
        self.data = None;
        self.publish(SessionState::default());
        Transition::Applied
    }

    fn publish(&mut self, state: SessionState) {
        self.state = state;
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.state);
        }
    }
}

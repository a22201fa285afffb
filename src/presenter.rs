//! Caller-side phase timers.
//!
//! [`SessionController`] never looks at a clock. `PhaseClock` is the piece
//! that does: it is fed elapsed time (from tick events, or directly in
//! tests), works out how long the current phase should last and fires the
//! matching controller operation when that time is up.

use std::time::Duration;

use crate::config::Settings;
use crate::session::{Phase, SessionController, Transition};
use crate::timing::{display_duration, TextTiming};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedPhase {
    epoch: u64,
    index: usize,
    phase: Phase,
}

#[derive(Debug, Default)]
pub struct PhaseClock {
    armed: Option<ArmedPhase>,
    phase_elapsed: Duration,
}

impl PhaseClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time spent in the current phase.
    pub fn phase_elapsed(&self) -> Duration {
        self.phase_elapsed
    }

    /// Feed `elapsed` wall time into the clock. Returns how many transitions
    /// were applied. Time left over after a transition counts towards the
    /// next phase, so one long step can walk several phases in order.
    pub fn on_elapsed(
        &mut self,
        controller: &mut SessionController,
        settings: &Settings,
        mut elapsed: Duration,
    ) -> usize {
        let mut fired = 0;

        loop {
            self.sync(controller);
            let Some(deadline) = Self::deadline(controller, settings) else {
                return fired;
            };

            let remaining = deadline.saturating_sub(self.phase_elapsed);
            if elapsed < remaining {
                self.phase_elapsed += elapsed;
                return fired;
            }

            elapsed -= remaining;
            self.phase_elapsed = deadline;
            if self.fire(controller).is_applied() {
                fired += 1;
            } else {
                return fired;
            }
        }
    }

    /// End the current phase now.
    pub fn skip(&mut self, controller: &mut SessionController) -> Transition {
        self.sync(controller);
        let transition = self.fire(controller);
        self.sync(controller);
        transition
    }

    /// How long the current phase lasts in total, if it is timed.
    pub fn phase_duration(
        &self,
        controller: &SessionController,
        settings: &Settings,
    ) -> Option<Duration> {
        Self::deadline(controller, settings)
    }

    pub fn time_remaining(
        &self,
        controller: &SessionController,
        settings: &Settings,
    ) -> Option<Duration> {
        if !self.is_synced(controller) {
            return Self::deadline(controller, settings);
        }
        Self::deadline(controller, settings).map(|d| d.saturating_sub(self.phase_elapsed))
    }

    /// Index of the word to highlight while the text is showing.
    pub fn highlighted_word(
        &self,
        controller: &SessionController,
        settings: &Settings,
    ) -> Option<usize> {
        if !settings.highlight_words() || controller.phase() != Phase::ImageAndText {
            return None;
        }
        let item = controller.current_item()?;
        let timing = TextTiming::compute(item.text(), settings.seconds_per_word(), settings.bounds());
        let elapsed = if self.is_synced(controller) {
            self.phase_elapsed
        } else {
            Duration::ZERO
        };
        timing.highlighted_word(elapsed)
    }

    fn key(controller: &SessionController) -> ArmedPhase {
        let state = controller.state();
        ArmedPhase {
            epoch: controller.epoch(),
            index: state.current_item_index,
            phase: state.phase(),
        }
    }

    fn is_synced(&self, controller: &SessionController) -> bool {
        self.armed == Some(Self::key(controller))
    }

    /// Re-arm when the controller moved on without us (new phase, new item,
    /// restart or reset).
    fn sync(&mut self, controller: &SessionController) {
        let key = Self::key(controller);
        if self.armed != Some(key) {
            self.armed = Some(key);
            self.phase_elapsed = Duration::ZERO;
        }
    }

    fn deadline(controller: &SessionController, settings: &Settings) -> Option<Duration> {
        match controller.phase() {
            Phase::ImageOnly => Some(settings.image_dwell()),
            Phase::ImageAndText => {
                let text = controller.current_item().map_or("", |i| i.text());
                Some(display_duration(
                    text,
                    settings.seconds_per_word(),
                    settings.bounds(),
                ))
            }
            Phase::Idle | Phase::Transitioning => None,
        }
    }

    fn fire(&self, controller: &mut SessionController) -> Transition {
        match controller.phase() {
            Phase::ImageOnly => controller.reveal_text(),
            Phase::ImageAndText => controller.advance(),
            Phase::Idle | Phase::Transitioning => Transition::Ignored,
        }
    }
}

//! WatchScheduler - standing requests for elements that match a selector
//!
//! Each entry moves `Pending -> dispatched -> Pending | Retired`. A tick
//! re-queries every pending entry and hands each fresh element to the
//! entry's callback exactly once. Nothing matching is never an error; the
//! entry simply waits for the next tick.
//!
//! The scheduler does not own a clock or a timer. Whatever drives the host
//! (an interval, a mutation observer, a test loop) calls [`WatchScheduler::tick`].

use std::collections::HashSet;
use std::time::Duration;

use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::dom::Page;

// ==================== TYPE DEFINITIONS ====================

/// Whether an entry keeps watching after its first dispatching tick
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Repeat {
    /// Retire after the first tick that dispatches at least one element
    Once,
    #[default]
    Continuous,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WatchState {
    Pending,
    Retired,
}

/// Handle returned by [`WatchScheduler::register`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(usize);

impl WatchId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Element identities already handed to one entry's callback
pub type ProcessedSet = HashSet<u64>;

/// Invoked once per freshly matched element. `C` is shared context the
/// owner passes to every tick.
pub type WatchCallback<P, C> = Box<dyn FnMut(&C, &mut P, &<P as Page>::Node)>;

/// Optional knobs for [`WatchScheduler::register_with`]
#[derive(Clone, Debug)]
pub struct WatchOptions<N> {
    pub repeat: Repeat,
    /// Only match descendants of this element
    pub scope: Option<N>,
    /// Stay dormant until this long after registration
    pub delay: Option<Duration>,
}

impl<N> Default for WatchOptions<N> {
    fn default() -> Self {
        Self {
            repeat: Repeat::Continuous,
            scope: None,
            delay: None,
        }
    }
}

impl<N> WatchOptions<N> {
    pub fn repeat(repeat: Repeat) -> Self {
        Self {
            repeat,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_scope(mut self, scope: N) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// One standing request
pub struct WatchEntry<P: Page, C> {
    selector: String,
    scope: Option<P::Node>,
    repeat: Repeat,
    delay: Option<Duration>,
    registered_at: Instant,
    processed: ProcessedSet,
    state: WatchState,
    selector_error_logged: bool,
    callback: WatchCallback<P, C>,
}

impl<P: Page, C> WatchEntry<P, C> {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.delay {
            Some(delay) => now >= self.registered_at + delay,
            None => true,
        }
    }
}

impl<P: Page, C> std::fmt::Debug for WatchEntry<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEntry")
            .field("selector", &self.selector)
            .field("scope", &self.scope)
            .field("repeat", &self.repeat)
            .field("delay", &self.delay)
            .field("processed", &self.processed.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Outcome of one tick
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Callback invocations across every entry
    pub dispatched: usize,
    /// Entries retired during this tick
    pub retired: usize,
}

// ==================== MAIN IMPLEMENTATION ====================

/// Registry of watch entries over a page of type `P`
pub struct WatchScheduler<P: Page, C> {
    entries: Vec<WatchEntry<P, C>>,
}

impl<P: Page, C> Default for WatchScheduler<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Page, C> WatchScheduler<P, C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Watch the whole page for `selector`
    pub fn register(
        &mut self,
        selector: &str,
        repeat: Repeat,
        callback: WatchCallback<P, C>,
    ) -> WatchId {
        self.register_with(selector, WatchOptions::repeat(repeat), callback)
    }

    pub fn register_with(
        &mut self,
        selector: &str,
        options: WatchOptions<P::Node>,
        callback: WatchCallback<P, C>,
    ) -> WatchId {
        let id = WatchId(self.entries.len());
        tracing::debug!(
            watch = id.0,
            selector,
            repeat = ?options.repeat,
            delay_ms = options.delay.map(|d| d.as_millis() as u64),
            "watch registered"
        );
        self.entries.push(WatchEntry {
            selector: selector.to_string(),
            scope: options.scope,
            repeat: options.repeat,
            delay: options.delay,
            registered_at: Instant::now(),
            processed: ProcessedSet::new(),
            state: WatchState::Pending,
            selector_error_logged: false,
            callback,
        });
        id
    }

    pub fn entry(&self, id: WatchId) -> Option<&WatchEntry<P, C>> {
        self.entries.get(id.0)
    }

    pub fn state(&self, id: WatchId) -> Option<WatchState> {
        self.entry(id).map(|e| e.state)
    }

    /// Stop an entry early. Returns false for unknown ids.
    pub fn cancel(&mut self, id: WatchId) -> bool {
        match self.entries.get_mut(id.0) {
            Some(entry) => {
                entry.state = WatchState::Retired;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still waiting for elements
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == WatchState::Pending)
            .count()
    }

    pub fn tick(&mut self, ctx: &C, page: &mut P) -> TickReport {
        self.tick_at(ctx, page, Instant::now())
    }

    /// Scan every pending entry as of `now`
    pub fn tick_at(&mut self, ctx: &C, page: &mut P, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.state == WatchState::Retired || !entry.is_due(now) {
                continue;
            }

            if let Some(scope) = &entry.scope {
                if !page.is_connected(scope) {
                    continue;
                }
            }

            let found = match page.query_all(entry.scope.as_ref(), &entry.selector) {
                Ok(found) => found,
                Err(e) => {
                    if !entry.selector_error_logged {
                        tracing::warn!(watch = index, selector = entry.selector.as_str(), error = %e, "watch selector matches nothing");
                        entry.selector_error_logged = true;
                    }
                    continue;
                }
            };

            let mut dispatched = 0;
            for node in found {
                if !page.is_connected(&node) {
                    continue;
                }
                let key = match page.node_key(&node) {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::trace!(watch = index, error = %e, "skipping element without identity");
                        continue;
                    }
                };
                if !entry.processed.insert(key) {
                    continue;
                }
                (entry.callback)(ctx, page, &node);
                dispatched += 1;
            }

            report.dispatched += dispatched;
            if dispatched > 0 && entry.repeat == Repeat::Once {
                entry.state = WatchState::Retired;
                report.retired += 1;
                tracing::debug!(watch = index, selector = entry.selector.as_str(), "watch retired");
            }
        }

        report
    }
}

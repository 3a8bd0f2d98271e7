use sf_api_types::Channel;
use std::cell::RefCell;
use std::collections::HashSet;

use crate::storefront::Session;

/// Requests a control can be waiting on. A marked action's control is
/// rendered disabled until the request settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    OptIn,
    RevokeConsent,
    DeleteData,
    TriggerAbandoned,
    SendMessage,
    ToggleChannel(Channel),
}

#[derive(Debug, Default, Clone)]
pub struct InFlight {
    active: HashSet<Action>,
}

impl InFlight {
    pub fn contains(&self, action: Action) -> bool {
        self.active.contains(&action)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    fn begin(&mut self, action: Action) {
        self.active.insert(action);
    }

    fn finish(&mut self, action: Action) {
        self.active.remove(&action);
    }
}

/// Clears its marker when dropped, whichever way the action ends.
pub(crate) struct Busy<'a> {
    state: &'a RefCell<Session>,
    action: Action,
}

impl<'a> Busy<'a> {
    pub(crate) fn begin(state: &'a RefCell<Session>, action: Action) -> Self {
        state.borrow_mut().in_flight.begin(action);
        Self { state, action }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.state.borrow_mut().in_flight.finish(self.action);
    }
}

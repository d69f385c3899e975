// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback storage and DOM listener ownership shared by the adapters.

use std::cell::RefCell;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget};

/// A replaceable callback that may be invoked while it replaces itself.
///
/// The callback is taken out of the slot for the duration of the call, so
/// the slot is never borrowed while user code runs. If the callback
/// registered a replacement during the call, the replacement wins.
pub(crate) struct CallbackSlot<T: ?Sized> {
    slot: RefCell<Option<Box<T>>>,
}

impl<T: ?Sized> CallbackSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }

    pub(crate) fn set(&self, callback: Box<T>) {
        *self.slot.borrow_mut() = Some(callback);
    }

    pub(crate) fn call_with(&self, f: impl FnOnce(&mut T)) {
        let Some(mut callback) = self.slot.borrow_mut().take() else {
            return;
        };
        f(&mut *callback);
        let mut slot = self.slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

type EventClosure = Closure<dyn FnMut(Event)>;

/// An `addEventListener` registration, removed on drop.
pub(crate) struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: EventClosure,
}

impl Listener {
    pub(crate) fn new(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, wasm_bindgen::JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn empty_slot_is_a_no_op() {
        let slot: CallbackSlot<dyn FnMut(f64)> = CallbackSlot::new();
        slot.call_with(|cb| cb(1.0));
    }

    #[test]
    fn callback_sees_its_argument_and_stays_registered() {
        let seen = Rc::new(Cell::new(0.0));
        let slot: CallbackSlot<dyn FnMut(f64)> = CallbackSlot::new();
        let sink = Rc::clone(&seen);
        slot.set(Box::new(move |t| sink.set(sink.get() + t)));
        slot.call_with(|cb| cb(1.5));
        slot.call_with(|cb| cb(2.0));
        assert_eq!(seen.get(), 3.5);
    }

    #[test]
    fn replacement_registered_during_the_call_wins() {
        let slot: Rc<CallbackSlot<dyn FnMut() -> u32>> = Rc::new(CallbackSlot::new());
        let inner = Rc::clone(&slot);
        slot.set(Box::new(move || {
            inner.set(Box::new(|| 2));
            1
        }));

        let mut got = 0;
        slot.call_with(|cb| got = cb());
        assert_eq!(got, 1);
        slot.call_with(|cb| got = cb());
        assert_eq!(got, 2);
    }
}

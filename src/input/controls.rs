//! Button consumer registry and fan-out.

use crate::config::MAX_BUTTON_HANDLERS;
use crate::error::{Error, RegistryKind};
use crate::input::{ButtonEvent, ButtonHandler};
use crate::registry::Registry;

pub struct Controls<'a> {
    handlers: Registry<&'a dyn ButtonHandler, MAX_BUTTON_HANDLERS>,
}

impl<'a> Controls<'a> {
    pub const fn new() -> Self {
        Self {
            handlers: Registry::new(RegistryKind::Button),
        }
    }

    /// Register a handler. Registering the same `ConsumerId` twice is a
    /// no-op, even once the registry is full.
    pub fn register(&mut self, handler: &'a dyn ButtonHandler) -> Result<(), Error> {
        let id = handler.consumer_id();
        if self.handlers.contains_by(|h| h.consumer_id() == id) {
            return Ok(());
        }
        self.handlers.register(handler)
    }

    /// Deliver `button` to every handler in registration order.
    pub fn dispatch(&self, button: ButtonEvent) {
        for handler in self.handlers.iter() {
            handler.on_button(button);
        }
    }
}

impl Default for Controls<'_> {
    fn default() -> Self {
        Self::new()
    }
}

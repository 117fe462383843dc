//! Controller: owns the point list and ties the registry to the dispatcher.
//!
//! Bindings are never patched individually: `rebind` tears everything down
//! and reconstructs the batch from the current list, which avoids
//! partial-state bugs from incremental edits. Fired tags arrive over an
//! mpsc channel filled by the registry's callback; `run` drains it on the
//! calling thread, so every `execute` happens off the hook thread and all
//! executions are serialized through this single consumer.

use std::sync::mpsc;

use crate::dispatch::ActionDispatcher;
use crate::hotkey::{describe_hotkey, HandlerTag, HotkeyBackend, RegistryError};
use crate::point::ActionPoint;

pub struct Controller {
    points: Vec<ActionPoint>,
    backend: Box<dyn HotkeyBackend>,
    dispatcher: ActionDispatcher,
    fired_rx: mpsc::Receiver<HandlerTag>,
}

impl Controller {
    pub fn new(
        points: Vec<ActionPoint>,
        backend: Box<dyn HotkeyBackend>,
        dispatcher: ActionDispatcher,
        fired_rx: mpsc::Receiver<HandlerTag>,
    ) -> Self {
        Self {
            points,
            backend,
            dispatcher,
            fired_rx,
        }
    }

    pub fn points(&self) -> &[ActionPoint] {
        &self.points
    }

    /// Replaces the point list and rebuilds all bindings.
    pub fn set_points(&mut self, points: Vec<ActionPoint>) -> Result<usize, RegistryError> {
        self.points = points;
        self.rebind()
    }

    /// Clears every binding and re-registers each enabled point that
    /// carries a key. Returns the number of keys actually bound.
    ///
    /// A refused registration (combination owned by another process) is
    /// logged and the point's hotkey left unbound; no retry, that is not
    /// recoverable without user intervention.
    pub fn rebind(&mut self) -> Result<usize, RegistryError> {
        self.backend.unregister_all()?;

        let mut bound = 0;
        for (tag, point) in self.points.iter().enumerate() {
            if !point.is_enabled || !point.has_hotkey() {
                continue;
            }
            let label = describe_hotkey(point.modifiers, point.key);
            if self.backend.register(
                point.modifiers,
                point.key,
                &point.target_application_name,
                tag,
            )? {
                log::debug!("controller: bound {} to '{}'", label, point.name);
                bound += 1;
            } else {
                log::warn!(
                    "controller: {} for '{}' was refused, likely owned by another process; \
                     leaving it unbound",
                    label,
                    point.name
                );
            }
        }
        Ok(bound)
    }

    /// Consumes fired events until the registry side hangs up.
    ///
    /// Runs on the calling thread; each tag is resolved against the current
    /// point list and executed to completion before the next is taken.
    pub fn run(&self) {
        while let Ok(tag) = self.fired_rx.recv() {
            match self.points.get(tag) {
                Some(point) => self.dispatcher.execute(point),
                // A tag can outlive its point only if a rebind raced the
                // event delivery; drop it.
                None => log::warn!("controller: fired tag {tag} has no point, dropping"),
            }
        }
        log::info!("controller: hotkey event channel closed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::hotkey::Modifiers;
    use crate::platform::mock::{FixedScreens, ForegroundStub, RecordingInjector};
    use crate::point::{ActionPoint, MouseAction};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct RegisteredKey {
        modifiers: Modifiers,
        key: u32,
        target_app: String,
        tag: HandlerTag,
    }

    /// Records registrations; refuses keys listed in `refuse`.
    #[derive(Clone)]
    struct MockBackend {
        registered: Arc<Mutex<Vec<RegisteredKey>>>,
        unregister_calls: Arc<Mutex<usize>>,
        refuse: Vec<u32>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                registered: Arc::new(Mutex::new(Vec::new())),
                unregister_calls: Arc::new(Mutex::new(0)),
                refuse: Vec::new(),
            }
        }

        fn refusing(mut self, key: u32) -> Self {
            self.refuse.push(key);
            self
        }
    }

    impl HotkeyBackend for MockBackend {
        fn register(
            &mut self,
            modifiers: Modifiers,
            key: u32,
            target_app: &str,
            tag: HandlerTag,
        ) -> Result<bool, RegistryError> {
            if self.refuse.contains(&key) {
                return Ok(false);
            }
            self.registered.lock().unwrap().push(RegisteredKey {
                modifiers,
                key,
                target_app: target_app.to_string(),
                tag,
            });
            Ok(true)
        }

        fn unregister_all(&mut self) -> Result<(), RegistryError> {
            *self.unregister_calls.lock().unwrap() += 1;
            self.registered.lock().unwrap().clear();
            Ok(())
        }
    }

    fn test_dispatcher(injector: RecordingInjector) -> ActionDispatcher {
        ActionDispatcher::new(
            Box::new(injector),
            Box::new(FixedScreens(vec![])),
            Box::new(ForegroundStub::new("")),
        )
    }

    fn bound_point(key: u32, name: &str) -> ActionPoint {
        let mut point = ActionPoint::new(10, 20, name);
        point.key = key;
        point.modifiers = Modifiers::CONTROL;
        point.action = MouseAction::MouseDown;
        point
    }

    #[test]
    fn rebind_registers_only_enabled_points_with_keys() {
        let backend = MockBackend::new();
        let registered = backend.registered.clone();

        let mut disabled = bound_point(0x71, "disabled");
        disabled.is_enabled = false;
        let unbound = ActionPoint::new(1, 1, "no hotkey");
        let live = bound_point(0x72, "live");

        let (_tx, rx) = mpsc::channel();
        let mut controller = Controller::new(
            vec![disabled, unbound, live],
            Box::new(backend),
            test_dispatcher(RecordingInjector::new()),
            rx,
        );

        assert_eq!(controller.rebind().unwrap(), 1);
        let regs = registered.lock().unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].key, 0x72);
        assert_eq!(regs[0].tag, 2);
    }

    /// Rebinding always clears first, so stale bindings never survive.
    #[test]
    fn rebind_clears_before_registering() {
        let backend = MockBackend::new();
        let unregister_calls = backend.unregister_calls.clone();
        let registered = backend.registered.clone();

        let (_tx, rx) = mpsc::channel();
        let mut controller = Controller::new(
            vec![bound_point(0x70, "a")],
            Box::new(backend),
            test_dispatcher(RecordingInjector::new()),
            rx,
        );
        controller.rebind().unwrap();
        controller.rebind().unwrap();

        assert_eq!(*unregister_calls.lock().unwrap(), 2);
        assert_eq!(registered.lock().unwrap().len(), 1);
    }

    /// A refused combination is skipped, the rest still bind.
    #[test]
    fn refused_registration_leaves_point_unbound() {
        let backend = MockBackend::new().refusing(0x70);
        let registered = backend.registered.clone();

        let (_tx, rx) = mpsc::channel();
        let mut controller = Controller::new(
            vec![bound_point(0x70, "conflicted"), bound_point(0x71, "fine")],
            Box::new(backend),
            test_dispatcher(RecordingInjector::new()),
            rx,
        );

        assert_eq!(controller.rebind().unwrap(), 1);
        let regs = registered.lock().unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].key, 0x71);
    }

    #[test]
    fn fired_tags_execute_the_matching_point() {
        let injector = RecordingInjector::new();
        let recorder = injector.clone();

        let (tx, rx) = mpsc::channel();
        let controller = Controller::new(
            vec![bound_point(0x70, "a"), bound_point(0x71, "b")],
            Box::new(MockBackend::new()),
            test_dispatcher(injector),
            rx,
        );

        tx.send(1).unwrap();
        tx.send(0).unwrap();
        tx.send(99).unwrap(); // stale tag, dropped
        drop(tx);
        controller.run();

        assert_eq!(recorder.events().len(), 2);
    }
}

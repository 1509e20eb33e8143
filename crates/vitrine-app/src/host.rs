// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host glue — turns Dioxus DOM events into bridge `InputEvent`s, runs them
// through the listeners the input guard installed, and mirrors the verdict
// back onto the DOM event.

use dioxus::prelude::*;
use vitrine_bridge::headless::HeadlessBridge;
use vitrine_bridge::traits::{self, InputEvent, SurfaceTarget};

/// Guard verdict for one DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub prevented: bool,
    pub stopped: bool,
}

impl Verdict {
    fn of(event: &InputEvent) -> Self {
        Self {
            prevented: event.is_default_prevented(),
            stopped: event.is_propagation_stopped(),
        }
    }

    fn apply<T: ?Sized>(self, evt: &Event<T>) {
        if self.prevented {
            evt.prevent_default();
        }
        if self.stopped {
            evt.stop_propagation();
        }
    }
}

/// Run `input` through the listeners on `target` and apply the verdict.
pub fn forward<T: ?Sized>(
    bridge: &HeadlessBridge,
    target: SurfaceTarget,
    mut input: InputEvent,
    evt: &Event<T>,
) -> Verdict {
    bridge.dispatch(target, &mut input);
    let verdict = Verdict::of(&input);
    verdict.apply(evt);
    verdict
}

pub fn key_input(evt: &KeyboardEvent) -> InputEvent {
    let held = evt.modifiers();
    InputEvent::key_down(
        evt.key().to_string(),
        traits::Modifiers {
            ctrl: held.ctrl(),
            meta: held.meta(),
            shift: held.shift(),
            alt: held.alt(),
        },
    )
}

pub fn pointer_input(evt: &MouseEvent) -> InputEvent {
    InputEvent::pointer_down(evt.trigger_button().map_or(0, button_code))
}

pub fn touch_input(evt: &TouchEvent) -> InputEvent {
    InputEvent::touch_start(u32::try_from(evt.touches().len()).unwrap_or(u32::MAX))
}

/// DOM `MouseEvent.button` numbering.
pub fn button_code(button: dioxus::html::input_data::MouseButton) -> u16 {
    use dioxus::html::input_data::MouseButton;
    match button {
        MouseButton::Primary => 0,
        MouseButton::Auxiliary => 1,
        MouseButton::Secondary => 2,
        MouseButton::Fourth => 3,
        MouseButton::Fifth => 4,
        MouseButton::Unknown => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioxus::html::input_data::MouseButton;

    #[test]
    fn button_numbering_matches_dom() {
        assert_eq!(button_code(MouseButton::Primary), 0);
        assert_eq!(button_code(MouseButton::Auxiliary), 1);
        assert_eq!(button_code(MouseButton::Secondary), 2);
    }

    #[test]
    fn verdict_reads_event_flags() {
        let mut event = InputEvent::context_menu();
        assert_eq!(
            Verdict::of(&event),
            Verdict {
                prevented: false,
                stopped: false
            }
        );
        event.prevent_default();
        event.stop_propagation();
        assert_eq!(
            Verdict::of(&event),
            Verdict {
                prevented: true,
                stopped: true
            }
        );
    }
}

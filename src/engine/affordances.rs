//! Navigation and item affordances
//!
//! The engine tells the presentation layer which actions currently make
//! sense through [`Affordances`]. Every method has a no-op default so a
//! headless host only overrides what it shows.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::layers::{ItemId, LayerStack};

/// Which layer moves are possible right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationBounds {
    pub can_move_inward: bool,
    pub can_move_outward: bool,
}

impl NavigationBounds {
    pub fn of(stack: &LayerStack) -> Self {
        Self {
            can_move_inward: !stack.at_innermost(),
            can_move_outward: !stack.at_outermost(),
        }
    }
}

/// What the affordances need to know about an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCue {
    pub item: ItemId,
    pub selected: bool,
    /// Some item (possibly this one) holds the grab focus
    pub focus_held: bool,
}

/// Presentation hooks driven by the engine
pub trait Affordances {
    /// The engine was built; publishes the initial navigation state
    fn on_ready(&mut self, _bounds: NavigationBounds) {}

    /// A layer transition is about to animate
    fn on_transition_start(&mut self) {}

    /// A navigation attempt finished, whether it animated or not
    fn on_transition_end(&mut self, _bounds: NavigationBounds) {}

    /// The pointer entered an item
    fn on_item_detected(&mut self, _cue: ItemCue) {}

    /// The pointer left an item
    fn on_item_undetected(&mut self, _cue: ItemCue) {}

    /// The pointer hit nothing while nothing was detected
    fn on_pointer_idle(&mut self) {}

    /// An item left its slot under a grab
    fn on_pull_out(&mut self, _cue: ItemCue) {}

    /// The focused item went back to its slot
    fn on_returned(&mut self, _bounds: NavigationBounds) {}

    /// The selection flag of an item changed
    fn on_selection_changed(&mut self, _cue: ItemCue) {}
}

impl<A: Affordances + ?Sized> Affordances for Rc<RefCell<A>> {
    fn on_ready(&mut self, bounds: NavigationBounds) {
        self.borrow_mut().on_ready(bounds);
    }

    fn on_transition_start(&mut self) {
        self.borrow_mut().on_transition_start();
    }

    fn on_transition_end(&mut self, bounds: NavigationBounds) {
        self.borrow_mut().on_transition_end(bounds);
    }

    fn on_item_detected(&mut self, cue: ItemCue) {
        self.borrow_mut().on_item_detected(cue);
    }

    fn on_item_undetected(&mut self, cue: ItemCue) {
        self.borrow_mut().on_item_undetected(cue);
    }

    fn on_pointer_idle(&mut self) {
        self.borrow_mut().on_pointer_idle();
    }

    fn on_pull_out(&mut self, cue: ItemCue) {
        self.borrow_mut().on_pull_out(cue);
    }

    fn on_returned(&mut self, bounds: NavigationBounds) {
        self.borrow_mut().on_returned(bounds);
    }

    fn on_selection_changed(&mut self, cue: ItemCue) {
        self.borrow_mut().on_selection_changed(cue);
    }
}

/// Affordances that ignore everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAffordances;

impl Affordances for NoAffordances {}

/// Label on the accept button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AcceptLabel {
    /// The item is not selected yet
    #[default]
    Mark,
    /// The item is selected
    Unmark,
}

impl AcceptLabel {
    pub fn for_selection(selected: bool) -> Self {
        if selected {
            AcceptLabel::Unmark
        } else {
            AcceptLabel::Mark
        }
    }
}

impl fmt::Display for AcceptLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptLabel::Mark => write!(f, "Mark"),
            AcceptLabel::Unmark => write!(f, "Unmark"),
        }
    }
}

/// Enabled state of the five panel buttons
///
/// In mouse mode the accept and zoom-out buttons are driven by the host, so
/// detection and pull-out leave them alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPanel {
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub accept: bool,
    pub move_inside: bool,
    pub move_outside: bool,
    pub accept_label: AcceptLabel,
    mouse_input: bool,
}

impl ButtonPanel {
    /// Panel with every button disabled until the engine reports ready
    pub fn new(mouse_input: bool) -> Self {
        Self {
            zoom_in: false,
            zoom_out: false,
            accept: false,
            move_inside: false,
            move_outside: false,
            accept_label: AcceptLabel::Mark,
            mouse_input,
        }
    }

    pub fn mouse_input(&self) -> bool {
        self.mouse_input
    }

    fn enable_navigation(&mut self, bounds: NavigationBounds) {
        self.move_inside = bounds.can_move_inward;
        self.move_outside = bounds.can_move_outward;
    }

    fn enable_accept(&mut self, selected: bool) {
        self.accept = true;
        self.accept_label = AcceptLabel::for_selection(selected);
    }
}

impl Affordances for ButtonPanel {
    fn on_ready(&mut self, bounds: NavigationBounds) {
        self.zoom_in = false;
        self.zoom_out = false;
        self.accept = false;
        self.enable_navigation(bounds);
    }

    fn on_transition_start(&mut self) {
        self.zoom_in = false;
        self.zoom_out = false;
        self.accept = false;
        self.move_inside = false;
        self.move_outside = false;
    }

    fn on_transition_end(&mut self, bounds: NavigationBounds) {
        self.enable_navigation(bounds);
    }

    fn on_item_detected(&mut self, cue: ItemCue) {
        if !self.mouse_input {
            self.enable_accept(cue.selected);
        }
        if !cue.focus_held {
            self.zoom_in = true;
        }
    }

    fn on_item_undetected(&mut self, cue: ItemCue) {
        if !cue.focus_held {
            self.accept = false;
        }
        self.zoom_in = false;
    }

    fn on_pointer_idle(&mut self) {
        self.zoom_in = false;
    }

    fn on_pull_out(&mut self, cue: ItemCue) {
        if !self.mouse_input {
            self.zoom_out = true;
            self.enable_accept(cue.selected);
        }
        self.move_inside = false;
        self.move_outside = false;
    }

    fn on_returned(&mut self, bounds: NavigationBounds) {
        self.zoom_out = false;
        self.accept = false;
        self.enable_navigation(bounds);
    }

    fn on_selection_changed(&mut self, cue: ItemCue) {
        self.accept_label = AcceptLabel::for_selection(cue.selected);
    }
}

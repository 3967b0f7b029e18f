use winit::event::TouchPhase;

/// Single-pointer protocol fed to the rotation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Down { x: f32 },
    Move { x: f32 },
    Up,
}

/// Folds the left mouse button and the first active touch into one pointer.
#[derive(Debug, Default, Clone)]
pub struct PointerTracker {
    cursor_x: Option<f32>,
    mouse_down: bool,
    touch_id: Option<u64>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, x: f32) -> Option<PointerAction> {
        self.cursor_x = Some(x);
        if self.touch_id.is_some() {
            return None;
        }
        Some(PointerAction::Move { x })
    }

    /// `over_ui`: the press landed on an egui panel.
    pub fn left_button(&mut self, pressed: bool, over_ui: bool) -> Option<PointerAction> {
        if pressed {
            if over_ui || self.touch_id.is_some() {
                return None;
            }
            let x = self.cursor_x?;
            self.mouse_down = true;
            return Some(PointerAction::Down { x });
        }
        self.mouse_down = false;
        Some(PointerAction::Up)
    }

    pub fn cursor_left(&mut self) -> Option<PointerAction> {
        self.cursor_x = None;
        if std::mem::take(&mut self.mouse_down) {
            Some(PointerAction::Up)
        } else {
            None
        }
    }

    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, over_ui: bool) -> Option<PointerAction> {
        match phase {
            TouchPhase::Started => {
                if self.touch_id.is_some() || self.mouse_down || over_ui {
                    return None;
                }
                self.touch_id = Some(id);
                Some(PointerAction::Down { x })
            }
            TouchPhase::Moved => (self.touch_id == Some(id)).then_some(PointerAction::Move { x }),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.touch_id == Some(id) {
                    self.touch_id = None;
                    Some(PointerAction::Up)
                } else {
                    None
                }
            }
        }
    }
}

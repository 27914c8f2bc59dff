pub mod controller;

pub use controller::{EditEffect, EditModeController, PointerEvent, PointerPhase};

/// How pointer events in the scene view are interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    View,
    Paint,
    Edit,
    Erase,
}

impl EditMode {
    pub const ALL: [EditMode; 4] = [EditMode::View, EditMode::Paint, EditMode::Edit, EditMode::Erase];

    pub fn label(self) -> &'static str {
        match self {
            EditMode::View => "View",
            EditMode::Paint => "Paint",
            EditMode::Edit => "Edit",
            EditMode::Erase => "Erase",
        }
    }
}

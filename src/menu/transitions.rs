//! The `(page, role) → action` transition table.
//!
//! A missing row means the press is ignored on that page.

use super::PageId;
use crate::drivers::button::ButtonRole;

/// Everything a button press can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Ignore,

    // -- Navigation (handled by the engine) --
    SelectPrevious,
    SelectNext,
    /// Run the action attached to the highlighted list item.
    ActivateItem,
    GoBack,
    Open(PageId),

    // -- Edits --
    /// Step the draft value down (`-1`) or up (`+1`).
    AdjustDraft(i8),
    AdjustManualDuration(i8),
    SaveDraft,

    // -- Side effects --
    StartManualWatering,
    ToggleAutoMode,
    ForceWatering,
    ResetSettings,
    ClearCalibration,
    CalibrationStepDown,
    CalibrationStepUp,
    CalibrationConfirm,
}

use ButtonRole::{Back, Confirm, Decrement, Increment};
use MenuAction::*;

#[rustfmt::skip]
pub const TRANSITIONS: &[(PageId, ButtonRole, MenuAction)] = &[
    // List pages
    (PageId::Main,             Decrement, SelectPrevious),
    (PageId::Main,             Increment, SelectNext),
    (PageId::Main,             Confirm,   ActivateItem),
    (PageId::Main,             Back,      GoBack),

    (PageId::AutoWatering,     Decrement, SelectPrevious),
    (PageId::AutoWatering,     Increment, SelectNext),
    (PageId::AutoWatering,     Confirm,   ActivateItem),
    (PageId::AutoWatering,     Back,      GoBack),

    (PageId::Settings,         Decrement, SelectPrevious),
    (PageId::Settings,         Increment, SelectNext),
    (PageId::Settings,         Confirm,   ActivateItem),
    (PageId::Settings,         Back,      GoBack),

    (PageId::Calibration,      Decrement, SelectPrevious),
    (PageId::Calibration,      Increment, SelectNext),
    (PageId::Calibration,      Confirm,   ActivateItem),
    (PageId::Calibration,      Back,      GoBack),

    (PageId::Debug,            Decrement, SelectPrevious),
    (PageId::Debug,            Increment, SelectNext),
    (PageId::Debug,            Back,      GoBack),

    // Manual watering
    (PageId::ManualWatering,   Decrement, AdjustManualDuration(-1)),
    (PageId::ManualWatering,   Increment, AdjustManualDuration(1)),
    (PageId::ManualWatering,   Confirm,   StartManualWatering),
    (PageId::ManualWatering,   Back,      GoBack),

    // Value editors
    (PageId::EditInterval,     Decrement, AdjustDraft(-1)),
    (PageId::EditInterval,     Increment, AdjustDraft(1)),
    (PageId::EditInterval,     Confirm,   SaveDraft),
    (PageId::EditInterval,     Back,      GoBack),

    (PageId::EditVolume,       Decrement, AdjustDraft(-1)),
    (PageId::EditVolume,       Increment, AdjustDraft(1)),
    (PageId::EditVolume,       Confirm,   SaveDraft),
    (PageId::EditVolume,       Back,      GoBack),

    (PageId::EditSpeed,        Decrement, AdjustDraft(-1)),
    (PageId::EditSpeed,        Increment, AdjustDraft(1)),
    (PageId::EditSpeed,        Confirm,   SaveDraft),
    (PageId::EditSpeed,        Back,      GoBack),

    (PageId::ResetSettings,    Confirm,   ResetSettings),
    (PageId::ResetSettings,    Back,      GoBack),

    // Calibration wizard
    (PageId::CalibrationTrial, Decrement, CalibrationStepDown),
    (PageId::CalibrationTrial, Increment, CalibrationStepUp),
    (PageId::CalibrationTrial, Confirm,   CalibrationConfirm),
    (PageId::CalibrationTrial, Back,      GoBack),
];

pub fn lookup(page: PageId, role: ButtonRole) -> MenuAction {
    TRANSITIONS
        .iter()
        .find(|(p, r, _)| *p == page && *r == role)
        .map_or(Ignore, |(_, _, action)| *action)
}

use crate::domain::models::ShiftStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StyleTone {
    Confirmed,
    Tentative,
    Muted,
    Away,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StyleEmphasis {
    Solid,
    Outline,
}

/// Presentation token for a shift bar. Colors and sizes belong to the view
/// layer; this only names the variant to draw.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ShiftVisualStyle {
    pub tone: StyleTone,
    pub emphasis: StyleEmphasis,
    pub pending: bool,
}

impl ShiftVisualStyle {
    pub fn token(&self) -> String {
        let tone = match self.tone {
            StyleTone::Confirmed => "confirmed",
            StyleTone::Tentative => "tentative",
            StyleTone::Muted => "muted",
            StyleTone::Away => "away",
        };
        let emphasis = match self.emphasis {
            StyleEmphasis::Solid => "solid",
            StyleEmphasis::Outline => "outline",
        };
        if self.pending {
            format!("shift-{tone}-{emphasis}-pending")
        } else {
            format!("shift-{tone}-{emphasis}")
        }
    }
}

pub fn get_shift_visual_style(status: ShiftStatus, unsaved: bool) -> ShiftVisualStyle {
    let (tone, emphasis) = match status {
        ShiftStatus::Working => (StyleTone::Confirmed, StyleEmphasis::Solid),
        ShiftStatus::Tentative => (StyleTone::Tentative, StyleEmphasis::Outline),
        ShiftStatus::Off => (StyleTone::Muted, StyleEmphasis::Outline),
        ShiftStatus::Leave => (StyleTone::Away, StyleEmphasis::Solid),
    };
    ShiftVisualStyle {
        tone,
        emphasis,
        pending: unsaved,
    }
}

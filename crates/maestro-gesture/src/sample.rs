//! Gesture labels and per-frame samples.

use serde::{Deserialize, Serialize};

/// Discrete hand pose from the closed classifier vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    OpenPalm,
    ClosedFist,
    Pointing,
    PeaceSign,
    ThumbsUp,
    OkSign,
    RockOn,
    ThreeFingers,
    FourFingers,
    Other,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 10] = [
        GestureLabel::OpenPalm,
        GestureLabel::ClosedFist,
        GestureLabel::Pointing,
        GestureLabel::PeaceSign,
        GestureLabel::ThumbsUp,
        GestureLabel::OkSign,
        GestureLabel::RockOn,
        GestureLabel::ThreeFingers,
        GestureLabel::FourFingers,
        GestureLabel::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            GestureLabel::OpenPalm => "Open Palm",
            GestureLabel::ClosedFist => "Closed Fist",
            GestureLabel::Pointing => "Pointing",
            GestureLabel::PeaceSign => "Peace Sign",
            GestureLabel::ThumbsUp => "Thumbs Up",
            GestureLabel::OkSign => "OK Sign",
            GestureLabel::RockOn => "Rock On",
            GestureLabel::ThreeFingers => "Three Fingers",
            GestureLabel::FourFingers => "Four Fingers",
            GestureLabel::Other => "Other",
        }
    }
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One tracked hand in one frame.
///
/// `position` is the index fingertip in normalized image coordinates
/// (`(0, 0)` top-left). `pinch_distance` is the thumb-to-index distance in
/// the same units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub position: (f32, f32),
    pub pinch_distance: f32,
    pub label: GestureLabel,
}

impl GestureSample {
    pub fn new(x: f32, y: f32, pinch_distance: f32, label: GestureLabel) -> Self {
        Self {
            position: (x, y),
            pinch_distance,
            label,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.0
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.1
    }
}

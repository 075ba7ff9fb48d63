use serde::{Deserialize, Serialize};
use std::fmt;

use crate::InputError;

/// Symbolic control names shared by both layouts' consumers.
pub mod controls {
    pub const TRIGGER: &str = "TRIGGER";
    pub const SQUEEZE: &str = "SQUEEZE";
    pub const TOUCHPAD: &str = "TOUCHPAD";
    pub const THUMBSTICK: &str = "THUMBSTICK";
    pub const BUTTON_A: &str = "BUTTON_A";
    pub const BUTTON_B: &str = "BUTTON_B";
    pub const TOUCHPAD_X: &str = "TOUCHPAD_X";
    pub const TOUCHPAD_Y: &str = "TOUCHPAD_Y";
    pub const THUMBSTICK_X: &str = "THUMBSTICK_X";
    pub const THUMBSTICK_Y: &str = "THUMBSTICK_Y";
}

/// Which table a symbolic name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Axis,
    AxisPair,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => f.write_str("button"),
            Self::Axis => f.write_str("axis"),
            Self::AxisPair => f.write_str("axis pair"),
        }
    }
}

/// An axis pair: symbolic name plus the names of its x and y axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPairDef {
    pub name: &'static str,
    pub x: &'static str,
    pub y: &'static str,
}

const STANDARD_BUTTONS: &[(&str, usize)] = &[
    ("FACE_BOTTOM", 0),
    ("FACE_RIGHT", 1),
    ("FACE_LEFT", 2),
    ("FACE_TOP", 3),
    ("LEFT_BUMPER", 4),
    ("RIGHT_BUMPER", 5),
    ("LEFT_TRIGGER", 6),
    ("RIGHT_TRIGGER", 7),
    ("SELECT", 8),
    ("START", 9),
    ("LEFT_STICK", 10),
    ("RIGHT_STICK", 11),
    ("DPAD_UP", 12),
    ("DPAD_DOWN", 13),
    ("DPAD_LEFT", 14),
    ("DPAD_RIGHT", 15),
    ("HOME", 16),
];

const STANDARD_AXES: &[(&str, usize)] = &[
    ("LEFT_STICK_X", 0),
    ("LEFT_STICK_Y", 1),
    ("RIGHT_STICK_X", 2),
    ("RIGHT_STICK_Y", 3),
];

const STANDARD_PAIRS: &[AxisPairDef] = &[
    AxisPairDef {
        name: "LEFT_STICK",
        x: "LEFT_STICK_X",
        y: "LEFT_STICK_Y",
    },
    AxisPairDef {
        name: "RIGHT_STICK",
        x: "RIGHT_STICK_X",
        y: "RIGHT_STICK_Y",
    },
];

const XR_BUTTONS: &[(&str, usize)] = &[
    (controls::TRIGGER, 0),
    (controls::SQUEEZE, 1),
    (controls::TOUCHPAD, 2),
    (controls::THUMBSTICK, 3),
    (controls::BUTTON_A, 4),
    (controls::BUTTON_B, 5),
];

const XR_AXES: &[(&str, usize)] = &[
    (controls::TOUCHPAD_X, 0),
    (controls::TOUCHPAD_Y, 1),
    (controls::THUMBSTICK_X, 2),
    (controls::THUMBSTICK_Y, 3),
];

const XR_PAIRS: &[AxisPairDef] = &[
    AxisPairDef {
        name: controls::TOUCHPAD,
        x: controls::TOUCHPAD_X,
        y: controls::TOUCHPAD_Y,
    },
    AxisPairDef {
        name: controls::THUMBSTICK,
        x: controls::THUMBSTICK_X,
        y: controls::THUMBSTICK_Y,
    },
];

/// Static mapping from symbolic control names to raw device indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlLayout {
    /// Gamepad-style layout.
    Standard,
    /// Tracked hand controller layout.
    XrStandard,
}

impl ControlLayout {
    pub const ALL: [ControlLayout; 2] = [ControlLayout::Standard, ControlLayout::XrStandard];

    /// Resolve the layout a device declares.
    pub fn from_mapping(id: &str) -> Result<Self, InputError> {
        match id {
            "standard" => Ok(Self::Standard),
            "xr-standard" => Ok(Self::XrStandard),
            other => Err(InputError::UnknownLayout(other.to_string())),
        }
    }

    pub fn mapping_id(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::XrStandard => "xr-standard",
        }
    }

    pub fn buttons(&self) -> &'static [(&'static str, usize)] {
        match self {
            Self::Standard => STANDARD_BUTTONS,
            Self::XrStandard => XR_BUTTONS,
        }
    }

    pub fn axes(&self) -> &'static [(&'static str, usize)] {
        match self {
            Self::Standard => STANDARD_AXES,
            Self::XrStandard => XR_AXES,
        }
    }

    pub fn axis_pairs(&self) -> &'static [AxisPairDef] {
        match self {
            Self::Standard => STANDARD_PAIRS,
            Self::XrStandard => XR_PAIRS,
        }
    }

    /// Number of raw button slots the layout addresses.
    pub fn button_slots(&self) -> usize {
        self.buttons().iter().map(|(_, i)| i + 1).max().unwrap_or(0)
    }

    /// Number of raw axis slots the layout addresses.
    pub fn axis_slots(&self) -> usize {
        self.axes().iter().map(|(_, i)| i + 1).max().unwrap_or(0)
    }

    pub fn button_index(&self, name: &str) -> Result<usize, InputError> {
        lookup(self.buttons(), name).ok_or_else(|| self.unknown(ControlKind::Button, name))
    }

    pub fn axis_index(&self, name: &str) -> Result<usize, InputError> {
        lookup(self.axes(), name).ok_or_else(|| self.unknown(ControlKind::Axis, name))
    }

    /// Raw (x, y) axis indices of a named pair.
    pub fn axis_pair(&self, name: &str) -> Result<(usize, usize), InputError> {
        let pair = self
            .axis_pairs()
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| self.unknown(ControlKind::AxisPair, name))?;
        Ok((self.axis_index(pair.x)?, self.axis_index(pair.y)?))
    }

    fn unknown(&self, kind: ControlKind, name: &str) -> InputError {
        InputError::UnknownControl {
            layout: self.mapping_id(),
            kind,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ControlLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mapping_id())
    }
}

fn lookup(table: &[(&str, usize)], name: &str) -> Option<usize> {
    table.iter().find(|(n, _)| *n == name).map(|(_, i)| *i)
}

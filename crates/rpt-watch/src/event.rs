// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// One coordinate of a preload position.
///
/// `text` is the token as written in the log and is what alerts show,
/// `value` is only used for the ground check.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub value: f64,
    pub text: String,
}

impl Coordinate {
    pub fn parse(token: &str) -> Result<Self, std::num::ParseFloatError> {
        Ok(Self {
            value: token.parse()?,
            text: token.to_string(),
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One suspected under-map glitch extracted from a preload line.
#[derive(Debug, Clone, PartialEq)]
pub struct GlitchEvent {
    /// Log-native time of day, sub-second part dropped. Only displayed.
    pub timestamp: String,
    pub player_name: String,
    pub x: Coordinate,
    pub y: Coordinate,
    pub z: Coordinate,
}

impl GlitchEvent {
    /// Operator-facing text of the alert. The vertical coordinate is left out,
    /// it is always negative here.
    pub fn description(&self) -> String {
        format!(
            "Suspected Under-Map-Glitch attempt.\nTime: {}\nUser: ` {} `\nLocation: **{} / {}**",
            self.timestamp, self.player_name, self.x, self.z
        )
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Extraction of glitch events from RPT preload lines.
//!
//! A login preload line looks like:
//!
//! ```text
//! 12:34:56.789 Login: Player Alice (76561198000000000) preloading at: 4512.3 -2.1 9876.5, 0.0
//! ```
//!
//! A negative vertical coordinate at preload time is the under-map glitch signal.

use crate::error::ParseError;
use crate::event::{Coordinate, GlitchEvent};

/// Substring every candidate line has to contain.
pub const MARKER: &str = "preloading";

const LOGIN_SEPARATOR: &str = " Login: Player ";
const PLAYER_PREFIX: &str = "Player ";
const PLAYER_SUFFIX: &str = " (";
const POSITION_PREFIX: &str = ") preloading at: ";

pub fn is_candidate(line: &str) -> bool {
    line.contains(MARKER)
}

/// Parses one log line.
///
/// Returns `Ok(None)` for lines without the marker and for preloads above
/// ground (`y >= 0`). Marker lines that do not have the preload layout are
/// reported as [`ParseError`], the caller decides whether to skip them.
pub fn parse_line(line: &str) -> Result<Option<GlitchEvent>, ParseError> {
    if !is_candidate(line) {
        return Ok(None);
    }

    let timestamp = line
        .split(LOGIN_SEPARATOR)
        .next()
        .and_then(|prefix| prefix.split('.').next())
        .unwrap_or_default();

    let (_, after_prefix) = line
        .split_once(PLAYER_PREFIX)
        .ok_or(ParseError::MissingSeparator(PLAYER_PREFIX))?;
    let player_name = after_prefix
        .split_once(PLAYER_SUFFIX)
        .map_or(after_prefix, |(name, _)| name);

    // Use the last position section, earlier ones can be part of the player context.
    let (_, position) = line
        .rsplit_once(POSITION_PREFIX)
        .ok_or(ParseError::MissingSeparator(POSITION_PREFIX))?;
    let position = position.split(',').next().unwrap_or_default();
    let [x, y, z] = parse_coordinates(position)?;

    if y.value.is_nan() || y.value >= 0.0 {
        return Ok(None);
    }

    Ok(Some(GlitchEvent {
        timestamp: timestamp.to_string(),
        player_name: player_name.to_string(),
        x,
        y,
        z,
    }))
}

fn parse_coordinates(position: &str) -> Result<[Coordinate; 3], ParseError> {
    let tokens: Vec<&str> = position.split(' ').collect();
    let found = tokens.len();
    if found != 3 {
        return Err(ParseError::CoordinateCount { found });
    }

    let coordinates = tokens
        .into_iter()
        .map(|token| {
            Coordinate::parse(token).map_err(|source| ParseError::InvalidCoordinate {
                token: token.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    coordinates
        .try_into()
        .map_err(|_| ParseError::CoordinateCount { found })
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

/// Lines of the current log file that were already handled.
///
/// Lines are compared after trimming surrounding whitespace. The set only
/// grows until [`ProcessedLines::reset`] is called on rotation.
#[derive(Debug, Default)]
pub struct ProcessedLines {
    lines: HashSet<String>,
}

impl ProcessedLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines not seen yet, trimmed, in input order.
    ///
    /// Membership is checked against the set as it was before the call, so a
    /// line repeated within `lines` is returned each time.
    pub fn filter_unseen<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !self.lines.contains(line))
            .collect()
    }

    pub fn mark_seen(&mut self, line: &str) {
        let line = line.trim();
        if !self.lines.contains(line) {
            self.lines.insert(line.to_string());
        }
    }

    pub fn reset(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

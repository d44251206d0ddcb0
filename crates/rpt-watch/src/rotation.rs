// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationResult {
    pub is_rotation: bool,
}

/// Remembers which log file is current for one target.
#[derive(Debug, Default)]
pub struct RotationTracker {
    current: Option<String>,
}

impl RotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `identity` as current. The first observation is never a rotation.
    pub fn observe(&mut self, identity: &str) -> RotationResult {
        let is_rotation = self
            .current
            .as_deref()
            .is_some_and(|previous| previous != identity);
        if self.current.as_deref() != Some(identity) {
            self.current = Some(identity.to_string());
        }
        RotationResult { is_rotation }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

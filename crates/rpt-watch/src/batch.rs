// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Packing of alert messages into webhook-sized batches.
//!
//! A webhook call accepts at most [`MAX_BATCH_ITEMS`] embeds whose combined
//! length may not exceed [`MAX_BATCH_SIZE`] characters. Messages are packed
//! greedily in arrival order, a batch is closed as soon as the next message
//! does not fit.

use serde::Serialize;

use crate::event::GlitchEvent;

pub const MAX_BATCH_SIZE: usize = 6000;
pub const MAX_BATCH_ITEMS: usize = 10;

/// One rendered alert, sized in webhook length units (characters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    description: String,
    size: usize,
}

impl NotificationMessage {
    pub fn new(description: String) -> Self {
        let size = description.chars().count();
        Self { description, size }
    }

    pub fn from_event(event: &GlitchEvent) -> Self {
        Self::new(event.description())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Debug, Serialize)]
pub struct Embed<'a> {
    pub description: &'a str,
}

/// Body of a webhook execution.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertBatch {
    messages: Vec<NotificationMessage>,
    total_size: usize,
}

impl AlertBatch {
    fn push(&mut self, message: NotificationMessage) {
        self.total_size += message.size;
        self.messages.push(message);
    }

    fn fits(&self, message: &NotificationMessage) -> bool {
        self.total_size + message.size <= MAX_BATCH_SIZE && self.messages.len() < MAX_BATCH_ITEMS
    }

    pub fn messages(&self) -> &[NotificationMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<NotificationMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Webhook body carrying this batch, one embed per message.
    pub fn payload(&self) -> WebhookPayload<'_> {
        WebhookPayload {
            embeds: self
                .messages
                .iter()
                .map(|message| Embed {
                    description: &message.description,
                })
                .collect(),
        }
    }
}

/// Greedy left-to-right packing within the webhook limits. Never reorders.
///
/// Empty input yields a single empty batch, which callers skip. A message
/// larger than [`MAX_BATCH_SIZE`] is not rejected, it ends up alone in its batch.
pub fn pack(messages: Vec<NotificationMessage>) -> Vec<AlertBatch> {
    let mut batches = vec![AlertBatch::default()];
    for message in messages {
        match batches.last_mut() {
            Some(current) if current.fits(&message) => current.push(message),
            _ => {
                let mut batch = AlertBatch::default();
                batch.push(message);
                batches.push(batch);
            }
        }
    }
    batches
}

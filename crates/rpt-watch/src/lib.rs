// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Incremental tracking of game server RPT logs.
//!
//! Each sweep downloads the current log of every configured server, keeps
//! the preload lines not handled yet for that file, turns under-map preloads
//! into alerts and posts them to the server's webhook in size-bounded batches.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod event;
pub mod http_utils;
pub mod monitor;
pub mod parser;
pub mod rotation;
pub mod sink;
pub mod source;

pub use config::{MonitorConfig, Target};
pub use error::{ConfigError, DeliveryError, ParseError, TransportError};
pub use monitor::{CycleReport, Monitor, SweepSummary, TargetMonitor};

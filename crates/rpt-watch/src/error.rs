// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use derive_more::Display;
use reqwest::StatusCode;
use std::num::ParseFloatError;

/// Errors raised while loading or validating the monitor configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read targets file {path}: {source}")]
    ReadTargets {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse targets file {path}: {source}")]
    ParseTargets {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Step of the log retrieval that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FetchStep {
    #[display("service info")]
    ServiceInfo,
    #[display("file list")]
    FileList,
    #[display("download link")]
    DownloadLink,
    #[display("file download")]
    Download,
}

/// Any failure of the log source. Aborts the current cycle of one target only.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{step} request failed with status {status}: {body}")]
    Status {
        step: FetchStep,
        status: StatusCode,
        body: String,
    },

    #[error("{step} request failed: {source}")]
    Request {
        step: FetchStep,
        #[source]
        source: reqwest::Error,
    },

    #[error("{step} response is malformed: {reason}")]
    Malformed { step: FetchStep, reason: String },

    #[error("`Reduce Log Output` is enabled, no RPT log is written")]
    LoggingDisabled,

    #[error("no .RPT file found in {dir}")]
    NoLogFile { dir: String },
}

/// A marker line that does not have the expected preload layout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing separator {0:?}")]
    MissingSeparator(&'static str),

    #[error("expected 3 coordinates, found {found}")]
    CoordinateCount { found: usize },

    #[error("invalid coordinate {token:?}: {source}")]
    InvalidCoordinate {
        token: String,
        #[source]
        source: ParseFloatError,
    },
}

/// Failure to hand one batch to the notification endpoint.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("webhook rejected batch with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("webhook rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<f64> },

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
}

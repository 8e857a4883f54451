// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the validation engine

use crate::network::CertificateError;
use crate::script::ScriptError;
use sw_core::{SiteId, ValidationMode};
use sw_storage::StoreError;
use thiserror::Error;

/// Errors returned to callers of the validation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("site has not been saved")]
    UnsavedSite,
    #[error("site has no settings")]
    MissingSettings,
    #[error("a check for site {0} is already scheduled")]
    AlreadyScheduled(SiteId),
    #[error("network timeout for site {0} must be greater than zero")]
    NonPositiveTimeout(SiteId),
    #[error("validation mode {0} requires an argument")]
    MissingValidationArgs(ValidationMode),
    #[error("site {0} not found")]
    SiteNotFound(SiteId),
    #[error("unexpected signal: {0}")]
    UnexpectedSignal(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("background task failed: {0}")]
    Join(String),
}

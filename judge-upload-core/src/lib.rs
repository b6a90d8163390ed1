#![doc = "judge-upload-core: core logic library for judge-upload."]

//! This crate contains the transport-agnostic logic of judge-upload: resolving
//! data sets, validating a solution and running the upload/submit workflow
//! against any [`contract::JudgeApi`] implementation.
//! The HTTP client and CLI live in the `judge-upload` crate.
//!
//! # Usage
//! Pass a [`config::DataSetConfig`] and a `JudgeApi` into [`submit::submit_solution`].

pub mod config;
pub mod contract;
pub mod redact;
pub mod submit;
pub mod validate;

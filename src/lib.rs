//! Media Share library.
//!
//! A small image-sharing service: users upload pictures to S3-compatible
//! storage, browse a searchable feed backed by SQLite, and like and comment on
//! each other's uploads.

#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod interaction;
pub mod likes;
pub mod repository;
pub mod session;
pub mod storage;
pub mod web;

pub use error::{ShareError, ShareResult};

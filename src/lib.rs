//! Menu Cache - role-based navigation authorization
//!
//! Keeps a JSON snapshot of roles, menu items and role-menu links next to the
//! relational store, and answers "which menu tree may this user see" from an
//! in-memory index built from it. It exposes all modules for testing purposes.

pub mod cache;
pub mod entities;
pub mod errors;
pub mod jobs;
pub mod menu;
pub mod settings;
pub mod snapshot;
pub mod storage;
pub mod web;

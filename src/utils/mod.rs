// src/utils/mod.rs
//! Hashing helpers.

pub mod canonical;
pub mod crypto;

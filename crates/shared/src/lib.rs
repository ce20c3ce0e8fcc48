//! Shared utilities and common types for the Arisan Digital backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (OTP code hashing)
//! - JWT session token issuing and validation
//! - Phone number normalization and validation

pub mod crypto;
pub mod jwt;
pub mod phone;

//! Stress Core
//!
//! Core types shared by the facade client and the stress test executor.
//!
//! This crate contains:
//! - Domain types: run lifecycle status, terminal classification, feed channels and cursors
//! - DTOs: wire representations of the play, pull and stop commands

pub mod domain;
pub mod dto;

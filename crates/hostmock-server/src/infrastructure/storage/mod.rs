//! Storage infrastructure: configuration file handling.
//!
//! This module is the only place that touches the file system.  The
//! `config` sub-module reads the TOML configuration describing which mock
//! endpoints to start, writes a commented starter file on first run, and
//! converts the parsed schema into the domain types the rest of the
//! server consumes.

pub mod config;

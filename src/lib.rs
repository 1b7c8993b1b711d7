//! Mailroom — inbound message intake pipeline.
//!
//! Polls a mailbox collaborator for new messages, detects duplicates
//! against the record store, normalizes attachment content, validates
//! AI-extracted fields, and persists one structured record per message.
//! External systems (mailbox, AI, geocoding, object storage, record
//! store) are consumed through the traits in [`collaborators`].

pub mod collaborators;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod poller;

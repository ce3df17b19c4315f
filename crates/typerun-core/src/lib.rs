//! Shared leaf utilities for the typerun toolchain.
//!
//! Everything here is part of the contract between the compiler and the VM:
//! both sides must agree on the content hash used to deduplicate storage
//! entries at image load time.

pub mod hash;

pub use hash::content_hash;

//! Integration tests for Layer 0: Foundation
//!
//! Tests for entity handles, identifiers, records, and errors.

mod errors;
mod records;

//! Integration tests for Layer 2: Engine
//!
//! Tests for worlds and systems, the character lifecycle cache, saving, and
//! cross-partition movement.

mod lifecycle;
mod saving;

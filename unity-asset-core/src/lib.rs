//! Unity Asset Core
//!
//! Core data structures shared by the Unity asset readers.
//! The binary reader projects decoded objects onto [`UnityValue`] so that
//! callers can work with plain nested containers.

pub mod constants;
pub mod unity_value;

// Re-export main types
pub use constants::*;
pub use unity_value::UnityValue;

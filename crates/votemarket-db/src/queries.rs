//! Database query functions organized by domain.

pub mod bribes;
pub mod capabilities;
pub mod claims;
pub mod distributions;
pub mod registry;
pub mod state;
pub mod tokens;

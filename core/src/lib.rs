//! # Amaranth Engine Core
//!
//! CPU-side building blocks for the Amaranth engine. Everything in this
//! crate is GPU-agnostic and usable headless (tests, tools, asset
//! pipelines) without a graphics context.

pub mod attribute;
pub mod math;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the core subsystem.
pub fn init() {
    log::info!("Amaranth Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

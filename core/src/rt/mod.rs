//! Runtime services: the public [`Runtime`] surface, per-thread call stacks,
//! capability lookup, resource locators and configuration.

mod capability;
pub mod config;
pub mod locator;
mod runtime;
mod stack;

pub use capability::{CapabilityProvider, CapabilityRegistry, CompilerOptions, LoadCounter, LoadHook, TestSupport};
pub use config::{ConfigError, RuntimeConfig};
pub use locator::{Locator, LocatorResponse};
pub use runtime::{Runtime, RuntimeBuilder, StackTraceElement};

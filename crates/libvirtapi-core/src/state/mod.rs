// # State Store Implementations
//
// The host tool owns persistence; this module only provides the in-memory
// store used when the provider is embedded.

pub mod memory;

pub use memory::MemoryStateStore;

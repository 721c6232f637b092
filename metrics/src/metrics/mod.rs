pub mod content;
pub mod shared;

// Re-export the main types for easy access
pub use content::*;
pub use shared::*;

pub mod dependencies;
pub mod seed;
pub mod tables;
pub mod types;

pub use dependencies::*;
pub use seed::*;
pub use tables::*;
pub use types::*;

pub mod operator;
pub mod relation;
pub mod term;

pub use operator::*;
pub use relation::*;
pub use term::*;

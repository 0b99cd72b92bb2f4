pub use constraint::*;
pub use knowledge::*;

mod constraint;
mod knowledge;

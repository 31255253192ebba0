pub mod expense;
pub mod keywords;
pub mod token;

pub use expense::*;
pub use keywords::*;
pub use token::*;

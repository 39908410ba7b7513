pub mod compare;
pub mod result;
pub mod runner;
pub mod testcase;
pub mod workspace;

pub use compare::*;
pub use result::*;
pub use runner::*;
pub use testcase::*;
pub use workspace::*;

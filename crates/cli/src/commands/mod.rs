pub mod check;
pub mod contracts;
pub mod functions;
pub mod graph;
pub mod index;
pub mod project;
pub mod util;

pub use check::*;
pub use contracts::*;
pub use functions::*;
pub use graph::*;
pub use index::*;
pub use project::*;
pub use util::*;

pub mod analyze;
pub mod project;
pub mod runs;
pub mod table;
pub mod util;

pub use analyze::*;
pub use project::*;
pub use runs::*;
pub use table::*;
pub use util::*;

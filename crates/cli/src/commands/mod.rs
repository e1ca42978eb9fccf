pub mod check;
pub mod classify;
pub mod options;
pub mod scenarios;
pub mod util;

pub use check::*;
pub use classify::*;
pub use options::*;
pub use scenarios::*;
pub use util::*;

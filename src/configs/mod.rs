pub mod base;
pub mod logging;
pub mod node;
pub mod session;

pub use base::*;
pub use logging::*;
pub use node::*;
pub use session::*;

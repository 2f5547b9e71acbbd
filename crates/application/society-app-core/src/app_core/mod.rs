pub mod actions;
pub mod reducer;
pub mod slice;
pub mod store;

pub use actions::{Action, ActionFamily, NavigationAction, SessionAction, SlicePhase};
pub use reducer::reduce;
pub use slice::{SliceState, Status};
pub use store::Store;

//! Live grant state
//!
//! - `state` - the fetched grant maps and their accumulating builder
//! - `filter` - scoping of fetched grants to tracked objects
//! - `fetch` - pulls direct grants, future grants and user memberships
//! - `inventory` - object listings used to expand wildcard refs

pub mod fetch;
pub mod filter;
pub mod inventory;
pub mod state;

pub use fetch::GrantStateFetcher;
pub use filter::ScopeFilter;
pub use inventory::ObjectInventory;
pub use state::{GrantState, GrantStateBuilder};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup, first match in precedence order)
//!     → matcher.rs (segment-aware prefix match)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Mount collaborators in registration order
//!     → Stable sort by priority, then prefix specificity
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Identical prefixes: first registered wins

pub mod matcher;
pub mod router;

pub use matcher::PathPrefix;
pub use router::{Route, RouteTable, RouteTableBuilder};

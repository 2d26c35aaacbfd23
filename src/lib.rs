//! nestkey - usage index and namespace migration for flat i18n keys
//!
//! nestkey scans Svelte/TypeScript sources for message-function references
//! such as `m.welcome()` or `{$m.title}`, indexes where every key is used, and
//! proposes moving flat keys under the route namespace they are mostly used
//! in (`welcome` → `home.welcome`). Accepted proposals are applied to the
//! sources and to every locale catalog, with a backup of each file written.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and parsing
//! - `core`: Scanning, indexing, suggestion and refactoring engine

pub mod cli;
pub mod config;
pub mod core;

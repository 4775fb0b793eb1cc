// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Lineage - a replicated, event-sourced document engine.
//!
//! A document's state is a pure function of its operation log. Replicas
//! append to their logs independently, and merge reconciles two divergent
//! logs into one that every replica can adopt.
//!
//! # Quick Start
//!
//! ```
//! use lineage::document::Action;
//! use lineage::document::Document;
//! use lineage::document::PerScope;
//! use lineage::document::Scope;
//! use lineage::document::undo;
//! use lineage::error::ActionError;
//! use lineage::reducer::Engine;
//! use lineage::reducer::Reducer;
//!
//! struct Tally;
//!
//! impl Reducer for Tally {
//!     type State = i64;
//!
//!     fn reduce(&self, state: &mut i64, action: &Action) -> Result<(), ActionError> {
//!         *state += action.input.as_i64().ok_or_else(|| ActionError::new("not a number"))?;
//!         return Ok(());
//!     }
//! }
//!
//! let engine = Engine::new(Tally);
//! let doc = Document::new("tally", PerScope::new(0, 0));
//! let doc = engine.apply(&doc, Action::new("ADD", 5.into(), Scope::Global)).unwrap();
//! let doc = engine.apply(&doc, Action::new("ADD", 2.into(), Scope::Global)).unwrap();
//! assert_eq!(doc.state.global, 7);
//!
//! let doc = engine.apply(&doc, undo(Scope::Global, 1)).unwrap();
//! assert_eq!(doc.state.global, 5);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod key;
pub mod log;
pub mod reducer;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use config::ReducerOptions;
pub use document::Action;
pub use document::Document;
pub use document::Operation;
pub use document::Scope;
pub use error::Error;
pub use reducer::Engine;
pub use reducer::Reducer;

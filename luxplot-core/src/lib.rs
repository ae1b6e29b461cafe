//! # luxplot-core
//!
//! Backend library for the luxplot lighting-plot editor. Provides the record
//! store, reference resolution, DMX addressing, cue levels, fixture
//! templates, the USITT ASCII importer and editor command dispatch,
//! independent of any front end.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use luxplot_core::config::Config;
//! use luxplot_core::dispatch::dispatch_action;
//! use luxplot_core::state::{persistence, Session};
//! use luxplot_types::{EditorAction, FixtureAction};
//!
//! // 1. Session with templates and settings from config
//! let config = Config::load();
//! let mut session = Session::from_config(&config);
//! session.document = persistence::load_document(path)?;
//!
//! // 2. Dispatch actions; missing records come back as warnings
//! let action = EditorAction::Fixture(FixtureAction::List);
//! let result = dispatch_action(&action, &mut session)?;
//!
//! // 3. Save if the action could have changed anything
//! if action.is_mutating() {
//!     persistence::save_document(path, &session.document)?;
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`state`]: `Document` (the record store), `Session`, JSON persistence
//! - [`reference`]: reference expressions (`3-5`, `12.3`, `auto`)
//! - [`addressing`]: first-fit DMX allocation with universe rollover
//! - [`levels`]: cue levels and 16-bit splitting
//! - [`templates`]: fixture template discovery and instantiation
//! - [`import`]: USITT ASCII importer
//! - [`dispatch`]: `dispatch_action()`, the single entry point for commands
//! - [`printer`]: one-line renderings and reports
//! - [`config`]: TOML configuration (embedded defaults + user override)

pub mod addressing;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod import;
pub mod levels;
pub mod printer;
pub mod reference;
pub mod state;
pub mod templates;

pub use error::{Error, Result};

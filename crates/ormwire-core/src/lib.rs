//! Settings layer for ormwire
//!
//! This crate provides the key/value configuration source that the resolver
//! reads from. Settings are layered (file, then environment) and read through
//! dotted paths such as `db.connections` or `orm.cache`.
//!
//! # Quick Start
//!
//! ```no_run
//! use ormwire_core::Settings;
//!
//! fn main() -> ormwire_core::Result<()> {
//!     // Loads config/orm.{yaml,yml,json}, then ORMWIRE__* environment overrides
//!     let settings = Settings::load("config/orm")?;
//!
//!     let default_connection: Option<String> = settings.string("db.default")?;
//!     let debug = settings.flag("app.debug", false)?;
//!     println!("{:?} (debug: {})", default_connection, debug);
//!
//!     Ok(())
//! }
//! ```
//!
//! Raw blocks can also be read as [`serde_json::Value`] and picked apart with
//! the helpers in [`coerce`], which accept both native scalars and their
//! string forms (environment overrides always arrive as strings).

pub mod coerce;
pub mod error;
pub mod settings;

pub use error::{Result, SettingsError};
pub use settings::{Settings, SettingsBuilder, SourceFormat, ENV_PREFIX, ENV_SEPARATOR};

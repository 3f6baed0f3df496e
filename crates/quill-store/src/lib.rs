//! # quill-store
//!
//! SQLite persistence for the prompt builder.
//!
//! This crate provides:
//! - A [`Database`] handle wrapping a shared connection pool
//! - Validated entity types for users, prompts, tags and templates
//! - One repository per entity with CRUD operations
//! - Filtered, sorted and paginated prompt listing
//!
//! ## Example
//!
//! ```ignore
//! use quill_store::{Database, NewPrompt, PromptFilter, PromptRepository};
//!
//! let db = Database::connect("sqlite://quill.db", 5).await?;
//! db.create_tables().await?;
//!
//! let prompts = PromptRepository::new(db.clone());
//! let saved = prompts
//!     .save(&NewPrompt::new("Greeting", "Hello {{name}}", r#"["name"]"#)?)
//!     .await?;
//!
//! let page = prompts.find_all_with_filters(&PromptFilter::default()).await?;
//! ```
//!
//! Input validation happens when the `New*` and `*Changes` values are
//! built, so a repository never sees an invalid entity.

mod db;
mod error;
pub mod models;
mod repositories;
pub mod validation;

pub use db::{Database, SCHEMA};
pub use error::{Result, StoreError};
pub use models::{
    Changes, FieldValue, NewPrompt, NewTag, NewTemplate, NewUser, Prompt, PromptChanges,
    PromptFilter, PromptRef, SortColumn, SortOrder, Tag, TagChanges, Template, TemplateChanges,
    User, UserChanges,
};
pub use repositories::{PromptRepository, TagRepository, TemplateRepository, UserRepository};

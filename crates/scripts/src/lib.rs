//! # Scripts
//!
//! Reconciles Landscape scripts of two incompatible generations into typed
//! declarative state.
//!
//! The remote API returns one logical "script" in two shapes: a legacy flat
//! record whose code must be fetched separately, and a modern versioned record
//! with inline interpreter and body. This crate decides which shape a payload
//! has and projects it into complete local records, then drives
//! create/read/update/delete against a [`landscape::Backend`].
//!
//! ## Core Concepts
//!
//! - **Variant decoding** ([`variant::decode`]): exactly one of
//!   [`LegacyScript`]/[`ModernScript`], or an error
//! - **Attachment projection** ([`Attachments`]): filenames or `{id, filename}`
//!   objects, never a mix
//! - **Content fetching** ([`content`]): legacy code round-trip, modern merge
//! - **State projection** ([`ScriptState`]): every record field is a definite
//!   [`Attr`]
//! - **Mutation** ([`ScriptResource`], [`AttachmentResource`]): flat-parameter
//!   legacy actions, then a re-read
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use landscape::{CallContext, MockBackend};
//! use scripts::{Attr, ManagedResource, ScriptPlan, ScriptResource};
//!
//! let resource = ScriptResource::modern(Arc::new(MockBackend::new()));
//! let ctx = CallContext::background();
//!
//! let plan = ScriptPlan {
//!     title: Attr::Known("deploy".into()),
//!     code: Attr::Known("#!/bin/bash\n./deploy.sh".into()),
//!     ..ScriptPlan::default()
//! };
//! let state = resource.create(&ctx, &plan).unwrap();
//! assert_eq!(state.status, Attr::Known("active".into()));
//!
//! resource.delete(&ctx, &state).unwrap();
//! assert_eq!(resource.read(&ctx, &state).unwrap(), None);
//! ```

pub mod attachment_resource;
pub mod attachments;
pub mod content;
pub mod data_sources;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod params;
pub mod project;
pub mod record;
pub mod resource;
pub mod script_resource;
pub mod value;
pub mod variant;

pub use attachment_resource::AttachmentResource;
pub use attachments::{AttachmentEntry, Attachments};
pub use data_sources::{AttachmentDataSource, AttachmentQuery, ScriptDataSource};
pub use diagnostics::{Diagnostic, Diagnostics, Outcome, Severity};
pub use diff::{AttributeChange, diff_records};
pub use error::{Error, Result};
pub use project::{ResolvedScript, ScriptState, VariantPolicy};
pub use record::{
    AttachmentItem, AttachmentPlan, AttachmentRecord, CreatorRecord, EditorRecord,
    LegacyScriptRecord, ProfileItem, ScriptPlan, ScriptRecord,
};
pub use resource::{ChangeKind, DataSource, ManagedResource};
pub use script_resource::ScriptResource;
pub use value::Attr;
pub use variant::{LegacyScript, ModernScript, Script, Variant};

//! # landscape
//!
//! Blocking client for the parts of the Landscape API that manage scripts.
//!
//! This crate provides:
//! - The [`Backend`] trait: get a script, invoke a named legacy action,
//!   fetch attachment content, archive a script
//! - [`backend::http::HttpBackend`], which logs in and talks to a server
//! - [`MockBackend`], an in-memory server for tests
//! - [`CallContext`], the per-operation deadline passed to every call
//!
//! Responses are classified into [`ApiResponse`] arms (success, 400, 404,
//! anything else). Failures without a response are [`Error`]s. Nothing is
//! retried here.
//!
//! ## Example
//!
//! ```
//! use landscape::{ApiResponse, Backend, CallContext, MockBackend};
//! use serde_json::json;
//!
//! let mock = MockBackend::new();
//! mock.insert_script(json!({"id": 7, "title": "hello", "status": "V1"}));
//!
//! let ctx = CallContext::background();
//! match mock.get_script(&ctx, 7).unwrap() {
//!     ApiResponse::Ok(payload) => assert_eq!(payload["title"], "hello"),
//!     other => panic!("unexpected response: {other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{Backend, MockBackend, RecordedCall};
pub use error::{Error, ErrorCategory, Result};
pub use types::{ApiResponse, CallContext, Credentials, LEGACY_API_VERSION, LegacyAction, Params};

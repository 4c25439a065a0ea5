//! Typed expression/statement trees of single method bodies.
//!
//! A [`Body`](ast::Body) owns every node of one method in index-addressed arenas. Nodes refer to
//! their children through typed ids, and rewriting passes splice replacements into the parent's
//! child slot explicitly.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod ast;

mod builder;
pub use builder::BodyBuilder;

pub mod pretty;

pub mod visit;

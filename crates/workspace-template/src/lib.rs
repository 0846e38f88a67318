//! Layered workspace templates.
//!
//! A workspace template is a document made of named lists (components, commands, projects and
//! starter projects), a bag of lifecycle events and a free-form attribute map. Templates rarely
//! stand alone: a document may inherit from a *parent* template and pull in any number of
//! *plugin* templates, and both the parent and each plugin can be customised in place by an
//! *override* document.
//!
//! This crate resolves all of that into a single [`TemplateSpecContent`]:
//!
//! - [`overriding::override_content`] applies one override document (a [`ParentOverrides`] or
//!   [`PluginOverrides`]) to a content tree.
//! - [`layers::merge_layers`] combines several fully resolved content trees (plugins, parent and
//!   main) into one.
//! - [`layers::compose`] does both for a main document that carries its own parent overrides.
//!
//! # How overrides are applied
//!
//! Override trees mirror the content trees, but every scalar is an [`Option`] so that "not
//! mentioned" and "set to the empty value" stay distinguishable. How each field is folded into its
//! content counterpart is declared on the override type itself with `#[derive(Override)]` and
//! `#[merge(strategy = "...")]`; see [`merge`] for the available strategies and the algorithms
//! behind them.
//!
//! Everything is a pure function over owned snapshots: inputs are never mutated, and an error
//! aborts the whole operation without a partial result.

// Lets `#[derive(Override)]` refer to this crate by name from inside the crate itself
extern crate self as workspace_template;

pub mod layers;
pub mod merge;
pub mod model;
pub mod overriding;
pub mod substitution;
pub mod yaml;

pub use model::{ParentOverrides, PluginOverrides, TemplateSpec, TemplateSpecContent};

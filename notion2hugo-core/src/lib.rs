#![doc = "notion2hugo-core: conversion engine for notion2hugo."]

//! Turns a Notion page (metadata properties plus a tree of content blocks)
//! into a Hugo post: a `+++` front-matter block followed by a markdown body.
//!
//! # Modules
//! - [`style`], [`directive`], [`front_matter`], [`render`]: the pure conversion engine
//! - [`export`]: document assembly, output paths and batch export
//! - [`contract`]: collaborator traits (content source, asset fetcher, change requests)
//! - [`notion`], [`assets`]: HTTP implementations of those collaborators
//!
//! CLI glue and the pull-request client live in the `notion2hugo` crate.

pub mod assets;
pub mod config;
pub mod contract;
pub mod directive;
pub mod error;
pub mod export;
pub mod front_matter;
pub mod model;
pub mod notion;
pub mod render;
pub mod style;

pub use error::{ExportError, FrontMatterError, RenderError};
pub use export::{export_page, export_pages, ExportReport, ExportedPage};

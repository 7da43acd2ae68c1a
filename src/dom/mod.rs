//! DOM snapshots and selector matching
//!
//! Every read from the host page returns an owned [`ElementNode`] snapshot; the
//! page itself stays out of reach. This module provides:
//! - ElementNode: snapshot of an element and its subtree
//! - Selector: a CSS selector compiled by `scraper`
//! - DomTree: a path-addressed document for in-memory pages
//! - html: conversion between snapshots and markup

pub mod element;
pub mod html;
pub mod selector;
pub mod tree;

pub use element::ElementNode;
pub use selector::Selector;
pub use tree::{DomTree, NodePath};

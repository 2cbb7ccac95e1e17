//! Waypoint - roadmap planning on a dependency graph.
//!
//! Roadmap items are nodes; directed dependency edges say "source depends on
//! target". The [`graph::DependencyManager`] keeps the edge set acyclic and
//! answers planning queries over an [`store::ItemStore`].

#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod output;
pub mod store;

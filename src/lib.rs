//! # DSAKit
//!
//! Turns a competitive-programming problem page into a ready-to-code local
//! workspace.
//!
//! DSAKit fetches a problem page, pulls the problem out of the page's
//! embedded JSON, asks Gemini for starter code, unpacks a template project
//! into a per-problem directory with that code in place, and records the
//! workspace in a small SQLite catalog.
//!
//! ## Architecture
//!
//! ```text
//! URL ─▶ fetch ─▶ extract ─▶ prompt ─▶ codegen ─▶ workspace ─▶ catalog
//!                                                     │
//!                                                     └──▶ launcher (editor)
//!
//!            ┌──────────┐       ┌──────────┐
//!            │   CLI    │       │   HTTP   │
//!            │ (dsakit) │       │ (serve)  │
//!            └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! dsakit init
//! dsakit ingest https://leetcode.com/problems/two-sum/
//! dsakit list
//! dsakit open 1
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error taxonomy |
//! | [`fetch`] | Page retrieval |
//! | [`extract`] | Per-source problem extraction |
//! | [`prompt`] | Prompt template rendering |
//! | [`codegen`] | Gemini code generation client |
//! | [`workspace`] | Workspace materialization |
//! | [`launcher`] | External editor launch |
//! | [`catalog`] | Persisted workspace catalog |
//! | [`pipeline`] | Stage orchestration |
//! | [`progress`] | Stage progress reporting |
//! | [`server`] | Local HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod launcher;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod server;
pub mod workspace;

//! # Inspection Desk
//!
//! Answers staff questions about municipal inspection notifications and
//! the building code, using a remote large language model grounded on two
//! local inputs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ Spreadsheet  │   │ Building code│
//! │ (records)    │   │ (document)   │
//! └──────┬───────┘   └──────┬───────┘
//!        │  fuzzy match     │
//!        ▼                  ▼
//!      ┌──────────────────────┐     ┌───────────┐
//!      │     QueryResolver     │────▶│ LLM client│
//!      │ prompt + dispatch     │◀────│ Gemini/OAI│
//!      └──────────┬───────────┘     └───────────┘
//!                 │
//!        ┌────────┴────────┐
//!        ▼                 ▼
//!   ┌──────────┐     ┌──────────┐
//!   │   CLI    │     │   HTTP   │
//!   │  (desk)  │     │  (JSON)  │
//!   └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export API_KEY=...                                   # model credential
//! desk sources                                         # check inputs
//! desk ask notifications "Which notices are pending?"
//! desk ask notifications "Status?" --address "Rua Principal 100"
//! desk ask code "What is the minimum front setback?"
//! desk serve                                           # start HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records, dataset, document, answer |
//! | [`records`] | Spreadsheet loading |
//! | [`document`] | Building code text extraction |
//! | [`matcher`] | Fuzzy address matching |
//! | [`llm`] | Language model clients |
//! | [`prompt`] | Prompt templates |
//! | [`resolver`] | Query resolution |
//! | [`error`] | Error taxonomy and user messages |
//! | [`server`] | HTTP API |
//! | [`sources`] | Input health status |

pub mod ask;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod prompt;
pub mod records;
pub mod resolver;
pub mod server;
pub mod sources;

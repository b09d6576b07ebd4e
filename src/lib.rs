//! # motiftrack - Motif Hit Projection and Track Layout
//!
//! Takes a table of transcription-factor motif hits on a reference sequence,
//! projects each significant hit onto a user-chosen genomic window, and stacks
//! the hits into non-overlapping layers for display.
//!
//! ## Architecture
//!
//! The library is a chain of pure stages with the I/O at the edges:
//! - `record`: Typed motif-hit records and cell coercion
//! - `sequence`: Strand normalization and symbol validation
//! - `projection`: Window, eligibility gate and alignment projection
//! - `layout`: Proximity merge and greedy layer assignment
//! - `alignment_set`: Deduplicated alignment collection
//! - `pipeline`: Per-record processing and batch runs
//! - `config`: Validated pipeline parameters and column names
//! - `formats`: Delimited table and FASTA-style I/O
//! - `regulation`: Regulatory-mode annotation from a TRRUST table
//!
//! The terminal viewer follows an event-driven layout:
//! - `model`: Hits, filters, viewport and application state
//! - `event`: Keyboard event handling (Vim-style navigation)
//! - `ui`: TUI rendering with ratatui
//! - `controller`: Orchestration of state transitions

pub mod alignment_set;
pub mod config;
pub mod controller;
pub mod event;
pub mod formats;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod record;
pub mod regulation;
pub mod sequence;
pub mod ui;

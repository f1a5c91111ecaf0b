//! Pipeline stages for quiz generation.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ chain ──▶ tabulate
//!                        ├─ decode     loose JSON decoding of model text
//!                        ├─ normalize  any payload shape → question records
//!                        └─ flatten    question record → 8-column row
//! ```
//!
//! 1. [`extract`]   — load a path / URL / upload and turn it into clean text
//! 2. [`chain`]     — quiz call + review call; the only stage with network I/O
//!    besides URL download
//! 3. [`tabulate`]  — decide which response-shape failure, if any, applies,
//!    using the three pure stages below
//! 4. [`decode`], [`normalize`], [`flatten`] — never fail; they degrade to
//!    "nothing" on input they do not understand

pub mod chain;
pub mod decode;
pub mod extract;
pub mod flatten;
pub mod normalize;
pub mod tabulate;

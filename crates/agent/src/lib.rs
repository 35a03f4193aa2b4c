//! Turn orchestration for TaskMind.
//!
//! One chat turn follows a bounded **Thinking / Invoking** cycle:
//!
//! 1. **Thinking** — the provider gets the transcript plus the tool catalog
//!    and returns either a final text reply or requested tool calls
//! 2. **Invoking** — requested calls are parsed against the closed catalog
//!    and executed strictly in order; structured results are appended to
//!    the transcript (failures included, so the model can recover)
//! 3. back to **Thinking** with the enlarged transcript
//!
//! The cycle ends when the provider answers with text only, or when the
//! round cap is reached and a fallback reply is synthesized. Tool errors
//! never abort a turn; reasoning failures do.

pub mod prompt;
pub mod runner;

pub use prompt::SYSTEM_PROMPT;
pub use runner::{
    DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_REASONING_TIMEOUT, DEFAULT_TOOL_TIMEOUT, TurnError,
    TurnOutcome, TurnRunner,
};

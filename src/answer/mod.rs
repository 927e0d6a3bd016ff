//! Question answering
//!
//! `Orchestrator` holds the per-request decision flow: canned replies for
//! chit-chat, otherwise retrieve, prompt the provider chain, and fall back to
//! lexical matching when the model gives nothing usable. `Assistant` adds the
//! request log around it.

mod assistant;
mod chitchat;
mod orchestrator;
mod prompt;

pub use assistant::Assistant;
pub use chitchat::{detect_chitchat, Chitchat, GREETING_REPLY, THANKS_REPLY};
pub use orchestrator::{Answer, AnswerOrigin, Orchestrator, Outcome};
pub use prompt::build_prompt;

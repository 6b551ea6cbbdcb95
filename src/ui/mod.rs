//! Terminal UI layer for interactive sessions.
//!
//! - [`chat_loop`]: the event loop that turns key presses, query results and
//!   grace timers into [`crate::core::app::AppAction`]s.
//! - [`renderer`] and [`markdown`]: frame composition and answer rendering.
//! - [`theme`]: colour and style policy, including per-agent accents.
//!
//! This layer presents and captures interaction state; [`crate::core`] owns
//! the conversation itself.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;

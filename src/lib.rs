//! Portfolio Terminal
//!
//! Client for the retro portfolio's command-prompt server.
//!
//! # Features
//! - Session state machine mirroring a DOS-style prompt
//! - HTTP client for the command and GitHub repository endpoints
//! - Console renderer with screen clears and colored errors
//! - Interaction analytics routed through `tracing`

pub mod client;
pub mod core;
pub mod terminal;

pub use client::{ClientError, CommandPromptApi, PortfolioClient};
pub use core::analytics::{AnalyticsEvent, AnalyticsSink};
pub use core::config::Config;
pub use terminal::{Renderer, Session, SessionDefaults, Terminal};

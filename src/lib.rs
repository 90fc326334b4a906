//! # jqsh: a jq-like query language and shell
//!
//! The core is a concurrent streaming evaluator. A parsed [`Filter`] tree is
//! turned into a live pipeline of worker threads connected by terminable
//! [`Channel`]s. Values flow down the pipeline; variable scopes travel
//! alongside them in per-channel namespace slots; errors are ordinary
//! [`Exception`] values that short-circuit the stream.
//!
//! ## Architecture
//!
//! - **Channel**: terminable FIFO plus four single-assignment namespace slots
//! - **Values**: strings, arrays and objects materialize lazily from channels
//! - **Engine**: one worker per node, generator bridge, exception short-circuit
//! - **Session**: runs one filter per turn and carries scope between turns
//!
//! ## Configuration
//!
//! Settings live in `config.toml` under the platform config directory, in a
//! `jqsh` folder (see [`config`]).
//!
//! ## Example
//!
//! ```no_run
//! use jqsh::{Filter, Session, Value};
//!
//! let mut session = Session::default();
//! // `., 9` over the inputs 1, 2, 3
//! let filter = Filter::comma(Filter::identity(), Filter::number(9));
//! let out = session
//!     .run(&filter, vec![Value::from(1), Value::from(2), Value::from(3)])
//!     .unwrap();
//! assert_eq!(out.values.len(), 4);
//! ```

pub mod builtins;
pub mod channel;
pub mod command;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod filter;
pub mod session;
pub mod values;

// Re-export commonly used types
pub use builtins::Builtins;
pub use channel::{CancelToken, Channel, ChannelError};
pub use command::{CommandRunner, SystemCommandRunner};
pub use config::JqshConfig;
pub use context::FilterContext;
pub use engine::Runtime;
pub use error::{JqshError, Result};
pub use filter::Filter;
pub use session::{Session, TurnOutput};
pub use values::{Exception, Value};

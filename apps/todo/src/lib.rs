//! Owner-scoped to-do list on top of the Livelist sync layer.
//!
//! The list lives in a remote reactive store. This crate holds everything
//! between the user and that store:
//!
//! - [`view_model`]: pure mutation policies (add, toggle, toggle all, delete,
//!   delete completed) and the derived remaining count
//! - [`TodoReducer`]: identity gate, command checks, transactions and the
//!   owner-scoped subscription, as effects
//! - [`view::Screen`]: the render gate (sign-in, loading, error, list)
//! - [`config`]: environment configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use livelist_core::environment::{SystemClock, UuidGenerator};
//! use livelist_runtime::Store;
//! use livelist_testing::{helpers::owner, InMemoryRemoteStore};
//! use std::sync::Arc;
//! use todo::{Screen, TodoAction, TodoEnvironment, TodoReducer, TodoState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodoEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(UuidGenerator),
//!     Arc::new(InMemoryRemoteStore::new()),
//! );
//! let store = Store::new(TodoState::new(), TodoReducer::new(), env);
//!
//! store.send(TodoAction::SignIn { owner: owner("u1") }).await?;
//! store.send(TodoAction::AddTodo { text: "buy milk".to_string() }).await?;
//!
//! let screen = store.state(Screen::from_state).await;
//! println!("{screen}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reducer;
pub mod types;
pub mod view;
pub mod view_model;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use reducer::{TodoEnvironment, TodoReducer, ITEMS_SUBSCRIPTION};
pub use types::{TodoAction, TodoState};
pub use view::Screen;

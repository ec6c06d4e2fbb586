//! # stencil
//!
//! Directory-backed template engine built on Tera, with layouts and flash
//! messages.
//!
//! Every file under a root whose extension matches is compiled into one
//! template set, named by its path relative to the root without the
//! extension (`<root>/errors/404.html` → `errors/404`). A render may wrap its
//! template in a layout, which embeds the body through the layout-hook
//! variable (`{{ body }}` by default).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use stencil::Engine;
//!
//! fn page() -> Result<String, stencil::RenderError> {
//!     let engine = Engine::new("./views", ".html");
//!     engine.add_func_map(stencil::funcs::all_funcs());
//!     engine.flashes().push_to("error", "Invalid password");
//!     engine.render_to_string("login", &json!({ "Title": "Sign in" }), Some("layouts/app"))
//! }
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod flash;
pub mod funcs;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::RenderError;
pub use flash::Flashes;
pub use funcs::FuncMap;
pub use stencil_source::{FileSource, MemorySource, OsSource};

//! Procedural macros for Embedware.
//!
//! This crate provides:
//!
//! - `#[embedded_plugin]` - registers an `EmbeddedPlugin` implementation in
//!   the link-time plugin table
//!
//! # Example
//!
//! ```rust,ignore
//! use embedware_core::{BoxError, BoxedHandler, EmbeddedPlugin, PluginContext};
//! use embedware_macros::embedded_plugin;
//!
//! pub struct RealIp;
//!
//! #[embedded_plugin]
//! impl EmbeddedPlugin for RealIp {
//!     const NAME: &'static str = "realip";
//!     type Config = Config;
//!     // ...
//! }
//! ```
//!
//! The decorated crate must depend on `embedware-core` directly, and the final
//! binary must link the crate for its plugin to appear in the table.

mod register;

use proc_macro::TokenStream;
use syn::{ItemImpl, parse_macro_input};

/// Registers an `impl EmbeddedPlugin for T` block in `EMBEDDED_PLUGINS`.
///
/// The attribute takes no arguments; the canonical name comes from
/// `EmbeddedPlugin::NAME`.
#[proc_macro_attribute]
pub fn embedded_plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[embedded_plugin] takes no arguments",
        )
        .into_compile_error()
        .into();
    }

    let item = parse_macro_input!(item as ItemImpl);

    match register::embedded_plugin(&item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

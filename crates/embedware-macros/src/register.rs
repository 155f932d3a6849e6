use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Ident, ItemImpl, Type};

/// Implementation of the `#[embedded_plugin]` attribute macro.
///
/// Leaves the decorated `impl EmbeddedPlugin for T` block unchanged and
/// appends a `#[::embedware_core::linkme::distributed_slice]` static that
/// contributes `PluginDescriptor::of::<T>()` to `EMBEDDED_PLUGINS`.
pub fn embedded_plugin(item: &ItemImpl) -> syn::Result<TokenStream> {
    let Some((_, trait_path, _)) = &item.trait_ else {
        return Err(syn::Error::new_spanned(
            &item.self_ty,
            "#[embedded_plugin] must decorate an `impl EmbeddedPlugin for T` block",
        ));
    };

    let is_plugin_impl = trait_path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "EmbeddedPlugin");
    if !is_plugin_impl {
        return Err(syn::Error::new_spanned(
            trait_path,
            "#[embedded_plugin] only applies to `EmbeddedPlugin` implementations",
        ));
    }

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "generic plugin types cannot be registered; register a concrete type",
        ));
    }

    let self_ty = &item.self_ty;
    let type_name = match self_ty.as_ref() {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => {
            return Err(syn::Error::new_spanned(
                self_ty,
                "#[embedded_plugin] needs a named plugin type",
            ));
        }
    };

    let static_name = Ident::new(
        &format!("_EMBEDDED_PLUGIN_REGISTER_{}", type_name.to_uppercase()),
        Span::call_site(),
    );

    Ok(quote! {
        #item

        #[::embedware_core::linkme::distributed_slice(::embedware_core::EMBEDDED_PLUGINS)]
        #[linkme(crate = ::embedware_core::linkme)]
        static #static_name: ::embedware_core::PluginDescriptor =
            ::embedware_core::PluginDescriptor::of::<#self_ty>();
    })
}

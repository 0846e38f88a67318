use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod overrides;

/// Derives `workspace_template::merge::Override` for an override type.
///
/// See the `workspace_template::merge` module for the supported `#[merge(...)]` attributes.
///
/// # Example
///
/// ```
/// use workspace_template::merge::{Override, merge};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Mount {
///     name: String,
///     path: Option<String>,
/// }
///
/// #[derive(Override)]
/// #[merge(target = "Mount")]
/// struct MountOverride {
///     #[merge(strategy = "key")]
///     name: String,
///     #[merge(strategy = "optional")]
///     path: Option<String>,
/// }
///
/// let base = Mount { name: "cache".to_string(), path: None };
/// let merged = merge(&base, &MountOverride {
///     name: "cache".to_string(),
///     path: Some("/cache".to_string()),
/// }).unwrap();
/// assert_eq!(merged.path.as_deref(), Some("/cache"));
/// ```
#[proc_macro_derive(Override, attributes(merge))]
pub fn derive_override(input: TokenStream) -> TokenStream {
    overrides::derive(parse_macro_input!(input as DeriveInput)).into()
}

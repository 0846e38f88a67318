use darling::{
    FromDeriveInput, FromField, FromMeta,
    ast::Data,
    util::{Flag, Ignored},
};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{DeriveInput, Path, parse_quote};

#[derive(FromMeta)]
struct PathOverrides {
    #[darling(default = "PathOverrides::default_merge")]
    merge: Path,
}
impl Default for PathOverrides {
    fn default() -> Self {
        Self {
            merge: Self::default_merge(),
        }
    }
}
impl PathOverrides {
    fn default_merge() -> Path {
        parse_quote!(workspace_template::merge)
    }
}

#[derive(FromDeriveInput)]
#[darling(attributes(merge), supports(struct_named))]
struct OverrideInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, OverrideField>,
    /// The content type that this override applies to
    target: Path,
    /// Kind enum of the target, switches the derive into union mode
    #[darling(default)]
    kind: Option<Path>,
    #[darling(default)]
    path_overrides: PathOverrides,
}

#[derive(FromField)]
#[darling(attributes(merge))]
struct OverrideField {
    ident: Option<Ident>,
    #[darling(default)]
    strategy: Option<Strategy>,
    discriminator: Flag,
    #[darling(default)]
    variant: Option<Ident>,
}

/// How a single override field is folded into the matching content field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    Key,
    Scalar,
    Optional,
    Replace,
    MapMerge,
    MergeByKey,
    MergeReferenced,
    Recurse,
    RecurseOptional,
}

impl FromMeta for Strategy {
    fn from_string(value: &str) -> darling::Result<Self> {
        Ok(match value {
            "key" => Self::Key,
            "scalar" => Self::Scalar,
            "optional" => Self::Optional,
            "replace" => Self::Replace,
            "map_merge" => Self::MapMerge,
            "merge_by_key" => Self::MergeByKey,
            "merge_referenced" => Self::MergeReferenced,
            "recurse" => Self::Recurse,
            "recurse_optional" => Self::RecurseOptional,
            other => return Err(darling::Error::unknown_value(other)),
        })
    }
}

impl Strategy {
    fn expand(self, merge_mod: &Path, field: &Ident) -> TokenStream {
        match self {
            Self::Key => quote! { ::core::clone::Clone::clone(&self.#field) },
            Self::Scalar => quote! { #merge_mod::resolve_scalar(&base.#field, self.#field.as_ref()) },
            Self::Optional => {
                quote! { #merge_mod::resolve_optional(&base.#field, self.#field.as_ref()) }
            }
            Self::Replace => {
                quote! { #merge_mod::replace_sequence(&base.#field, self.#field.as_deref()) }
            }
            Self::MapMerge => quote! { #merge_mod::merge_map(&base.#field, &self.#field) },
            Self::MergeByKey => quote! { #merge_mod::merge_by_key(&base.#field, &self.#field)? },
            Self::MergeReferenced => {
                quote! { #merge_mod::merge_referenced(&base.#field, &self.#field)? }
            }
            Self::Recurse => quote! { #merge_mod::Override::apply_to(&self.#field, &base.#field)? },
            Self::RecurseOptional => {
                quote! { #merge_mod::recurse_optional(&base.#field, self.#field.as_ref())? }
            }
        }
    }
}

pub fn derive(input: DeriveInput) -> TokenStream {
    let OverrideInput {
        ident,
        generics,
        data,
        target,
        kind,
        path_overrides: PathOverrides { merge: merge_mod },
    } = match OverrideInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors(),
    };

    let Some(fields) = data.take_struct() else {
        return darling::Error::unsupported_shape("enum").write_errors();
    };

    let body = match &kind {
        Some(kind) => union_body(&merge_mod, &target, kind, fields.fields),
        None => struct_body(&merge_mod, &target, fields.fields),
    };
    let body = match body {
        Ok(body) => body,
        Err(err) => return err.write_errors(),
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics #merge_mod::Override for #ident #ty_generics #where_clause {
            type Target = #target;

            fn apply_to(&self, base: &Self::Target) -> #merge_mod::Result<Self::Target> {
                #body
            }
        }
    }
}

/// Plain structs: every override field resolves into the target field of the same name,
/// target fields without an override counterpart are carried over from `base`
fn struct_body(
    merge_mod: &Path,
    target: &Path,
    fields: Vec<OverrideField>,
) -> darling::Result<TokenStream> {
    let mut errors = darling::Error::accumulator();
    let assignments = fields
        .into_iter()
        .filter_map(|field| {
            let ident = field.ident?;
            if field.discriminator.is_present() || field.variant.is_some() {
                errors.push(
                    darling::Error::custom(
                        "`discriminator` and `variant` are only valid on union overrides, set `kind` on the struct",
                    )
                    .with_span(&ident),
                );
                return None;
            }
            let value = field
                .strategy
                .unwrap_or(Strategy::Scalar)
                .expand(merge_mod, &ident);
            Some(quote! { #ident: #value, })
        })
        .collect::<TokenStream>();
    errors.finish()?;

    Ok(quote! {
        ::core::result::Result::Ok(#target {
            #assignments
            ..::core::clone::Clone::clone(base)
        })
    })
}

/// Union structs: one optional discriminator plus one optional payload per variant of `target`
fn union_body(
    merge_mod: &Path,
    target: &Path,
    kind: &Path,
    fields: Vec<OverrideField>,
) -> darling::Result<TokenStream> {
    let mut errors = darling::Error::accumulator();
    let mut discriminator: Option<Ident> = None;
    let mut variants = Vec::new();
    for field in fields {
        let Some(ident) = field.ident else {
            continue;
        };
        if field.strategy.is_some() {
            errors.push(
                darling::Error::custom("union override fields take no `strategy`").with_span(&ident),
            );
        } else if field.discriminator.is_present() {
            if discriminator.replace(ident.clone()).is_some() {
                errors.push(
                    darling::Error::custom("only one field may be the `discriminator`")
                        .with_span(&ident),
                );
            }
        } else if let Some(variant) = field.variant {
            variants.push((ident, variant));
        } else {
            errors.push(
                darling::Error::custom(
                    "union override fields must be the `discriminator` or name a `variant`",
                )
                .with_span(&ident),
            );
        }
    }
    if variants.is_empty() {
        errors.push(darling::Error::custom(
            "union overrides need at least one `variant` field",
        ));
    }
    errors.finish()?;

    let declared = match &discriminator {
        Some(field) => quote! { self.#field },
        None => quote! { ::core::option::Option::None },
    };
    let populated = variants.iter().map(|(field, variant)| {
        quote! { (#kind::#variant, self.#field.is_some()), }
    });
    let arms = variants.iter().map(|(field, variant)| {
        quote! {
            #kind::#variant => {
                let base_payload = match base {
                    #target::#variant(payload) => ::core::option::Option::Some(payload),
                    #[allow(unreachable_patterns)]
                    _ => ::core::option::Option::None,
                };
                ::core::result::Result::Ok(#target::#variant(#merge_mod::resolve_variant(
                    kind,
                    base_payload,
                    self.#field.as_ref(),
                )?))
            }
        }
    });

    Ok(quote! {
        let populated = [#(#populated)*];
        let ::core::option::Option::Some(kind) = #merge_mod::active_kind(#declared, &populated)? else {
            return ::core::result::Result::Ok(::core::clone::Clone::clone(base));
        };
        match kind {
            #(#arms)*
            #[allow(unreachable_patterns)]
            other => ::core::result::Result::Err(#merge_mod::unsupported_variant(other)),
        }
    })
}

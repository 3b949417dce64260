use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, Fields};

/// Implements `texstore_utils::OrderedIndex` for a fieldless enum.
///
/// Variant order is index order, so the first declared variant is index `0`.
#[proc_macro_derive(OrderedIndex)]
pub fn ordered_index(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::ItemEnum);

    if input.variants.is_empty() {
        return Error::new(input.span(), "Ordered indexers must have at least one variant")
            .to_compile_error()
            .into();
    }

    if let Some(var) = input
        .variants
        .iter()
        .find(|var| !matches!(var.fields, Fields::Unit))
    {
        return Error::new(var.span(), "Ordered indexers can only contain unit variants")
            .to_compile_error()
            .into();
    }

    let type_ident = &input.ident;
    let type_ident_str = type_ident.to_string();

    let variants: Vec<_> = input.variants.iter().map(|var| &var.ident).collect();
    let indices = 0..variants.len();
    let count = variants.len();

    quote! {
        impl ::texstore_utils::OrderedIndex for #type_ident {
            const COUNT: usize = #count;
            const ALL: &'static [Self] = &[#(Self::#variants,)*];

            #[inline]
            fn index(&self) -> usize {
                match self {
                    #(Self::#variants => #indices,)*
                }
            }

            #[inline]
            fn by_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            #[inline]
            fn name() -> &'static str {
                #type_ident_str
            }
        }

        impl ::std::convert::TryFrom<usize> for #type_ident {
            type Error = ();
            fn try_from(value: usize) -> Result<Self, Self::Error> {
                <Self as ::texstore_utils::OrderedIndex>::by_index(value).ok_or(())
            }
        }
    }
    .into()
}

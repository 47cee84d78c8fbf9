use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::{
    error::GeneratorResult,
    model::Service,
    unit::{Artifact, ArtifactKind},
    utils::{derived_ident, doc_comments, method_ident, parse_type, service_ident, unparse},
};

pub(crate) fn generate(service: &Service) -> GeneratorResult<Vec<Artifact>> {
    let client_ident = service_ident(&service.name, "Client")?;
    let mut artifacts = Vec::new();
    let mut fields = Vec::new();
    let mut inits = Vec::new();
    let mut methods = Vec::new();

    for method in service.unary_methods() {
        // `new` is taken by the constructor.
        let name = if method.name == "new" {
            format_ident!("new_")
        } else {
            method_ident(&method.name)?
        };
        let input_type = parse_type(&method.input_type)?;
        let output_type = parse_type(&method.output_type)?;
        let endpoint = derived_ident("", &method.name, "endpoint");
        let encode_fn = derived_ident("encode", &method.name, "request");
        let decode_fn = derived_ident("decode", &method.name, "response");
        let path = method.route(service);
        let docs = doc_comments(&method.comments);

        artifacts.push(Artifact {
            kind: ArtifactKind::ClientCodec,
            method: Some(method.proto_name.clone()),
            code: unparse(quote! {
                fn #encode_fn(
                    _ctx: &kit_endpoint::Context,
                    request: kit_endpoint::Request,
                ) -> ::std::result::Result<kit_endpoint::Request, kit_endpoint::Error> {
                    ::std::result::Result::Ok(request)
                }

                fn #decode_fn(
                    _ctx: &kit_endpoint::Context,
                    response: kit_endpoint::Response,
                ) -> ::std::result::Result<kit_endpoint::Response, kit_endpoint::Error> {
                    ::std::result::Result::Ok(response)
                }
            })?,
        });

        fields.push(quote!(#endpoint: kit_endpoint::Endpoint,));
        inits.push(quote! {
            #endpoint: kit_client::Client::new(
                channel.clone(),
                #path,
                #encode_fn,
                #decode_fn,
            )
            .endpoint(),
        });
        methods.push(generate_call(&name, &endpoint, &input_type, &output_type, docs));
    }

    let docs = doc_comments(&service.comments);
    artifacts.push(Artifact {
        kind: ArtifactKind::Client,
        method: None,
        code: unparse(quote! {
            #docs
            #[allow(dead_code)]
            #[derive(Clone)]
            pub struct #client_ident {
                #(#fields)*
            }

            #[allow(dead_code)]
            impl #client_ident {
                pub fn new(channel: kit_client::Channel) -> Self {
                    Self {
                        #(#inits)*
                    }
                }

                #(#methods)*
            }
        })?,
    });

    Ok(artifacts)
}

fn generate_call(
    name: &syn::Ident,
    endpoint: &syn::Ident,
    input_type: &syn::Type,
    output_type: &syn::Type,
    docs: TokenStream,
) -> TokenStream {
    quote! {
        #docs
        pub async fn #name(
            &self,
            ctx: kit_endpoint::Context,
            request: #input_type,
        ) -> ::std::result::Result<#output_type, kit_endpoint::Error> {
            let response = (self.#endpoint)(ctx, kit_endpoint::boxed(request)).await?;
            kit_endpoint::downcast::<#output_type>(response)
        }
    }
}

use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::Type;

use crate::{
    config::Features,
    error::GeneratorResult,
    model::{Method, Service},
    pipeline,
    unit::{Artifact, ArtifactKind},
    utils::{
        derived_ident, doc_comments, get_crate_name, method_ident, parse_type, service_ident,
        unparse,
    },
};

struct ServiceInfo<'a> {
    service: &'a Service,
    crate_name: TokenStream,
    trait_ident: Ident,
    server_ident: Ident,
    methods: Vec<MethodInfo<'a>>,
}

struct MethodInfo<'a> {
    method: &'a Method,
    full_name: String,
    method_ident: Ident,
    endpoint_fn: Ident,
    decode_fn: Ident,
    encode_fn: Ident,
    handler_fn: Ident,
    build_fn: Ident,
    handler_slot: Ident,
    input_type: Type,
    output_type: Type,
}

impl<'a> ServiceInfo<'a> {
    fn new(service: &'a Service) -> GeneratorResult<Self> {
        let methods = service
            .unary_methods()
            .map(|method| -> GeneratorResult<MethodInfo<'a>> {
                Ok(MethodInfo {
                    method,
                    full_name: method.full_name(service),
                    method_ident: method_ident(&method.name)?,
                    endpoint_fn: derived_ident("make", &method.name, "endpoint"),
                    decode_fn: derived_ident("decode", &method.name, "request"),
                    encode_fn: derived_ident("encode", &method.name, "response"),
                    handler_fn: derived_ident("make", &method.name, "handler"),
                    build_fn: derived_ident("build", &method.name, ""),
                    handler_slot: derived_ident("", &method.name, "handler"),
                    input_type: parse_type(&method.input_type)?,
                    output_type: parse_type(&method.output_type)?,
                })
            })
            .collect::<GeneratorResult<Vec<_>>>()?;

        Ok(Self {
            service,
            crate_name: get_crate_name(),
            trait_ident: service_ident(&service.name, "Server")?,
            server_ident: service_ident(&service.name, "")?,
            methods,
        })
    }
}

/// Emits the server side artifacts of a service in declaration order.
pub(crate) fn generate(service: &Service, features: Features) -> GeneratorResult<Vec<Artifact>> {
    let info = ServiceInfo::new(service)?;
    let mut artifacts = vec![service_trait(&info)?];

    for method in &info.methods {
        artifacts.push(request_adapter(&info, method)?);
        artifacts.push(codec(method)?);
        artifacts.push(handler_constructor(&info, method)?);
    }

    artifacts.push(server_type(&info, features)?);
    artifacts.push(setters(&info, features)?);
    artifacts.push(build(&info)?);
    let steps = pipeline::assemble(features);
    for method in &info.methods {
        artifacts.push(builder(&info, method, &steps)?);
    }
    artifacts.push(dispatch(&info)?);
    artifacts.push(registration(&info)?);

    Ok(artifacts)
}

fn method_artifact(
    kind: ArtifactKind,
    method: &MethodInfo,
    code: TokenStream,
) -> GeneratorResult<Artifact> {
    Ok(Artifact {
        kind,
        method: Some(method.method.proto_name.clone()),
        code: unparse(code)?,
    })
}

fn service_artifact(kind: ArtifactKind, code: TokenStream) -> GeneratorResult<Artifact> {
    Ok(Artifact {
        kind,
        method: None,
        code: unparse(code)?,
    })
}

fn service_trait(info: &ServiceInfo) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        service,
        crate_name,
        trait_ident,
        ..
    } = info;
    let docs = doc_comments(&service.comments);
    let methods = info.methods.iter().map(|method| {
        let MethodInfo {
            method_ident,
            input_type,
            output_type,
            ..
        } = method;
        let docs = doc_comments(&method.method.comments);
        quote! {
            #docs
            async fn #method_ident(
                &self,
                ctx: kit_endpoint::Context,
                request: #input_type,
            ) -> ::std::result::Result<#output_type, kit_endpoint::Error>;
        }
    });

    service_artifact(
        ArtifactKind::ServiceTrait,
        quote! {
            #docs
            #[#crate_name::async_trait]
            pub trait #trait_ident: Send + Sync + 'static {
                #(#methods)*
            }
        },
    )
}

fn request_adapter(info: &ServiceInfo, method: &MethodInfo) -> GeneratorResult<Artifact> {
    let trait_ident = &info.trait_ident;
    let MethodInfo {
        method_ident,
        endpoint_fn,
        input_type,
        ..
    } = method;

    method_artifact(
        ArtifactKind::RequestAdapter,
        method,
        quote! {
            fn #endpoint_fn<T: #trait_ident>(service: ::std::sync::Arc<T>) -> kit_endpoint::Endpoint {
                kit_endpoint::endpoint_fn(move |ctx: kit_endpoint::Context, request: kit_endpoint::Request| {
                    let service = service.clone();
                    async move {
                        let request = kit_endpoint::downcast::<#input_type>(request)?;
                        let response = service.#method_ident(ctx, request).await?;
                        ::std::result::Result::Ok(kit_endpoint::boxed(response))
                    }
                })
            }
        },
    )
}

fn codec(method: &MethodInfo) -> GeneratorResult<Artifact> {
    let MethodInfo {
        decode_fn,
        encode_fn,
        ..
    } = method;

    method_artifact(
        ArtifactKind::Codec,
        method,
        quote! {
            fn #decode_fn(
                _ctx: &kit_endpoint::Context,
                request: kit_endpoint::Request,
            ) -> ::std::result::Result<kit_endpoint::Request, kit_endpoint::Error> {
                ::std::result::Result::Ok(request)
            }

            fn #encode_fn(
                _ctx: &kit_endpoint::Context,
                response: kit_endpoint::Response,
            ) -> ::std::result::Result<kit_endpoint::Response, kit_endpoint::Error> {
                ::std::result::Result::Ok(response)
            }
        },
    )
}

fn handler_constructor(info: &ServiceInfo, method: &MethodInfo) -> GeneratorResult<Artifact> {
    let trait_ident = &info.trait_ident;
    let MethodInfo {
        endpoint_fn,
        decode_fn,
        encode_fn,
        handler_fn,
        ..
    } = method;

    method_artifact(
        ArtifactKind::HandlerConstructor,
        method,
        quote! {
            #[allow(dead_code)]
            pub fn #handler_fn<T: #trait_ident>(service: ::std::sync::Arc<T>) -> kit_transport::Server {
                kit_transport::Server::new(
                    #endpoint_fn(service),
                    #decode_fn,
                    #encode_fn,
                    ::std::vec::Vec::new(),
                )
            }
        },
    )
}

fn server_type(info: &ServiceInfo, features: Features) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        service,
        server_ident,
        ..
    } = info;
    let docs = doc_comments(&service.comments);
    let slots = info.methods.iter().map(|method| &method.handler_slot).collect::<Vec<_>>();
    let (tp_field, tp_init) = if features.telemetry {
        (
            Some(quote!(tp: ::std::option::Option<kit_telemetry::TracerProvider>,)),
            Some(quote!(tp: ::std::option::Option::None,)),
        )
    } else {
        (None, None)
    };

    service_artifact(
        ArtifactKind::ServerType,
        quote! {
            #docs
            #[allow(dead_code)]
            pub struct #server_ident<T> {
                service: ::std::sync::Arc<T>,
                options: ::std::vec::Vec<kit_transport::OptionFactory>,
                middlewares: ::std::vec::Vec<kit_endpoint::Middleware>,
                tracer: ::std::option::Option<kit_tracing::Tracer>,
                #tp_field
                logger: kit_log::Logger,
                #(#slots: ::std::option::Option<kit_transport::Server>,)*
            }

            impl<T> #server_ident<T> {
                pub fn new(service: T, logger: kit_log::Logger) -> Self {
                    Self {
                        service: ::std::sync::Arc::new(service),
                        options: ::std::vec::Vec::new(),
                        middlewares: ::std::vec::Vec::new(),
                        tracer: ::std::option::Option::None,
                        #tp_init
                        logger,
                        #(#slots: ::std::option::Option::None,)*
                    }
                }
            }
        },
    )
}

fn setters(info: &ServiceInfo, features: Features) -> GeneratorResult<Artifact> {
    let server_ident = &info.server_ident;
    let with_tracer_provider = features.telemetry.then(|| {
        quote! {
            pub fn with_tracer_provider(&mut self, tp: kit_telemetry::TracerProvider) {
                self.tp = ::std::option::Option::Some(tp);
            }
        }
    });

    service_artifact(
        ArtifactKind::Setters,
        quote! {
            impl<T> #server_ident<T> {
                pub fn with_options(&mut self, options: ::std::vec::Vec<kit_transport::OptionFactory>) {
                    self.options = options;
                }

                pub fn with_middlewares(&mut self, middlewares: ::std::vec::Vec<kit_endpoint::Middleware>) {
                    self.middlewares = middlewares;
                }

                pub fn with_tracing(&mut self, tracer: kit_tracing::Tracer) {
                    self.tracer = ::std::option::Option::Some(tracer);
                }

                #with_tracer_provider
            }
        },
    )
}

fn build(info: &ServiceInfo) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        trait_ident,
        server_ident,
        ..
    } = info;
    let builders = info.methods.iter().map(|method| &method.build_fn);

    service_artifact(
        ArtifactKind::Build,
        quote! {
            impl<T: #trait_ident> #server_ident<T> {
                pub fn build(&mut self) {
                    #(self.#builders();)*
                }
            }
        },
    )
}

fn builder(
    info: &ServiceInfo,
    method: &MethodInfo,
    steps: &[pipeline::PipelineStep],
) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        trait_ident,
        server_ident,
        ..
    } = info;
    let MethodInfo {
        full_name,
        endpoint_fn,
        decode_fn,
        encode_fn,
        build_fn,
        handler_slot,
        ..
    } = method;
    let pipeline = pipeline::render(steps, full_name);

    method_artifact(
        ArtifactKind::Builder,
        method,
        quote! {
            impl<T: #trait_ident> #server_ident<T> {
                fn #build_fn(&mut self) {
                    let mut endpoint = #endpoint_fn(self.service.clone());
                    let mut ops: ::std::vec::Vec<kit_transport::ServerOption> = ::std::vec::Vec::new();
                    #pipeline
                    self.#handler_slot = ::std::option::Option::Some(kit_transport::Server::new(
                        endpoint,
                        #decode_fn,
                        #encode_fn,
                        ops,
                    ));
                }
            }
        },
    )
}

fn dispatch(info: &ServiceInfo) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        crate_name,
        trait_ident,
        server_ident,
        ..
    } = info;
    let methods = info.methods.iter().map(|method| {
        let MethodInfo {
            full_name,
            method_ident,
            handler_slot,
            input_type,
            output_type,
            ..
        } = method;
        quote! {
            async fn #method_ident(
                &self,
                ctx: kit_endpoint::Context,
                request: #input_type,
            ) -> ::std::result::Result<#output_type, kit_endpoint::Error> {
                let handler = self
                    .#handler_slot
                    .as_ref()
                    .ok_or_else(|| kit_endpoint::Error::unbuilt(#full_name))?;
                let response = handler.serve(ctx, kit_endpoint::boxed(request)).await?;
                kit_endpoint::downcast::<#output_type>(response)
            }
        }
    });

    service_artifact(
        ArtifactKind::Dispatch,
        quote! {
            #[#crate_name::async_trait]
            impl<T: #trait_ident> #trait_ident for #server_ident<T> {
                #(#methods)*
            }
        },
    )
}

fn registration(info: &ServiceInfo) -> GeneratorResult<Artifact> {
    let ServiceInfo {
        service,
        trait_ident,
        server_ident,
        ..
    } = info;
    let service_name = service.full_name();

    service_artifact(
        ArtifactKind::Registration,
        quote! {
            impl<T: #trait_ident> #server_ident<T> {
                pub fn register_service(self, registry: &mut kit_transport::Registry) {
                    registry.register(#service_name, self);
                }
            }
        },
    )
}

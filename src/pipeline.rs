//! Assembly of the per-method request pipeline.
//!
//! The base endpoint returned by the request adapter is wrapped by a fixed
//! sequence of steps. Tracing comes first so that middlewares observe the
//! extracted trace context, telemetry comes after the middlewares so that
//! its timings include them, and option factories only contribute transport
//! options.

use proc_macro2::TokenStream;
use quote::quote;

use crate::config::Features;

/// One step of a method pipeline, applied in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Wrap with a named tracing span and extract the trace context from
    /// inbound calls, when a tracer is configured at runtime.
    TraceWrap,
    /// Apply the configured middlewares from first to last.
    MiddlewareWrap,
    /// Extract the telemetry context from inbound calls and wrap with a
    /// telemetry span.
    TelemetryWrap,
    /// Add one transport option per configured option factory.
    OptionAppend,
}

/// Returns the steps wrapping the base endpoint of every method.
pub fn assemble(features: Features) -> Vec<PipelineStep> {
    let mut steps = vec![PipelineStep::TraceWrap, PipelineStep::MiddlewareWrap];
    if features.telemetry {
        steps.push(PipelineStep::TelemetryWrap);
    }
    steps.push(PipelineStep::OptionAppend);
    steps
}

impl PipelineStep {
    /// Statements of this step inside a generated `build_*` method, which
    /// owns the mutable locals `endpoint` and `ops`.
    fn render(self, full_name: &str) -> TokenStream {
        match self {
            PipelineStep::TraceWrap => quote! {
                if let ::std::option::Option::Some(tracer) = &self.tracer {
                    endpoint = kit_tracing::trace_server(tracer.clone(), #full_name)(endpoint);
                    ops.push(kit_transport::server_before(kit_tracing::grpc_to_context(
                        tracer.clone(),
                        #full_name,
                        self.logger.clone(),
                    )));
                }
            },
            PipelineStep::MiddlewareWrap => quote! {
                for middleware in &self.middlewares {
                    endpoint = middleware(endpoint);
                }
            },
            PipelineStep::TelemetryWrap => quote! {
                ops.push(kit_transport::server_before(kit_telemetry::grpc_to_context(
                    self.tp.clone(),
                    #full_name,
                    self.logger.clone(),
                )));
                endpoint = kit_telemetry::endpoint_middleware(#full_name)(endpoint);
            },
            PipelineStep::OptionAppend => quote! {
                for option in &self.options {
                    ops.push(option(#full_name));
                }
            },
        }
    }
}

/// Folds the steps into the statements applied to the base endpoint.
pub(crate) fn render(steps: &[PipelineStep], full_name: &str) -> TokenStream {
    steps.iter().fold(TokenStream::new(), |mut body, step| {
        body.extend(step.render(full_name));
        body
    })
}

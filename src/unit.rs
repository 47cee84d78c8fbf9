//! Assembly of one generated unit per schema file.

use prost_types::compiler::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use quote::quote;

use crate::{
    client,
    config::Features,
    error::{GeneratorError, GeneratorResult},
    model::ProtoFile,
    server,
    utils::{get_crate_name, unparse},
};

/// Marker line every generated unit starts with.
pub const GENERATED_MARKER: &str = "// Code generated by protoc-gen-poem-kit. DO NOT EDIT.";

/// The kind of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The trait implemented by the service.
    ServiceTrait,
    /// Function narrowing an untyped request and calling the implementation.
    RequestAdapter,
    /// Pass-through request decoder and response encoder.
    Codec,
    /// Function building a transport handler without any options.
    HandlerConstructor,
    /// The server type and its constructor.
    ServerType,
    /// Setters of the server type.
    Setters,
    /// The `build` method calling every per-method builder.
    Build,
    /// A per-method pipeline builder.
    Builder,
    /// Implementation of the service trait through the built handlers.
    Dispatch,
    /// Registration of the server type into a transport registry.
    Registration,
    /// Pass-through client request encoder and response decoder.
    ClientCodec,
    /// The client type.
    Client,
}

/// One generated fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// What the fragment declares.
    pub kind: ArtifactKind,
    /// Schema name of the method, for per-method artifacts.
    pub method: Option<String>,
    /// Formatted Rust source.
    pub code: String,
}

/// The artifacts generated for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBlock {
    /// Fully-qualified schema name of the service.
    pub service: String,
    /// Server artifacts, empty unless the server is generated.
    pub server: Vec<Artifact>,
    /// Client artifacts, empty unless the client is generated.
    pub client: Vec<Artifact>,
}

impl ServiceBlock {
    /// Server artifacts followed by client artifacts.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.server.iter().chain(&self.client)
    }
}

/// The complete output for one schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// File name of the unit, see [`ProtoFile::generated_file_name`].
    pub name: String,
    /// Do-not-edit banner and version marker.
    pub header: String,
    /// Module imports used by the artifacts.
    pub imports: String,
    /// One block per service, in declaration order.
    pub services: Vec<ServiceBlock>,
}

impl GeneratedUnit {
    /// The source text of the unit.
    pub fn content(&self) -> String {
        let mut content = String::new();
        content.push_str(&self.header);
        content.push('\n');
        content.push_str(&self.imports);
        for artifact in self.services.iter().flat_map(|block| block.artifacts()) {
            content.push('\n');
            content.push_str(&artifact.code);
        }
        content
    }

    /// All artifacts of a kind, across services.
    pub fn artifacts_of(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.services
            .iter()
            .flat_map(|block| block.artifacts())
            .filter(move |artifact| artifact.kind == kind)
    }
}

/// Generates the unit of a schema file.
pub fn generate(file: &ProtoFile, features: Features) -> GeneratorResult<GeneratedUnit> {
    let mut services = Vec::with_capacity(file.services.len());

    for service in &file.services {
        let server = if features.server {
            server::generate(service, features)?
        } else {
            Vec::new()
        };
        let client = if features.client {
            client::generate(service)?
        } else {
            Vec::new()
        };
        services.push(ServiceBlock {
            service: service.full_name(),
            server,
            client,
        });
    }

    let unit = GeneratedUnit {
        name: file.generated_file_name(),
        header: header(),
        imports: imports(features)?,
        services,
    };
    tracing::info!(
        file = %file.name,
        unit = %unit.name,
        services = unit.services.len(),
        "generated endpoint unit"
    );
    Ok(unit)
}

/// Answers a `protoc` plugin request.
///
/// Failures are reported through [`CodeGeneratorResponse::error`] so that
/// `protoc` prints them, the plugin itself always succeeds.
pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match generate_files(request) {
        Ok(file) => CodeGeneratorResponse {
            supported_features: Some(code_generator_response::Feature::Proto3Optional as u64),
            file,
            ..Default::default()
        },
        Err(err) => {
            tracing::error!(error = %err, "generation failed");
            CodeGeneratorResponse {
                error: Some(err.to_string()),
                ..Default::default()
            }
        }
    }
}

fn generate_files(
    request: &CodeGeneratorRequest,
) -> GeneratorResult<Vec<code_generator_response::File>> {
    let features = Features::from_parameter(request.parameter())?;
    tracing::debug!(?features, "parsed plugin parameter");

    request
        .file_to_generate
        .iter()
        .map(|name| -> GeneratorResult<code_generator_response::File> {
            let descriptor = request
                .proto_file
                .iter()
                .find(|file| file.name() == name.as_str())
                .ok_or_else(|| GeneratorError::Plugin(format!("missing descriptor of `{name}`")))?;
            let unit = generate(&ProtoFile::from_descriptor(descriptor)?, features)?;
            Ok(code_generator_response::File {
                name: Some(unit.name.clone()),
                content: Some(unit.content()),
                ..Default::default()
            })
        })
        .collect()
}

fn header() -> String {
    format!(
        "{GENERATED_MARKER}\n// versions:\n// protoc-gen-poem-kit {}\n// @generated\n",
        env!("CARGO_PKG_VERSION")
    )
}

fn imports(features: Features) -> GeneratorResult<String> {
    let crate_name = get_crate_name();
    let telemetry = features.telemetry.then(|| {
        quote! {
            #[allow(unused_imports)]
            use #crate_name::telemetry as kit_telemetry;
        }
    });
    let client = features.client.then(|| {
        quote! {
            #[allow(unused_imports)]
            use #crate_name::client as kit_client;
        }
    });

    unparse(quote! {
        #[allow(unused_imports)]
        use #crate_name::{
            endpoint as kit_endpoint, log as kit_log, tracing as kit_tracing,
            transport as kit_transport,
        };
        #telemetry
        #client
    })
}

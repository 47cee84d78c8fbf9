//! The service model consumed by the generator.
//!
//! Values are produced by a schema front end (`prost-build` or the protoc
//! plugin) and only ever borrowed by the emitters.

/// A schema file, or a package when driven through `prost-build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoFile {
    /// File name as passed to `protoc`, e.g. `helloworld/greeter.proto`.
    pub name: String,
    /// Protobuf package, may be empty.
    pub package: String,
    /// Services declared in the file, in declaration order.
    pub services: Vec<Service>,
}

impl ProtoFile {
    /// Name of the unit generated for this file: the file name without its
    /// `.proto` extension, followed by `_endpoints.rs`.
    pub fn generated_file_name(&self) -> String {
        let prefix = self.name.strip_suffix(".proto").unwrap_or(&self.name);
        format!("{prefix}_endpoints.rs")
    }
}

/// A service declared in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Rust identifier of the service (`UpperCamelCase`).
    pub name: String,
    /// Name as written in the schema.
    pub proto_name: String,
    /// Protobuf package the service belongs to.
    pub package: String,
    /// Leading doc comment lines.
    pub comments: Vec<String>,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
}

impl Service {
    /// Fully-qualified schema name, e.g. `helloworld.Greeter`.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.proto_name.clone()
        } else {
            format!("{}.{}", self.package, self.proto_name)
        }
    }

    /// Methods that take part in generation.
    pub fn unary_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|method| {
            if !method.is_unary() {
                tracing::debug!(
                    service = %self.full_name(),
                    method = %method.proto_name,
                    "skipping streaming method"
                );
            }
            method.is_unary()
        })
    }
}

/// A remote call declared by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Rust identifier (`snake_case`, possibly a raw identifier).
    pub name: String,
    /// Name as written in the schema.
    pub proto_name: String,
    /// Leading doc comment lines.
    pub comments: Vec<String>,
    /// Rust path of the request message, relative to the package module.
    pub input_type: String,
    /// Rust path of the response message, relative to the package module.
    pub output_type: String,
    /// The client sends a stream of requests.
    pub client_streaming: bool,
    /// The server replies with a stream of responses.
    pub server_streaming: bool,
}

impl Method {
    /// Only unary methods are generated, streaming ones are skipped.
    pub fn is_unary(&self) -> bool {
        !self.client_streaming && !self.server_streaming
    }

    /// Fully-qualified name used to tag spans and options, e.g.
    /// `helloworld.Greeter.SayHello`.
    pub fn full_name(&self, service: &Service) -> String {
        format!("{}.{}", service.full_name(), self.proto_name)
    }

    /// The gRPC route of the method, e.g. `/helloworld.Greeter/SayHello`.
    pub fn route(&self, service: &Service) -> String {
        format!("/{}/{}", service.full_name(), self.proto_name)
    }
}

impl From<prost_build::Service> for Service {
    fn from(service: prost_build::Service) -> Self {
        Self {
            name: service.name,
            proto_name: service.proto_name,
            package: service.package,
            comments: service.comments.leading,
            methods: service.methods.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<prost_build::Method> for Method {
    fn from(method: prost_build::Method) -> Self {
        Self {
            name: method.name,
            proto_name: method.proto_name,
            comments: method.comments.leading,
            input_type: method.input_type,
            output_type: method.output_type,
            client_streaming: method.client_streaming,
            server_streaming: method.server_streaming,
        }
    }
}

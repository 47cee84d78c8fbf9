//! Conversion of `protoc` file descriptors into the service model, naming
//! Rust identifiers and message paths the way `prost-build` does.

use inflector::cases::{pascalcase::to_pascal_case, snakecase::to_snake_case};
use prost_types::{FileDescriptorProto, MethodDescriptorProto, ServiceDescriptorProto};

use crate::{
    error::{GeneratorError, GeneratorResult},
    model::{Method, ProtoFile, Service},
};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

impl ProtoFile {
    /// Builds the model of a file received from `protoc`.
    pub fn from_descriptor(file: &FileDescriptorProto) -> GeneratorResult<Self> {
        let name = file
            .name
            .clone()
            .ok_or_else(|| GeneratorError::Plugin("file descriptor without a name".to_string()))?;
        let package = file.package().to_string();
        let services = file
            .service
            .iter()
            .map(|service| convert_service(&package, service))
            .collect::<GeneratorResult<Vec<_>>>()?;

        Ok(Self {
            name,
            package,
            services,
        })
    }
}

fn convert_service(package: &str, service: &ServiceDescriptorProto) -> GeneratorResult<Service> {
    let proto_name = service.name().to_string();
    if proto_name.is_empty() {
        return Err(GeneratorError::Plugin(format!(
            "service without a name in package `{package}`"
        )));
    }
    let name = to_upper_camel(&proto_name);
    if name.is_empty() {
        return Err(GeneratorError::Plugin(format!(
            "service `{proto_name}` has no identifier characters"
        )));
    }
    let methods = service
        .method
        .iter()
        .map(|method| convert_method(package, method))
        .collect::<GeneratorResult<Vec<_>>>()?;

    Ok(Service {
        name,
        proto_name,
        package: package.to_string(),
        comments: Vec::new(),
        methods,
    })
}

fn convert_method(package: &str, method: &MethodDescriptorProto) -> GeneratorResult<Method> {
    let proto_name = method.name().to_string();
    if proto_name.is_empty() {
        return Err(GeneratorError::Plugin(format!(
            "method without a name in package `{package}`"
        )));
    }

    Ok(Method {
        name: to_snake(&proto_name),
        proto_name,
        comments: Vec::new(),
        input_type: resolve_type(package, method.input_type()),
        output_type: resolve_type(package, method.output_type()),
        client_streaming: method.client_streaming(),
        server_streaming: method.server_streaming(),
    })
}

/// `UpperCamelCase` identifier of a schema name.
fn to_upper_camel(name: &str) -> String {
    let ident = to_pascal_case(name);
    if ident == "Self" {
        format!("{ident}_")
    } else {
        ident
    }
}

/// `snake_case` identifier of a schema name, escaped when it is a keyword.
fn to_snake(name: &str) -> String {
    let ident = to_snake_case(name);
    match ident.as_str() {
        "self" | "super" | "crate" => format!("{ident}_"),
        _ if KEYWORDS.contains(&ident.as_str()) => format!("r#{ident}"),
        _ => ident,
    }
}

/// Rust path of a fully-qualified message name, relative to the module of
/// `package`.
fn resolve_type(package: &str, proto_type: &str) -> String {
    match proto_type {
        ".google.protobuf.Empty" => return "()".to_string(),
        ty if ty.starts_with(".google.protobuf.") => {
            return format!("::prost_types::{}", &ty[".google.protobuf.".len()..]);
        }
        _ => {}
    }

    let mut local_path = package.split('.').filter(|s| !s.is_empty()).peekable();
    let mut ident_path = proto_type.trim_start_matches('.').split('.');
    let ident_type = ident_path.next_back().unwrap_or_default();
    let mut ident_path = ident_path.peekable();

    while local_path.peek().is_some() && local_path.peek() == ident_path.peek() {
        local_path.next();
        ident_path.next();
    }

    local_path
        .map(|_| "super".to_string())
        .chain(ident_path.map(to_snake))
        .chain(std::iter::once(to_upper_camel(ident_type)))
        .collect::<Vec<_>>()
        .join("::")
}

use poem_kit_build::{
    generate, unit::GENERATED_MARKER, ArtifactKind, Features, GeneratedUnit, Method, ProtoFile,
    Service,
};

fn method(name: &str, proto_name: &str, input: &str, output: &str) -> Method {
    Method {
        name: name.to_string(),
        proto_name: proto_name.to_string(),
        comments: Vec::new(),
        input_type: input.to_string(),
        output_type: output.to_string(),
        client_streaming: false,
        server_streaming: false,
    }
}

fn greeter() -> Service {
    Service {
        name: "Greeter".to_string(),
        proto_name: "Greeter".to_string(),
        package: "helloworld".to_string(),
        comments: vec![" The greeting service.".to_string()],
        methods: vec![method("say_hello", "SayHello", "HelloRequest", "HelloReply")],
    }
}

fn file(services: Vec<Service>) -> ProtoFile {
    ProtoFile {
        name: "helloworld.proto".to_string(),
        package: "helloworld".to_string(),
        services,
    }
}

fn function_names(unit: &GeneratedUnit) -> Vec<String> {
    let file = syn::parse_file(&unit.content()).unwrap();
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Fn(item) => Some(item.sig.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn struct_names(unit: &GeneratedUnit) -> Vec<String> {
    let file = syn::parse_file(&unit.content()).unwrap();
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Struct(item) => Some(item.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn builder_of<'a>(unit: &'a GeneratedUnit, method: &str) -> &'a str {
    &unit
        .artifacts_of(ArtifactKind::Builder)
        .find(|artifact| artifact.method.as_deref() == Some(method))
        .unwrap()
        .code
}

fn assert_in_order(text: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match text[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("`{needle}` not found in order in:\n{text}"),
        }
    }
}

#[test]
fn one_artifact_set_per_unary_method() {
    let mut service = greeter();
    service
        .methods
        .push(method("say_goodbye", "SayGoodbye", "GoodbyeRequest", "GoodbyeReply"));
    let unit = generate(&file(vec![service]), Features::default()).unwrap();
    let functions = function_names(&unit);

    for name in ["say_hello", "say_goodbye"] {
        for function in [
            format!("make_{name}_endpoint"),
            format!("decode_{name}_request"),
            format!("encode_{name}_response"),
            format!("make_{name}_handler"),
        ] {
            assert_eq!(
                functions.iter().filter(|f| **f == function).count(),
                1,
                "{function}"
            );
        }
    }
    assert_eq!(struct_names(&unit), vec!["Greeter"]);
}

#[test]
fn streaming_methods_are_never_referenced() {
    let mut service = greeter();
    service.methods.push(Method {
        server_streaming: true,
        ..method("list_features", "ListFeatures", "Rectangle", "Feature")
    });
    service.methods.push(Method {
        client_streaming: true,
        ..method("record_route", "RecordRoute", "Point", "RouteSummary")
    });
    service.methods.push(Method {
        client_streaming: true,
        server_streaming: true,
        ..method("route_chat", "RouteChat", "RouteNote", "RouteNote")
    });

    let features = Features {
        server: true,
        client: true,
        telemetry: true,
    };
    let unit = generate(&file(vec![service]), features).unwrap();
    let content = unit.content();
    for needle in [
        "list_features",
        "ListFeatures",
        "Rectangle",
        "record_route",
        "RecordRoute",
        "RouteSummary",
        "route_chat",
        "RouteChat",
        "RouteNote",
    ] {
        assert!(!content.contains(needle), "{needle}");
    }
    assert!(unit
        .services
        .iter()
        .flat_map(|block| block.artifacts())
        .all(|artifact| artifact.method.is_none()
            || artifact.method.as_deref() == Some("SayHello")));
}

#[test]
fn generation_is_idempotent() {
    let features = Features {
        server: true,
        client: true,
        telemetry: true,
    };
    let input = file(vec![greeter()]);
    let first = generate(&input, features).unwrap();
    let second = generate(&input, features).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.content(), second.content());
}

#[test]
fn pipeline_nesting_order() {
    let features = Features {
        telemetry: true,
        ..Features::default()
    };
    let unit = generate(&file(vec![greeter()]), features).unwrap();
    assert_in_order(
        builder_of(&unit, "SayHello"),
        &[
            "let mut endpoint = make_say_hello_endpoint(self.service.clone());",
            "kit_tracing::trace_server(",
            "\"helloworld.Greeter.SayHello\"",
            "kit_tracing::grpc_to_context",
            "for middleware in &self.middlewares {",
            "endpoint = middleware(endpoint);",
            "kit_telemetry::grpc_to_context",
            "kit_telemetry::endpoint_middleware(",
            "\"helloworld.Greeter.SayHello\"",
            "for option in &self.options {",
            "ops.push(option(\"helloworld.Greeter.SayHello\"));",
            "self.say_hello_handler",
            "kit_transport::Server::new(",
            "decode_say_hello_request",
            "encode_say_hello_response",
        ],
    );
}

#[test]
fn client_does_not_change_server_artifacts() {
    let input = file(vec![greeter()]);
    for telemetry in [false, true] {
        let without = generate(
            &input,
            Features {
                server: true,
                client: false,
                telemetry,
            },
        )
        .unwrap();
        let with = generate(
            &input,
            Features {
                server: true,
                client: true,
                telemetry,
            },
        )
        .unwrap();
        assert_eq!(without.services[0].server, with.services[0].server);
        assert!(without.services[0].client.is_empty());
        assert!(!with.services[0].client.is_empty());
    }
}

#[test]
fn server_does_not_change_client_artifacts() {
    let input = file(vec![greeter()]);
    let client_only = generate(
        &input,
        Features {
            server: false,
            client: true,
            telemetry: false,
        },
    )
    .unwrap();
    let both = generate(
        &input,
        Features {
            server: true,
            client: true,
            telemetry: false,
        },
    )
    .unwrap();
    assert_eq!(client_only.services[0].client, both.services[0].client);
    assert!(client_only.services[0].server.is_empty());
}

#[test]
fn greeter_with_defaults() {
    let unit = generate(&file(vec![greeter()]), Features::default()).unwrap();
    assert_eq!(unit.name, "helloworld_endpoints.rs");
    assert!(unit.content().starts_with(GENERATED_MARKER));

    let functions = function_names(&unit);
    for function in [
        "make_say_hello_endpoint",
        "decode_say_hello_request",
        "encode_say_hello_response",
        "make_say_hello_handler",
    ] {
        assert!(functions.iter().any(|f| f == function), "{function}");
    }

    let server_type = &unit.artifacts_of(ArtifactKind::ServerType).next().unwrap().code;
    assert!(server_type.contains("pub struct Greeter<T> {"));
    assert!(server_type.contains(
        "say_hello_handler: ::std::option::Option<kit_transport::Server>,"
    ));
    assert!(server_type.contains("/// The greeting service."));

    let builder = builder_of(&unit, "SayHello");
    assert!(builder.contains("fn build_say_hello(&mut self)"));
    assert!(builder.contains("kit_tracing::trace_server"));
    assert!(!builder.contains("kit_telemetry"));

    let build = &unit.artifacts_of(ArtifactKind::Build).next().unwrap().code;
    assert!(build.contains("self.build_say_hello();"));

    let registration = &unit.artifacts_of(ArtifactKind::Registration).next().unwrap().code;
    assert!(registration.contains("registry.register(\"helloworld.Greeter\", self);"));

    assert_eq!(unit.artifacts_of(ArtifactKind::Client).count(), 0);
}

#[test]
fn greeter_with_telemetry() {
    let features = Features {
        server: true,
        client: false,
        telemetry: true,
    };
    let unit = generate(&file(vec![greeter()]), features).unwrap();
    assert!(unit.imports.contains("kit_telemetry"));

    let builder = builder_of(&unit, "SayHello");
    assert_in_order(
        builder,
        &[
            "endpoint = middleware(endpoint);",
            "ops.push(",
            "kit_telemetry::grpc_to_context",
            "kit_telemetry::endpoint_middleware(",
        ],
    );

    let setters = &unit.artifacts_of(ArtifactKind::Setters).next().unwrap().code;
    assert_in_order(
        setters,
        &[
            "pub fn with_options(",
            "pub fn with_middlewares(",
            "pub fn with_tracing(",
            "pub fn with_tracer_provider(",
        ],
    );
}

#[test]
fn no_output_enabled() {
    let features = Features {
        server: false,
        client: false,
        telemetry: false,
    };
    let unit = generate(&file(vec![greeter()]), features).unwrap();
    assert!(function_names(&unit).is_empty());
    assert!(struct_names(&unit).is_empty());
    assert!(unit.content().starts_with(GENERATED_MARKER));
}

#[test]
fn services_keep_declaration_order() {
    let echo = Service {
        name: "Echo".to_string(),
        proto_name: "Echo".to_string(),
        package: "helloworld".to_string(),
        comments: Vec::new(),
        methods: vec![method("echo", "Echo", "EchoRequest", "EchoReply")],
    };
    let unit = generate(&file(vec![greeter(), echo]), Features::default()).unwrap();
    assert_eq!(
        unit.services
            .iter()
            .map(|block| block.service.as_str())
            .collect::<Vec<_>>(),
        vec!["helloworld.Greeter", "helloworld.Echo"]
    );
    assert_eq!(struct_names(&unit), vec!["Greeter", "Echo"]);
}

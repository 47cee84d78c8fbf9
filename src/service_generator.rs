use std::{cell::RefCell, rc::Rc};

use prost_build::{Service, ServiceGenerator};

use crate::model::ProtoFile;

/// Collects the services handed over by `prost-build`, one [`ProtoFile`] per
/// package. Units are generated and written once `prost-build` is done, so
/// that failures can be reported to the caller.
pub(crate) struct KitServiceGenerator {
    files: Rc<RefCell<Vec<ProtoFile>>>,
}

impl KitServiceGenerator {
    pub(crate) fn new(files: Rc<RefCell<Vec<ProtoFile>>>) -> Self {
        Self { files }
    }
}

impl ServiceGenerator for KitServiceGenerator {
    fn generate(&mut self, service: Service, _buf: &mut String) {
        let mut files = self.files.borrow_mut();
        let service = crate::model::Service::from(service);
        match files.iter_mut().find(|file| file.package == service.package) {
            Some(file) => file.services.push(service),
            None => files.push(ProtoFile {
                name: package_file_name(&service.package),
                package: service.package.clone(),
                services: vec![service],
            }),
        }
    }

    fn finalize_package(&mut self, package: &str, buf: &mut String) {
        let files = self.files.borrow();
        if let Some(file) = files.iter().find(|file| file.package == package) {
            buf.push_str(&format!("include!(\"{}\");\n", file.generated_file_name()));
        }
    }
}

/// `prost-build` names the module of the empty package `_`.
fn package_file_name(package: &str) -> String {
    if package.is_empty() {
        "_".to_string()
    } else {
        package.to_string()
    }
}

#[cfg(test)]
mod tests {
    use prost_build::{Comments, Method};

    use super::*;

    fn service(package: &str, name: &str) -> Service {
        Service {
            name: name.to_string(),
            proto_name: name.to_string(),
            package: package.to_string(),
            comments: Comments::default(),
            methods: vec![Method {
                name: "say_hello".to_string(),
                proto_name: "SayHello".to_string(),
                comments: Comments::default(),
                input_type: "HelloRequest".to_string(),
                output_type: "HelloReply".to_string(),
                input_proto_type: ".helloworld.HelloRequest".to_string(),
                output_proto_type: ".helloworld.HelloReply".to_string(),
                options: Default::default(),
                client_streaming: false,
                server_streaming: false,
            }],
            options: Default::default(),
        }
    }

    #[test]
    fn groups_services_by_package() {
        let files = Rc::new(RefCell::new(Vec::new()));
        let mut generator = KitServiceGenerator::new(files.clone());
        let mut buf = String::new();
        generator.generate(service("helloworld", "Greeter"), &mut buf);
        generator.generate(service("", "Echo"), &mut buf);
        generator.generate(service("helloworld", "Farewell"), &mut buf);
        assert!(buf.is_empty());

        let files = files.borrow();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "helloworld");
        assert_eq!(files[0].services.len(), 2);
        assert_eq!(files[1].generated_file_name(), "__endpoints.rs");
    }

    #[test]
    fn includes_unit_from_package_module() {
        let files = Rc::new(RefCell::new(Vec::new()));
        let mut generator = KitServiceGenerator::new(files);
        generator.generate(service("helloworld", "Greeter"), &mut String::new());

        let mut buf = String::new();
        generator.finalize_package("helloworld", &mut buf);
        assert_eq!(buf, "include!(\"helloworld_endpoints.rs\");\n");

        let mut buf = String::new();
        generator.finalize_package("other", &mut buf);
        assert!(buf.is_empty());
    }
}

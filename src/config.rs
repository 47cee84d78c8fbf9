use std::{
    cell::RefCell,
    env, fs,
    io::Result,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    error::{GeneratorError, GeneratorResult},
    model::ProtoFile,
    service_generator::KitServiceGenerator,
    unit,
};

/// Switches selecting which artifacts are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Generate the endpoint server, enabled by default.
    pub server: bool,
    /// Generate the client, disabled by default.
    pub client: bool,
    /// Generate telemetry instrumentation, disabled by default.
    pub telemetry: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            server: true,
            client: false,
            telemetry: false,
        }
    }
}

impl Features {
    /// Parses a protoc plugin parameter such as
    /// `server=true,client=1,telemetry`.
    ///
    /// A key without a value enables the switch. `OpenTelemetry` is accepted
    /// as an alias of `telemetry`.
    pub fn from_parameter(parameter: &str) -> GeneratorResult<Self> {
        let mut features = Self::default();

        for item in parameter.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((key, value)) => (key.trim(), parse_bool(value.trim())),
                None => (item, Some(true)),
            };
            let value = value.ok_or_else(|| GeneratorError::Parameter(item.to_string()))?;
            match key {
                "server" => features.server = value,
                "client" => features.client = value,
                "telemetry" | "OpenTelemetry" => features.telemetry = value,
                _ => return Err(GeneratorError::Parameter(item.to_string())),
            }
        }

        Ok(features)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Configuration options for endpoint code generation.
#[derive(Debug)]
pub struct Config {
    prost_config: prost_build::Config,
    features: Features,
    out_dir: Option<PathBuf>,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Self {
        Self {
            prost_config: prost_build::Config::default(),
            features: Features::default(),
            out_dir: None,
        }
    }

    /// Configures the output directory where generated Rust files will be
    /// written.
    ///
    /// Defaults to the `OUT_DIR` environment variable set by Cargo for build
    /// scripts.
    pub fn out_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        let path = path.into();
        self.prost_config.out_dir(path.clone());
        self.out_dir = Some(path);
        self
    }

    /// Add an attribute to the matched messages, enums and one-ofs.
    ///
    /// ```rust
    /// # let config = poem_kit_build::Config::new();
    /// config.type_attribute(".", "#[derive(Eq)]");
    /// ```
    pub fn type_attribute(mut self, path: impl AsRef<str>, attribute: impl AsRef<str>) -> Self {
        self.prost_config.type_attribute(path, attribute);
        self
    }

    /// Add an attribute to the matched fields.
    ///
    /// ```rust
    /// # let config = poem_kit_build::Config::new();
    /// config.field_attribute("in", "#[serde(rename = \"in\")]");
    /// ```
    pub fn field_attribute(mut self, path: impl AsRef<str>, attribute: impl AsRef<str>) -> Self {
        self.prost_config.field_attribute(path, attribute);
        self
    }

    /// When set, the `FileDescriptorSet` generated by `protoc` is written to
    /// the provided path.
    pub fn file_descriptor_set_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prost_config.file_descriptor_set_path(path);
        self
    }

    /// Enable or disable endpoint server code generation.
    pub fn build_server(mut self, enable: bool) -> Self {
        self.features.server = enable;
        self
    }

    /// Enable or disable client code generation.
    pub fn build_client(mut self, enable: bool) -> Self {
        self.features.client = enable;
        self
    }

    /// Enable or disable telemetry instrumentation in the generated servers.
    pub fn build_telemetry(mut self, enable: bool) -> Self {
        self.features.telemetry = enable;
        self
    }

    /// Compile .proto files into Rust files during a Cargo build.
    ///
    /// Messages are generated by `prost-build`. Endpoint code for each
    /// package is written next to them as `<package>_endpoints.rs` and
    /// included from the package module.
    pub fn compile(
        mut self,
        protos: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
    ) -> Result<()> {
        let out_dir = match self.out_dir.take() {
            Some(out_dir) => out_dir,
            None => env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(GeneratorError::MissingOutDir)?,
        };
        let files = Rc::new(RefCell::new(Vec::new()));

        self.prost_config
            .service_generator(Box::new(KitServiceGenerator::new(files.clone())))
            .compile_protos(protos, includes)?;

        for file in files.borrow().iter() {
            write_unit(&out_dir, file, self.features)?;
        }
        Ok(())
    }
}

fn write_unit(out_dir: &Path, file: &ProtoFile, features: Features) -> GeneratorResult<()> {
    let unit = unit::generate(file, features)?;
    let path = out_dir.join(&unit.name);
    fs::write(&path, unit.content())?;
    tracing::debug!(path = %path.display(), "wrote endpoint unit");
    Ok(())
}

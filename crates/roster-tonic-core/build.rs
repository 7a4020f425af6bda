/// Builds the gRPC client and server code for `proto/roster.proto` using
/// `tonic-prost-build`.
///
/// A file descriptor set is written next to the generated code so the server
/// can expose gRPC reflection. Generated code is accessible via:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("roster");
/// }
/// ```
///
/// # Panics
///
/// Panics if code generation fails (for example when `protoc` is missing).
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("roster_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/roster.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/roster.proto"], &["proto"])
        .unwrap();
}

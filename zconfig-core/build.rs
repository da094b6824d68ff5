use std::error::Error;
use std::path::Path;

// The generated bindings in src/proto are checked in. Set ZCONFIG_REGEN_PROTO=1
// (with protoc on PATH) to regenerate them after editing the .proto sources.
fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-env-changed=ZCONFIG_REGEN_PROTO");
    if std::env::var_os("ZCONFIG_REGEN_PROTO").is_none() {
        return Ok(());
    }

    let out_dir = Path::new("src/proto");
    prost_build::Config::new()
        .out_dir(out_dir)
        // Drive bodies are owned by the storage schema and carried verbatim
        .extern_path(".Drive", "crate::opaque::Drive")
        .compile_protos(
            &[
                "proto/devcommon.proto",
                "proto/baseosconfig.proto",
                "proto/fw.proto",
            ],
            &["proto"],
        )?;

    // files without a proto package are written to `_.rs`
    std::fs::rename(out_dir.join("_.rs"), out_dir.join("zconfig.rs"))?;

    Ok(())
}

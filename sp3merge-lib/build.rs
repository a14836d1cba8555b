use std::env::var_os;
use std::error::Error;
use std::fs::copy;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    include_example_config()?;
    Ok(())
}

fn etc_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("etc").join(name)
}

fn include_example_config() -> Result<(), Box<dyn Error>> {
    let fname = "example.config.yaml";
    let src_path = etc_path(fname);
    let out_dir = var_os("OUT_DIR").ok_or("OUT_DIR not set")?;
    copy(&src_path, Path::new(&out_dir).join(fname))?;
    println!("cargo::rerun-if-changed={}", src_path.display());
    Ok(())
}

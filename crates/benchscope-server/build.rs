// build.rs for benchscope-server
//
// rust_embed requires the embedded folder to exist at compile time. When the
// frontend has not been built with `trunk build`, create a placeholder.

use std::path::Path;

fn main() {
    let dist = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../frontend/dist");

    if !dist.exists() {
        std::fs::create_dir_all(&dist).expect("failed to create placeholder frontend/dist");
        std::fs::write(
            dist.join("index.html"),
            "<!doctype html><title>benchscope</title><!-- placeholder: run `trunk build --release` in frontend/ -->\n",
        )
        .expect("failed to write placeholder index.html");
    }

    println!("cargo:rerun-if-changed=../../frontend/dist");
}

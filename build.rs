use cfg_aliases::cfg_aliases;

fn main() {
    // The script doesn't depend on our code
    println!("cargo:rerun-if-changed=build.rs");
    // But it *does* depend on cfgs!
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=RUSTDOCFLAGS");

    // Short name for "raw input backend is requested and available", so enabling the feature
    // on a non-windows target is not a compile error, it just does nothing.
    cfg_aliases! {
        raw_input: { all(feature = "windows-raw-input", any(docsrs, target_os = "windows")) },
    }
}

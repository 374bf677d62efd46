fn main() {
    println!("cargo:rerun-if-changed=./streamrelay.proto");
    tonic_build::compile_protos("./streamrelay.proto")
        .unwrap_or_else(|err| panic!("Failed to compile protos {:?}", err));
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF environment propagation only applies to device builds;
    // host builds (tests, simulation) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

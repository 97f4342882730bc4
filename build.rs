fn main() {
    // Host builds (`cargo test`) run without an ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

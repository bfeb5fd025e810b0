fn main() {
    println!("cargo:rerun-if-changed=config/station.json");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

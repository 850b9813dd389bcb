fn main() {
    // ESP-IDF link arguments only exist when building the firmware; host
    // builds (tests, the replay binary) skip them.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    println!("cargo:rerun-if-changed=models/magic_wand.wand");
}

//! Generates Swift, Kotlin and Python bindings for `safekid-core`.

fn main() {
    uniffi::uniffi_bindgen_main();
}

//! Build script which records information about the build for the run metadata
fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");
}

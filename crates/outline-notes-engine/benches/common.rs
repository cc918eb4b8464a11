// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_outline(sections: usize, depth: usize) -> String {
    let mut lines = Vec::new();
    for section in 0..sections {
        lines.push(format!("• Section {section}"));
        for level in 1..=depth {
            let tabs = "\t".repeat(level);
            lines.push(format!("{tabs}• Item {level} with some content"));
            lines.push(format!("{tabs}☐ Task {level}"));
        }
    }
    lines.join("\n")
}

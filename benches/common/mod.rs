//! Common utilities for benchmarks.
//!
//! Provides comment body generators with fixed seeds for reproducibility.

#![allow(dead_code)]

use rand::seq::IndexedRandom;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fixed seed for reproducible benchmark data
const SEED: u64 = 42;

const WORDS: &[&str] = &[
    "the", "reviewer", "suggested", "renaming", "this", "function", "because", "callers",
    "expect", "a", "different", "contract", "and", "the", "error", "path", "is", "never",
    "exercised", "by", "tests",
];

/// Create a seeded RNG for reproducible test data
pub fn seeded_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

fn sentence(rng: &mut ChaCha8Rng) -> String {
    let len = rng.random_range(6..20);
    (0..len)
        .map(|_| *WORDS.choose(rng).unwrap_or(&"x"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain prose split into paragraphs of a few sentences each.
pub fn generate_plain_body(paragraphs: usize) -> String {
    let mut rng = seeded_rng();
    (0..paragraphs)
        .map(|_| {
            let count = rng.random_range(2..6);
            (0..count)
                .map(|_| sentence(&mut rng))
                .collect::<Vec<_>>()
                .join(".\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown mixing emphasis, lists, quotes and fenced code.
pub fn generate_markdown_body(sections: usize) -> String {
    let mut rng = seeded_rng();
    let mut out = String::new();
    for i in 0..sections {
        out.push_str(&format!("## Section {}\n\n", i));
        out.push_str(&format!("**{}** and `code` {}.\n\n", sentence(&mut rng), sentence(&mut rng)));
        for _ in 0..rng.random_range(1..5) {
            out.push_str(&format!("- {}\n", sentence(&mut rng)));
        }
        out.push('\n');
        out.push_str(&format!("> {}\n\n", sentence(&mut rng)));
        out.push_str("```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\n");
    }
    out
}

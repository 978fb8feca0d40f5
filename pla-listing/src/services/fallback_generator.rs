//! Fallback listing text
//!
//! Used in place of generated copy: a random title assembled from fixed
//! word lists and a fixed description.

use rand::seq::SliceRandom;
use rand::Rng;

pub const ADJECTIVES: [&str; 10] = [
    "Premium",
    "Advanced",
    "Ultra",
    "Smart",
    "Professional",
    "Flagship",
    "Next-Gen",
    "Innovative",
    "Sleek",
    "Powerful",
];

pub const NOUNS: [&str; 5] = ["Smartphone", "Phone", "Mobile", "Device", "Handset"];

pub const MODELS: [&str; 7] = ["Pro", "Max", "Plus", "Elite", "X", "S", "Ultra"];

const DESCRIPTION: &str = "Experience the future of mobile technology with this cutting-edge smartphone. \
Featuring a stunning high-resolution display, powerful processor, and advanced camera system, \
this device delivers exceptional performance for all your needs.

The long-lasting battery ensures you stay connected all day, while the sleek, \
premium design fits comfortably in your hand. With the latest software and security features, \
you can enjoy peace of mind knowing your data is protected.

Perfect for work, entertainment, and staying connected with loved ones, \
this smartphone represents the perfect balance of style, functionality, and value.";

/// `"<Adjective> <Noun> <Model>"` using the thread-local RNG
pub fn generate_fallback_title() -> String {
    generate_fallback_title_with(&mut rand::thread_rng())
}

pub fn generate_fallback_title_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    // The word lists are non-empty constants, so choose() always yields
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or(ADJECTIVES[0]);
    let noun = NOUNS.choose(rng).copied().unwrap_or(NOUNS[0]);
    let model = MODELS.choose(rng).copied().unwrap_or(MODELS[0]);

    format!("{} {} {}", adjective, noun, model)
}

pub fn generate_fallback_description() -> String {
    DESCRIPTION.to_string()
}

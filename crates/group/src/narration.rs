//! Canned group announcements.

use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

const WELCOME: &[&str] = &[
    "Welcome, {names}! 🎉 @{admin} created a new token for you!",
    "Hey {names}! 👋 @{admin} says you're going to the moon with us!",
    "Welcome, {names}! 🛳️ @{admin} added you to the whitelist!",
    "{names}, welcome to the group! 😎 @{admin} says it's fully decentralized!",
    "{names}, you've joined the chat! 🚀 @{admin} saved your place in the group!",
    "Hey {names}, welcome! 🎉 @{admin} saved some gas fees for you!",
];

const FAREWELL: &[&str] = &[
    "See ya! 👋 Don't let the blockchain hit you on the way out, says @{admin}.",
    "@{admin} won't miss the buggy code!",
    "🪦",
    "☠️☠️☠️",
    "💀",
    "👻",
    "hasta la vista, baby",
    "nuked ☠️💣, by @{admin}",
];

const RENAME: &[&str] = &[
    "The group name was just renamed to '{name}'! 📝 Now @{admin} is scrambling to update the smart contracts!",
    "The group name has changed to '{name}'! 🎉 @{admin} is now rewriting the blockchain in panic!",
    "A new group name has been decided: '{name}'! 🔄 @{admin} is checking if it's hashable!",
    "Look out! The group name is now '{name}'! 🕵️ @{admin} is on a secret mission to encode it!",
    "It's official, '{name}' is the new group name! 🚀 @{admin} is already launching it into the crypto space!",
    "Say hello to our new group name, '{name}'! 🎭 @{admin} is preparing the disguise kits!",
    "We've updated our group name to '{name}'! 🧙 Watch as @{admin} casts a renaming spell!",
    "New group name alert: '{name}'! 🚨 @{admin} is setting up the alarm systems!",
    "Welcome to the newly named '{name}'! 🌐 @{admin} is spinning the globe for this one!",
    "The group has a fresh start as '{name}'! 🌱 @{admin} is planting the seeds for growth!",
];

fn pick(templates: &[&'static str], rng: &mut impl Rng) -> &'static str {
    templates.choose(rng).copied().unwrap_or_default()
}

/// Substitute `{key}` placeholders in one pass over the template, so values
/// are never themselves expanded.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let key = &tail[1..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end + 1))
        });
        match value {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            },
            None => {
                out.push('{');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

/// Greeting for `names` (already `@`-prefixed), or `None` when nobody is named.
pub fn welcome(names: &[String], admin: &str, rng: &mut impl Rng) -> Option<String> {
    let names: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty() && *n != "@")
        .collect();
    if names.is_empty() {
        return None;
    }
    let names = names.join(", ");
    Some(fill(pick(WELCOME, rng), &[
        ("names", names.as_str()),
        ("admin", admin),
    ]))
}

pub fn farewell(admin: &str, rng: &mut impl Rng) -> String {
    fill(pick(FAREWELL, rng), &[("admin", admin)])
}

pub fn rename(new_name: &str, admin: &str, rng: &mut impl Rng) -> String {
    fill(pick(RENAME, rng), &[("name", new_name), ("admin", admin)])
}

/// Shared random source for announcements.
pub struct Narrator {
    rng: Mutex<StdRng>,
}

impl Default for Narrator {
    fn default() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl Narrator {
    /// Deterministic picks, for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *rng)
    }

    pub fn welcome(&self, names: &[String], admin: &str) -> Option<String> {
        self.with_rng(|rng| welcome(names, admin, rng))
    }

    pub fn farewell(&self, admin: &str) -> String {
        self.with_rng(|rng| farewell(admin, rng))
    }

    pub fn rename(&self, new_name: &str, admin: &str) -> String {
        self.with_rng(|rng| rename(new_name, admin, rng))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(42)]
    fn rename_names_value_and_admin(#[case] seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = rename("Moon Club", "alix", &mut rng);
        assert!(text.contains("'Moon Club'"));
        assert!(text.contains("@alix"));
        assert!(!text.contains('{'));
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    fn placeholders_in_values_stay_literal(#[case] seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = rename("{admin} club", "alix", &mut rng);
        assert!(text.contains("'{admin} club'"));
        assert_eq!(text.matches("@alix").count(), 1);
    }

    #[test]
    fn fill_leaves_unknown_braces() {
        assert_eq!(
            fill("{a} {b} {a", &[("a", "{b}"), ("b", "x")]),
            "{b} x {a"
        );
    }

    #[test]
    fn welcome_needs_names() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(welcome(&[], "bot", &mut rng), None);
        assert_eq!(welcome(&["@".into(), " ".into()], "bot", &mut rng), None);
        let text = welcome(&["@eva".into(), "@bo".into()], "bot", &mut rng).unwrap();
        assert!(text.contains("@eva, @bo"));
        assert!(text.contains("@bot"));
    }

    #[test]
    fn seeded_narrators_agree() {
        let a = Narrator::seeded(9);
        let b = Narrator::seeded(9);
        for _ in 0..5 {
            assert_eq!(a.farewell("admin"), b.farewell("admin"));
        }
    }
}

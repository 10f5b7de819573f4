//! Scan the reference catalog and print what turns up

use fernveil_core::{Catalog, EncounterType, SystemClock};

fn main() {
    println!("=== Scanning the Forest ===\n");

    let catalog = Catalog::reference();
    let mut rng = rand::thread_rng();

    for _ in 0..5 {
        match catalog.random_spirit(&mut rng, &SystemClock) {
            Some(spirit) => println!(
                "{} {} ({}, {} XP)",
                spirit.encounter_type.icon(),
                spirit.spirit_name,
                spirit.encounter_type,
                spirit.xp_earned
            ),
            None => println!("The catalog is empty"),
        }
    }

    println!("\n=== By Type ===\n");

    for t in EncounterType::ALL {
        match catalog.spirit_by_type(t, &mut rng, &SystemClock) {
            Ok(spirit) => println!("{t}: {} -> {}", spirit.spirit_name, spirit.reward),
            Err(e) => println!("{t}: {e}"),
        }
    }
}

use clap::Parser;
use probe_hash::HashTable;
use probe_hash::IdentityHashBuilder;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Fraction of entries erased after filling, leaving tombstones behind.
    #[arg(short = 'e', long = "erase_fraction", default_value_t = 0.25)]
    erase_fraction: f64,

    /// Hash keys to their own value instead of using the default hasher.
    #[arg(short = 'i', long = "identity")]
    identity: bool,

    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,
}

fn report<S>(table: &HashTable<u64, u64, S>, stage: &str) {
    println!("--- {stage} ---");
    table.probe_histogram().print();
    table.debug_stats().print();
    println!();
}

fn run<S: core::hash::BuildHasher>(args: &Args, mut table: HashTable<u64, u64, S>) {
    let mut rng = SmallRng::seed_from_u64(args.seed);

    println!("Initial capacity: {}", table.capacity());

    // Fill to just under the growth threshold.
    let fill = table.capacity() * 2 / 3;
    let mut keys = Vec::with_capacity(fill);
    while keys.len() < fill {
        let key = rng.random::<u64>();
        if !table.contains(&key) {
            table.insert(key, key);
            keys.push(key);
        }
    }
    println!("Inserted {} values", table.len());
    report(&table, "after fill");

    let mut erased = 0;
    for key in &keys {
        if rng.random_bool(args.erase_fraction.clamp(0.0, 1.0)) {
            table.erase(key);
            erased += 1;
        }
    }
    println!("Erased {erased} values");
    report(&table, "after erase");

    // Inserts that reuse a tombstone fit at the threshold; the first one that
    // needs an empty slot grows the table and rehashes the tombstones away.
    let before = table.capacity();
    let mut inserted = 0;
    while table.capacity() == before {
        let key = rng.random::<u64>();
        if !table.contains(&key) {
            table.insert(key, key);
            inserted += 1;
        }
    }
    println!(
        "Inserted {} more values: capacity {} -> {}",
        inserted,
        before,
        table.capacity()
    );
    report(&table, "after growth");
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    if args.identity {
        run(
            &args,
            HashTable::with_capacity_and_hasher(
                args.target_capacity.max(1),
                IdentityHashBuilder::default(),
            ),
        );
    } else {
        run(&args, HashTable::with_capacity(args.target_capacity.max(1)));
    }
}

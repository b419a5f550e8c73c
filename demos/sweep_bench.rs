use hashprops::{
    expected_collision_attempts, find_collision_with_prefix, Blake3Primitive, Difficulty,
    HashEngine, HashPrimitive, HashVariant, PuzzleSolver, SearchBudget, Sha256Primitive,
};
use std::str::FromStr;

fn usage() -> String {
    "Usage: cargo run --release --example sweep_bench -- \
      [--primitive <sha256|blake3>] [--widths <trunc8,trunc16,...>] \
      [--difficulties <12,16,...>] [--repeats <u32>] [--data <str>] \
      [--max-attempts <u64>]\n"
        .to_string()
}

fn parse_next<T: FromStr>(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<T, String> {
    let v = it.next().ok_or_else(usage)?;
    v.parse::<T>()
        .map_err(|_| format!("Invalid value for {flag}"))
}

fn parse_list<T: FromStr>(
    it: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<Vec<T>, String> {
    let v = it.next().ok_or_else(usage)?;
    v.split(',')
        .map(|item| item.parse::<T>().map_err(|_| format!("Invalid value for {flag}")))
        .collect()
}

fn main() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let mut primitive = String::from("sha256");
    let mut widths = vec![HashVariant::Truncated8, HashVariant::Truncated16];
    let mut difficulties: Vec<u32> = vec![8, 12, 16];
    let mut repeats: u32 = 3;
    let mut data = String::from("test");
    let mut max_attempts: u64 = 10_000_000;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--primitive" => primitive = args.next().ok_or_else(usage)?,
            "--widths" => widths = parse_list(&mut args, "--widths")?,
            "--difficulties" => difficulties = parse_list(&mut args, "--difficulties")?,
            "--repeats" => repeats = parse_next(&mut args, "--repeats")?,
            "--data" => data = args.next().ok_or_else(usage)?,
            "--max-attempts" => max_attempts = parse_next(&mut args, "--max-attempts")?,
            _ => return Err(usage()),
        }
    }

    let hash: &dyn HashPrimitive = match primitive.as_str() {
        "sha256" => &Sha256Primitive,
        "blake3" => &Blake3Primitive,
        _ => return Err(usage()),
    };
    let engine = HashEngine::new(hash);
    let solver = PuzzleSolver::new(engine);
    let budget = SearchBudget::attempts(max_attempts);

    println!("kind,primitive,param,run_idx,time_ms,tries,expected,found,detail");

    for run_idx in 0..repeats {
        let mut prefix = data.as_bytes().to_vec();
        prefix.extend_from_slice(&run_idx.to_be_bytes());

        for &variant in &widths {
            let result = find_collision_with_prefix(&engine, variant, &prefix, &budget);
            let detail = result
                .found()
                .map(|c| format!("{}/{}->{}", c.first, c.second, c.digest))
                .unwrap_or_default();
            println!(
                "collision,{},{},{},{:.3},{},{:.1},{},{}",
                primitive,
                variant,
                run_idx,
                result.elapsed.as_secs_f64() * 1e3,
                result.attempts,
                expected_collision_attempts(variant.bits()),
                result.is_found(),
                detail
            );
        }

        for &bits in &difficulties {
            let difficulty = Difficulty::new(bits).map_err(|e| e.to_string())?;
            let result = solver.solve_within(&prefix, difficulty, &budget);
            let detail = result.found().map(|s| s.hash_hex()).unwrap_or_default();
            println!(
                "puzzle,{},{},{},{:.3},{},{:.1},{},{}",
                primitive,
                bits,
                run_idx,
                result.elapsed.as_secs_f64() * 1e3,
                result.attempts,
                difficulty.expected_attempts(),
                result.is_found(),
                detail
            );
        }
    }

    Ok(())
}
